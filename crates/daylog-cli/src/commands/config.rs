use std::path::{Path, PathBuf};

use daylog_core::config::ServiceConfig;
use daylog_core::util::normalize_text_option;

use crate::cli_config::{default_config_path, CliConfig};
use crate::error::CliError;

pub fn run_config_init(user: &str) -> Result<PathBuf, CliError> {
    let path = default_config_path().map_err(CliError::Config)?;
    save_default_user(user, &path)?;
    println!("Saved default user to {}", path.display());
    Ok(path)
}

pub fn save_default_user(user: &str, path: &Path) -> Result<CliConfig, CliError> {
    let user_id = normalize_text_option(Some(user.to_string())).ok_or(CliError::MissingUser)?;
    let mut config = CliConfig::load_from_path(path).map_err(CliError::Config)?;
    config.user_id = Some(user_id);
    config.save_to_path(path).map_err(CliError::Config)?;
    Ok(config)
}

pub fn run_config_show(db_path: &Path, user_id: Option<&str>) -> Result<(), CliError> {
    let services = ServiceConfig::from_env();
    println!("database: {}", db_path.display());
    println!("user:     {}", user_id.unwrap_or("(none)"));
    println!("config:   {}", default_config_path().map_err(CliError::Config)?.display());
    println!("services: {services:?}");
    Ok(())
}
