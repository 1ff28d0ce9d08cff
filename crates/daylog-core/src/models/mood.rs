//! Mood tag

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the author felt about the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Star,
    Happy,
    Neutral,
    Sad,
    Angry,
}

impl Mood {
    pub const ALL: [Self; 5] = [Self::Star, Self::Happy, Self::Neutral, Self::Sad, Self::Angry];

    /// Emoji shown for the mood, also used as its group label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Star => "🤩",
            Self::Happy => "😊",
            Self::Neutral => "🙂",
            Self::Sad => "😕",
            Self::Angry => "😡",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Star => "Star",
            Self::Happy => "Happy",
            Self::Neutral => "Neutral",
            Self::Sad => "Sad",
            Self::Angry => "Angry",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|mood| mood.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown mood '{wanted}'"))
    }
}
