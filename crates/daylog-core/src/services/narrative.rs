//! Narrative text generated from an entry's photo via OpenAI chat completions.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{http_client, send, ServiceError, ServiceResult};

pub const DEFAULT_NARRATIVE_WORDS: u32 = 100;
const MODEL: &str = "gpt-4o-mini";
const DEFAULT_STYLE: &str = "Charles Bukowski";

/// What to narrate.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub image_url: String,
    pub location: Option<String>,
    pub date: DateTime<Utc>,
    pub words: u32,
    pub style: String,
}

impl NarrativeRequest {
    pub fn new(image_url: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            image_url: image_url.into(),
            location: None,
            date,
            words: DEFAULT_NARRATIVE_WORDS,
            style: DEFAULT_STYLE.to_string(),
        }
    }

    #[must_use]
    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub const fn words(mut self, words: u32) -> Self {
        self.words = words;
        self
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from("You are the narrator of a movie for a person.");
        if let Some(location) = &self.location {
            prompt.push_str(&format!(
                " The person is currently in {location} on {}.",
                self.date.format("%a %b %d %Y")
            ));
        }
        prompt.push_str(&format!(
            " When you receive an image, write a narrative from the perspective of the person \
             of {} words in the style of {}. Focus on describing what is happening and what \
             can be inferred from the image. Keep the narrative grounded in reality, avoiding \
             excessive speculation. The narrative should always be in the third person.",
            self.words, self.style
        ));
        prompt
    }
}

#[derive(Debug, Clone)]
pub struct NarrativeClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl NarrativeClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> ServiceResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client: http_client()?,
        })
    }

    fn build_request(&self, request: &NarrativeRequest) -> ServiceResult<reqwest::Request> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential("OpenAI"))?;
        Ok(self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .json(&request_body(request))
            .build()?)
    }

    pub async fn narrate(&self, request: &NarrativeRequest) -> ServiceResult<String> {
        let http_request = self.build_request(request)?;
        let response = send(&self.client, http_request).await?;
        let body = response.text().await?;
        parse_completion(&body)
    }
}

fn request_body(request: &NarrativeRequest) -> serde_json::Value {
    json!({
        "model": MODEL,
        "messages": [
            {"role": "system", "content": request.system_prompt()},
            {
                "role": "user",
                "content": [{"type": "image_url", "image_url": {"url": request.image_url}}]
            }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn parse_completion(payload: &str) -> ServiceResult<String> {
    let response: CompletionResponse = serde_json::from_str(payload)
        .map_err(|error| ServiceError::InvalidResponse(error.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ServiceError::InvalidResponse("completion had no narrative".to_string()))
}
