// src/services/suggestion_service.rs

//! Message prompt suggestions from a hosted language model. Nothing here is
//! persisted; each call is an independent round trip to the provider.

use futures::future::BoxFuture;
use futures::FutureExt;
use rand::Rng;
use serde_json::{json, Value};
use thiserror::Error;

/// Separator between the three suggested prompts.
pub const SUGGESTION_DELIMITER: &str = "||";

const TEMPERATURE: f64 = 0.9;
const MAX_TOKENS: u32 = 150;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider response had no text")]
    EmptyCompletion,
}

/// Anything that can produce a `||`-joined list of three prompts.
pub trait PromptGenerator: Send + Sync {
    fn generate_prompts(&self) -> BoxFuture<'_, Result<String, SuggestError>>;
}

/// The instruction sent to the model. The random id keeps providers from
/// serving a cached completion.
pub fn suggestion_prompt() -> String {
    let random_id: u32 = rand::thread_rng().gen_range(0..10_000);
    format!(
        "You're helping generate engaging, anonymous prompts for an anonymous messaging platform like AnonBox. \
The messages users send are meant to spark friendly conversations, collect anonymous feedback, or encourage \
thoughtful replies, but should always feel safe and welcoming.\n\n\
Create a list of three open-ended and professional-to-fun questions, separated by '||'. Mix topics like general \
feedback, casual personality questions about the person you are sending to, light advice requests, general \
feedback about work, and imagination-based prompts.\n\n\
Example:\n\n\
- you did well in the class presentation!||How about a meetup||I saw your work. i think u could do better?\n\n\
Only return the formatted string of three questions separated by '||'. No intro or explanation. Random ID: {random_id}."
    )
}

/// Splits a completion into its individual prompts.
pub fn split_suggestions(joined: &str) -> Vec<&str> {
    joined
        .split(SUGGESTION_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(text: Option<&str>) -> Result<String, SuggestError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(SuggestError::EmptyCompletion),
    }
}

async fn checked_json(response: reqwest::Response) -> Result<Value, SuggestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SuggestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<Value>().await?)
}

/// OpenAI-compatible `/chat/completions` (Groq, OpenAI, ...).
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsGenerator {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    pub fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [ { "role": "user", "content": prompt } ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }

    /// Pulls `choices[0].message.content` out of a response.
    pub fn extract_text(body: &Value) -> Result<String, SuggestError> {
        non_empty(body["choices"][0]["message"]["content"].as_str())
    }
}

impl PromptGenerator for ChatCompletionsGenerator {
    fn generate_prompts(&self) -> BoxFuture<'_, Result<String, SuggestError>> {
        async move {
            let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&self.request_body(&suggestion_prompt()))
                .send()
                .await?;
            Self::extract_text(&checked_json(response).await?)
        }
        .boxed()
    }
}

/// Google Gemini `models/{model}:generateContent`.
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    pub fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [ { "parts": [ { "text": prompt } ] } ],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_TOKENS,
            },
        })
    }

    /// Concatenates the text parts of the first candidate.
    pub fn extract_text(body: &Value) -> Result<String, SuggestError> {
        let joined: Option<String> = body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect());
        non_empty(joined.as_deref())
    }
}

impl PromptGenerator for GeminiGenerator {
    fn generate_prompts(&self) -> BoxFuture<'_, Result<String, SuggestError>> {
        async move {
            let url = format!(
                "{}/models/{}:generateContent",
                self.base_url.trim_end_matches('/'),
                self.model
            );
            let response = self
                .client
                .post(url)
                .query(&[("key", self.api_key.as_str())])
                .json(&Self::request_body(&suggestion_prompt()))
                .send()
                .await?;
            Self::extract_text(&checked_json(response).await?)
        }
        .boxed()
    }
}
