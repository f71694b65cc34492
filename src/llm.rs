use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3-8b-instruct";

/// Anything that turns a prompt into completion text.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for an OpenAI-compatible chat completions endpoint (Groq by default).
pub struct ChatClient {
    api_key: String,
    model: String,
    url: String,
    client: Client,
}

impl ChatClient {
    pub fn new(api_key: String, model: String, url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Init {
                component: "inference client",
                message: e.to_string(),
            })?;
        Ok(ChatClient {
            api_key,
            model,
            url,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

impl CompletionClient for ChatClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "sending completion request");
        let resp = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&self.request_body(prompt))
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(Error::Inference(format!("{status}: {body}")));
        }
        first_choice(&body)
    }
}

/// Builds the single user message sent to the model.
pub fn build_prompt(segments: &[String], query: &str) -> String {
    format!("Context: {}\n\nQuestion: {query}", segments.join("\n"))
}

/// Answers questions from retrieved context through a completion client.
pub struct Answerer<C> {
    client: C,
}

impl<C: CompletionClient> Answerer<C> {
    pub fn new(client: C) -> Self {
        Answerer { client }
    }

    pub fn answer(&self, segments: &[String], query: &str) -> Result<String> {
        let prompt = build_prompt(segments, query);
        self.client.complete(&prompt)
    }
}

fn first_choice(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::Inference(format!("could not decode response: {e}: {body}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| Error::Inference("response contained no choices".to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
