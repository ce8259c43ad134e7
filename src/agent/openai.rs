//! OpenAI Chat Completions agent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use super::http::{bearer_headers, build_client, status_to_error};
use super::{AgentFactory, RemoteAgent};
use crate::config::{Credentials, ParleyConfig};
use crate::error::{AgentError, ParleyError};
use crate::models::ModelId;
use crate::util::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings applied to every agent a factory constructs.
#[derive(Debug, Clone, Builder)]
pub struct AgentOptions {
    #[builder(into)]
    pub base_url: Option<String>,
    #[builder(into)]
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Per-request HTTP timeout.
    pub request_timeout: Option<Duration>,
    #[builder(default = 1)]
    pub max_attempts: u32,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AgentOptions {
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self::builder()
            .maybe_base_url(config.base_url.clone())
            .maybe_system_prompt(config.system_prompt.clone())
            .maybe_request_timeout(config.request_timeout)
            .max_attempts(config.max_attempts)
            .build()
    }
}

/// Constructs [`OpenAiAgent`]s. Construction validates locally and never
/// touches the network.
#[derive(Debug, Clone, Default)]
pub struct OpenAiAgentFactory {
    options: AgentOptions,
}

impl OpenAiAgentFactory {
    pub fn new(options: AgentOptions) -> Self {
        Self { options }
    }
}

impl AgentFactory for OpenAiAgentFactory {
    fn construct(&self, credentials: &Credentials) -> Result<Arc<dyn RemoteAgent>, ParleyError> {
        Ok(Arc::new(OpenAiAgent::new(credentials, self.options.clone())?))
    }
}

/// Sends each message as a single-turn chat completion.
pub struct OpenAiAgent {
    model: ModelId,
    base_url: String,
    headers: HeaderMap,
    client: reqwest::Client,
    options: AgentOptions,
    retry: RetryPolicy,
}

impl OpenAiAgent {
    pub fn new(credentials: &Credentials, options: AgentOptions) -> Result<Self, ParleyError> {
        let key = credentials.api_key().expose().trim();
        if key.chars().any(char::is_whitespace) {
            return Err(ParleyError::init("API key must not contain whitespace"));
        }
        let headers = bearer_headers(key)
            .map_err(|e| ParleyError::init_with_source("API key is not a valid header value", e))?;
        let client = build_client(options.request_timeout)
            .map_err(|e| ParleyError::init_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            model: credentials.model(),
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            headers,
            client,
            retry: RetryPolicy::attempts(options.max_attempts),
            options,
        })
    }

    /// Deadline hits while sending or while reading the body both surface as `Timeout`.
    fn transport_error(&self, err: reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(
                self.options
                    .request_timeout
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default(),
            )
        } else {
            AgentError::Network(err)
        }
    }

    fn build_request_body(&self, message: &str) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = self.options.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": message}));

        let mut body = serde_json::json!({
            "model": self.model.as_str(),
            "messages": messages,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = self.options.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(max) = self.options.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
        }
        body
    }

    async fn complete_once(&self, body: &serde_json::Value) -> Result<String, AgentError> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !(200..300).contains(&status) {
            return Err(status_to_error(status, &text));
        }

        let data: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AgentError::MalformedResponse(format!("invalid JSON body: {e}")))?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::MalformedResponse("no choices in response".into()))?;
        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(AgentError::MalformedResponse(
                "response message has no text content".into(),
            )),
        }
    }
}

#[async_trait]
impl RemoteAgent for OpenAiAgent {
    fn model(&self) -> ModelId {
        self.model
    }

    async fn respond(&self, message: &str) -> Result<String, AgentError> {
        let body = self.build_request_body(message);
        debug!(model = self.model.as_str(), "OpenAI chat completion");
        self.retry.execute(|| self.complete_once(&body)).await
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
