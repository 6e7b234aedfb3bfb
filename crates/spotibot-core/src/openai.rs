//! Chat model seam and the OpenAI Responses API client behind it.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::error::ProviderError;
use crate::history::Message;
use crate::operation::FunctionCall;

const PROVIDER: &str = "openai";

/// At most one free-text segment and at most one function call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub call: Option<FunctionCall>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One completion over the full history with the operation schema offered
    /// as tools.
    async fn respond(&self, messages: &[Message], tools: &Value)
        -> Result<ModelReply, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    FunctionCall {
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

/// Arguments arrive as a JSON string. Anything unparsable is passed through as
/// a bare string so decoding rejects it as invalid arguments.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("function arguments are not JSON ({}): {}", e, raw);
        Value::String(raw.to_string())
    })
}

pub fn parse_response(body: &str) -> Result<ModelReply, ProviderError> {
    let parsed: ResponsesBody =
        serde_json::from_str(body).map_err(|e| ProviderError::decode(PROVIDER, e.to_string()))?;

    let mut texts = Vec::new();
    let mut call = None;
    for item in parsed.output {
        match item {
            OutputItem::Message { content } => {
                texts.extend(content.into_iter().filter_map(|p| p.text));
            }
            OutputItem::FunctionCall { name, arguments } => {
                if call.is_some() {
                    warn!("ignoring extra function call {}", name);
                    continue;
                }
                call = Some(FunctionCall {
                    arguments: parse_arguments(&arguments),
                    name,
                });
            }
            OutputItem::Other => {}
        }
    }

    let text = (!texts.is_empty()).then(|| texts.join(" "));
    Ok(ModelReply { text, call })
}

pub fn request_body(model: &str, temperature: f32, messages: &[Message], tools: &Value) -> Value {
    json!({
        "model": model,
        "input": messages,
        "tools": tools,
        "tool_choice": "auto",
        "temperature": temperature,
    })
}

pub struct OpenAiResponses {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiResponses {
    pub fn new(config: &OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::Config("openai.api_key / OPENAI_API_KEY".into()))?;
        Ok(Self {
            http: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiResponses {
    async fn respond(
        &self,
        messages: &[Message],
        tools: &Value,
    ) -> Result<ModelReply, ProviderError> {
        let url = format!("{}/responses", self.base_url);
        debug!("model request: {} message(s) to {}", messages.len(), self.model);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, self.temperature, messages, tools))
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, e))?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

/// A `ChatModel` that plays back canned replies in order and remembers what
/// it was sent. Once the script runs out it answers with nothing.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelReply, ProviderError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, reply: Result<ModelReply, ProviderError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.push(Ok(ModelReply {
            text: Some(text.to_string()),
            call: None,
        }))
    }

    pub fn call(self, name: &str, arguments: Value) -> Self {
        self.push(Ok(ModelReply {
            text: None,
            call: Some(FunctionCall {
                name: name.to_string(),
                arguments,
            }),
        }))
    }

    pub fn fail(self, err: ProviderError) -> Self {
        self.push(Err(err))
    }

    /// Message lists received so far, one per attempt.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn respond(
        &self,
        messages: &[Message],
        _tools: &Value,
    ) -> Result<ModelReply, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Ok(ModelReply::default()))
    }
}
