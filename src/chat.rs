//! `POST /api/analyze`: forwards one screenshot-analysis turn to a
//! chat-completions endpoint and hands back the assistant's text.
//!
//! The proxy keeps no session state. Callers send the prior turns with each
//! request and the proxy prepends the system prompt.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Error;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_IMAGES: usize = 10;
const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MISSING_KEY: &str =
    "OpenAI API key not configured. Add OPENAI_API_KEY to your environment variables.";
const INTERNAL: &str = "Internal server error";

const IMAGE_SUBTYPES: [&str; 5] = ["png", "jpeg", "jpg", "webp", "gif"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    pub session_messages: Vec<SessionMessage>,
    pub user_text: String,
    /// `data:image/<type>;base64,<payload>` URLs.
    pub images: Vec<String>,
}

/// Status plus JSON body, ready for any HTTP layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatResponse {
    pub status: u16,
    pub body: Value,
}

impl ChatResponse {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

/// Check one data URL: allowed subtype, decodable payload, recognisable image.
pub fn validate_image_url(url: &str) -> Result<image::ImageFormat, Error> {
    let invalid = |why: &str| Error::InvalidRequest(format!("Invalid image: {why}"));

    let rest = url
        .strip_prefix("data:image/")
        .ok_or_else(|| invalid("expected a data:image/...;base64 URL"))?;
    let (subtype, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| invalid("expected base64 data"))?;
    if !IMAGE_SUBTYPES.contains(&subtype.to_ascii_lowercase().as_str()) {
        return Err(invalid(&format!("unsupported type image/{subtype}")));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| invalid(&e.to_string()))?;
    image::guess_format(&bytes).map_err(|_| invalid("payload is not an image"))
}

/// System prompt, then prior turns, then the new user turn (text part first,
/// then one `image_url` part per screenshot).
pub fn build_messages(system_prompt: &str, request: &ChatRequest) -> Vec<Value> {
    let mut messages = Vec::with_capacity(request.session_messages.len() + 2);
    messages.push(json!({ "role": "system", "content": system_prompt }));
    for m in &request.session_messages {
        messages.push(json!({ "role": m.role, "content": m.content }));
    }

    let mut parts = Vec::with_capacity(request.images.len() + 1);
    if !request.user_text.trim().is_empty() {
        parts.push(json!({ "type": "text", "text": request.user_text }));
    }
    for url in &request.images {
        parts.push(json!({
            "type": "image_url",
            "image_url": { "url": url, "detail": "high" },
        }));
    }
    messages.push(json!({ "role": "user", "content": parts }));
    messages
}

/// Assistant text and the upstream token usage, passed through untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Value,
}

#[derive(Clone, Debug)]
pub struct ChatProxy {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_images: usize,
    system_prompt: String,
}

impl ChatProxy {
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_images: DEFAULT_MAX_IMAGES,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.max_images = max_images;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn validate(&self, request: &ChatRequest) -> Result<(), Error> {
        if request.user_text.trim().is_empty() && request.images.is_empty() {
            return Err(Error::InvalidRequest("Please provide text or images".into()));
        }
        if request.images.len() > self.max_images {
            return Err(Error::InvalidRequest(format!(
                "Too many images: {} (maximum {})",
                request.images.len(),
                self.max_images
            )));
        }
        for url in &request.images {
            validate_image_url(url)?;
        }
        Ok(())
    }

    /// Chat-completions request body for `request`.
    pub fn request_body(&self, request: &ChatRequest) -> Value {
        json!({
            "model": self.model,
            "messages": build_messages(&self.system_prompt, request),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        })
    }

    /// One upstream call, no retries.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Completion, Error> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config(MISSING_KEY.into()))?;
        self.validate(request)?;

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&self.request_body(request))
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&raw)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| {
                    format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or(""))
                        .trim_end()
                        .to_string()
                });
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&raw)?;
        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(Completion {
            text,
            usage: value.get("usage").cloned().unwrap_or(Value::Null),
        })
    }

    /// Parse, validate, forward, and map every outcome onto a status and JSON body.
    pub async fn handle(&self, body: &[u8]) -> ChatResponse {
        if self.api_key.is_none() {
            log::error!("analyze: no API key configured");
            return ChatResponse::error(500, MISSING_KEY);
        }
        let request: ChatRequest = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => {
                log::error!("analyze: unreadable body: {e}");
                return ChatResponse::error(500, INTERNAL);
            }
        };

        let t0 = std::time::Instant::now();
        match self.complete(&request).await {
            Ok(completion) => {
                log::info!(
                    "analyze: {} prior turns, {} images → {} chars in {:.1}s",
                    request.session_messages.len(),
                    request.images.len(),
                    completion.text.len(),
                    t0.elapsed().as_secs_f64(),
                );
                ChatResponse {
                    status: 200,
                    body: json!({ "text": completion.text, "usage": completion.usage }),
                }
            }
            Err(Error::InvalidRequest(message)) => ChatResponse::error(400, message),
            Err(e @ Error::Upstream { status, .. }) => {
                log::error!("analyze: {e}");
                ChatResponse::error(status, e.to_string())
            }
            Err(e) => {
                log::error!("analyze: {e}");
                ChatResponse::error(500, INTERNAL)
            }
        }
    }
}
