use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use scribe_core::Mode;
use scribe_logging::scribe_debug;

use crate::{AiError, OperationParams};

#[derive(Debug, Clone)]
pub struct EndpointSettings {
    /// Base URL the `api/ai/*` paths are resolved against.
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Request body sent for every operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(flatten)]
    pub params: OperationParams,
    pub conversation_id: String,
    pub document_content: String,
    /// RFC 3339.
    pub timestamp: String,
}

impl RequestEnvelope {
    pub fn mode(&self) -> Mode {
        self.params.mode()
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    success: bool,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Network seam. One call is one attempt; retries live in the orchestrator.
#[async_trait::async_trait]
pub trait Endpoint: Send + Sync {
    async fn send(&self, request: &RequestEnvelope) -> Result<String, AiError>;
}

pub fn operation_path(mode: Mode) -> Option<&'static str> {
    match mode {
        Mode::Prompt => Some("api/ai/prompt"),
        Mode::Continue => Some("api/ai/continue"),
        Mode::Modify => Some("api/ai/modify"),
        Mode::None => None,
    }
}

/// Interprets a 2xx body: `{success, content?, error?}`.
pub fn parse_response_body(body: &str) -> Result<String, AiError> {
    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|err| AiError::invalid_response(format!("malformed response: {err}")))?;
    if !wire.success {
        return Err(AiError::request_failed(
            wire.error.unwrap_or_else(|| "request failed".to_string()),
        ));
    }
    wire.content
        .ok_or_else(|| AiError::invalid_response("response has no content"))
}

#[derive(Debug, Clone)]
pub struct ReqwestEndpoint {
    settings: EndpointSettings,
    base: url::Url,
    client: reqwest::Client,
}

impl ReqwestEndpoint {
    pub fn new(settings: EndpointSettings) -> Result<Self, AiError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = url::Url::parse(&raw).map_err(|err| {
            AiError::validation("INVALID_ENDPOINT", format!("{}: {err}", settings.base_url))
        })?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| AiError::unknown(err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn url_for(&self, mode: Mode) -> Result<url::Url, AiError> {
        let path = operation_path(mode).ok_or_else(|| {
            AiError::validation("NO_OPERATION", "no AI operation for mode none")
        })?;
        self.base
            .join(path)
            .map_err(|err| AiError::validation("INVALID_ENDPOINT", err.to_string()))
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> AiError {
        if err.is_timeout() {
            return AiError::timeout(self.settings.connect_timeout);
        }
        if err.is_connect() {
            return AiError::unreachable(err.to_string());
        }
        AiError::unknown(err.to_string())
    }
}

#[async_trait::async_trait]
impl Endpoint for ReqwestEndpoint {
    async fn send(&self, request: &RequestEnvelope) -> Result<String, AiError> {
        let url = self.url_for(request.mode())?;
        let body = serde_json::to_string(request)
            .map_err(|err| AiError::unknown(format!("cannot encode request: {err}")))?;
        scribe_debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| self.map_reqwest_error(err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.map_reqwest_error(err))?;

        if !status.is_success() {
            let message = serde_json::from_str::<WireResponse>(&text)
                .ok()
                .and_then(|wire| wire.error)
                .unwrap_or_else(|| status.to_string());
            return Err(AiError::from_status(status.as_u16(), message));
        }
        parse_response_body(&text)
    }
}
