//! Gemini API client

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::backend::{GenerationBackend, GenerationRequest, GenerationResponse};
use crate::config::{BackendConfig, Credential};
use crate::error::{ConfigError, ScriptError};

/// Gemini `generateContent` client
pub struct GeminiBackend {
    credential: Credential,
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    system_instruction: GeminiInstruction<'a>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiInstruction<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    total_token_count: i32,
}

#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GeminiBackend {
    pub fn new(config: &BackendConfig, credential: Credential) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            credential,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_seconds,
        })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    pub fn has_placeholder_credential(&self) -> bool {
        self.credential.is_placeholder()
    }
}

impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    /// Send a generation request to Gemini
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ScriptError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            system_instruction: GeminiInstruction {
                parts: vec![GeminiPart {
                    text: &request.system_instruction,
                }],
            },
        };

        let start = Instant::now();
        debug!("POST {}", self.endpoint(&request.model));

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", self.credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ScriptError::from_reqwest(e, self.timeout_secs))?;

        let latency = start.elapsed().as_millis() as i64;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ScriptError::Backend {
                status,
                message: error_message(&body),
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ScriptError::from_reqwest(e, self.timeout_secs))?;

        let tokens_used = parsed
            .usage_metadata
            .as_ref()
            .map(|u| u.total_token_count)
            .unwrap_or_default();
        let model_used = parsed
            .model_version
            .clone()
            .unwrap_or_else(|| request.model.clone());
        let text = extract_text(parsed);

        info!("Gemini response: {} tokens, {}ms latency", tokens_used, latency);

        Ok(GenerationResponse {
            text,
            model_used,
            tokens_used,
            latency_ms: latency,
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GeminiResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Pull the human-readable message out of an error body, or keep the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
