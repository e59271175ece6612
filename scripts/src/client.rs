//! Script-request client: task description in, generated script or typed error out.

use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::backend::{GenerationBackend, GenerationRequest};
use crate::config::{BackendConfig, Credential};
use crate::error::{ConfigError, ScriptError};
use crate::gemini::GeminiBackend;
use crate::prompt::{render_prompt, SYSTEM_INSTRUCTION};
use crate::task::TaskRequest;

/// Prefix of every rendered failure.
pub const ERROR_MARKER: &str = "# Error";

/// A successful generation. `text` is the completion exactly as returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    pub text: String,
    pub model_used: String,
    pub tokens_used: i32,
    pub latency_ms: i64,
}

pub type ScriptResult = Result<GeneratedScript, ScriptError>;

/// Render a result the way the output panel shows it. Errors carry the
/// `# Error` marker; scripts are passed through untouched.
pub fn display_text(result: &ScriptResult) -> String {
    match result {
        Ok(script) => script.text.clone(),
        Err(ScriptError::EmptyResponse) => format!("{ERROR_MARKER} generating script."),
        // Rejected before any connection was attempted.
        Err(ScriptError::InvalidRequest(err)) => format!("{ERROR_MARKER} in task request: {err}"),
        Err(err) => format!("{ERROR_MARKER} connecting to AI Security Engine: {err}"),
    }
}

/// Client owned by the request layer, constructed once at startup.
pub struct ScriptClient<B = GeminiBackend> {
    backend: B,
    model: String,
}

impl ScriptClient<GeminiBackend> {
    /// Build the Gemini-backed client. Fails on a missing credential unless the
    /// config explicitly allows the placeholder.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let credential = Credential::from_env(config.allow_placeholder_credential)?;
        Self::with_credential(config, credential)
    }

    pub fn with_credential(
        config: &BackendConfig,
        credential: Credential,
    ) -> Result<Self, ConfigError> {
        let backend = GeminiBackend::new(config, credential)?;
        info!(
            "Script client ready: backend=gemini model={} placeholder_credential={}",
            config.model,
            backend.has_placeholder_credential()
        );
        Ok(Self::new(backend, config.model.clone()))
    }
}

impl<B: GenerationBackend> ScriptClient<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Submit one task. Never panics; every failure comes back as a `ScriptError`.
    pub async fn request_script(&self, task: &TaskRequest) -> ScriptResult {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("request_script", %request_id, backend = self.backend.name());

        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: render_prompt(task),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
        };

        async {
            match self.backend.generate(&request).await {
                Ok(response) if response.text.trim().is_empty() => {
                    warn!("Backend returned no text (model={})", response.model_used);
                    Err(ScriptError::EmptyResponse)
                }
                Ok(response) => {
                    info!(
                        "Script generated: {} bytes, {} tokens, {}ms",
                        response.text.len(),
                        response.tokens_used,
                        response.latency_ms
                    );
                    Ok(GeneratedScript {
                        text: response.text,
                        model_used: response.model_used,
                        tokens_used: response.tokens_used,
                        latency_ms: response.latency_ms,
                    })
                }
                Err(e) if e.is_auth() => {
                    error!(
                        "{} rejected the credential, check {}: {e}",
                        self.backend.name(),
                        crate::config::CREDENTIAL_ENV
                    );
                    Err(e)
                }
                Err(e) => {
                    error!("{} API error: {e}", self.backend.name());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Validate a raw description, then submit it.
    pub async fn request_description(&self, description: &str) -> ScriptResult {
        let task = TaskRequest::new(description).map_err(|e| {
            warn!("Rejected task description: {e}");
            ScriptError::from(e)
        })?;
        self.request_script(&task).await
    }

    /// Submit one task and render the outcome as display text. Always yields a string.
    pub async fn request_script_text(&self, task: &TaskRequest) -> String {
        display_text(&self.request_script(task).await)
    }
}
