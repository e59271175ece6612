//! Generation backend seam.

use std::future::Future;

use crate::error::ScriptError;

/// One prompt submitted to a text-generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: String,
    pub model_used: String,
    pub tokens_used: i32,
    pub latency_ms: i64,
}

/// A remote (or fake) service that turns a prompt into text.
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationResponse, ScriptError>> + Send;
}
