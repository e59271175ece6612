//! SentinelKey script-request client
//!
//! Turns typed security-task input into a natural-language prompt and asks a
//! generative backend for a script:
//! - Request builders for key generation, hardware sealing, database,
//!   user-account and disk operations
//! - Input validation before anything leaves the process
//! - Gemini backend over HTTPS, behind a trait for substitution in tests
//! - Typed results, rendered to `# Error ...` text only at the display edge
//!
//! Generated scripts are opaque text. Nothing here inspects or executes them.

pub mod backend;
pub mod builders;
pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod task;

pub use backend::{GenerationBackend, GenerationRequest, GenerationResponse};
pub use client::{display_text, GeneratedScript, ScriptClient, ScriptResult, ERROR_MARKER};
pub use config::{load_config, load_config_from, BackendConfig, Credential, SentinelConfig};
pub use error::{ConfigError, RequestError, ScriptError};
pub use task::TaskRequest;
