//! Error types for the script-request client.

use thiserror::Error;

/// Failures while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No backend credential in the environment and placeholders are disallowed.
    #[error("backend credential not set: export {0} or enable allow_placeholder_credential")]
    MissingCredential(&'static str),

    /// The config file exists but could not be read.
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A value is present but unusable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Rejections raised while building a task description from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is {len} bytes, limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} contains a disallowed character {ch:?}")]
    DisallowedChar { field: &'static str, ch: char },

    #[error("max_sessions must be at least 1")]
    ZeroSessions,
}

/// A failed generation. Every backend outcome that is not a usable script
/// ends up as one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("invalid task request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("request to backend failed: {0}")]
    Transport(String),

    #[error("backend timed out after {0}s")]
    Timeout(u64),

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("malformed backend response: {0}")]
    Decode(String),

    #[error("backend returned an empty script")]
    EmptyResponse,

    #[error("request was cancelled")]
    Cancelled,

    #[error("request task ended abnormally: {0}")]
    Interrupted(String),
}

impl ScriptError {
    /// Classify a reqwest failure.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// True when the backend rejected the credential. Gemini answers an
    /// unknown key with 400 INVALID_ARGUMENT rather than 401.
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Backend { status: 401 | 403, .. } => true,
            Self::Backend {
                status: 400,
                message,
            } => message.contains("API key not valid") || message.contains("API_KEY_INVALID"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_classification() {
        let denied = ScriptError::Backend {
            status: 403,
            message: "API key not valid".into(),
        };
        assert!(denied.is_auth());

        let bad_key = ScriptError::Backend {
            status: 400,
            message: "API key not valid. Please pass a valid API key.".into(),
        };
        assert!(bad_key.is_auth());

        let bad_body = ScriptError::Backend {
            status: 400,
            message: "Invalid JSON payload received.".into(),
        };
        assert!(!bad_body.is_auth());

        let overloaded = ScriptError::Backend {
            status: 503,
            message: "overloaded".into(),
        };
        assert!(!overloaded.is_auth());
        assert!(!ScriptError::EmptyResponse.is_auth());
    }

    #[test]
    fn test_request_error_converts() {
        let err: ScriptError = RequestError::Empty { field: "path" }.into();
        assert_eq!(err.to_string(), "invalid task request: path must not be empty");
    }
}
