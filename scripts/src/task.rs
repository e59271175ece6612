//! Task requests: the natural-language description handed to the backend.

use std::fmt;

use crate::error::RequestError;

/// Upper bound on a full task description.
pub const MAX_DESCRIPTION_BYTES: usize = 16 * 1024;
/// Upper bound on a block device path such as `/dev/sda1`.
pub const MAX_DEVICE_BYTES: usize = 255;
/// Upper bound on a filesystem path (PATH_MAX).
pub const MAX_PATH_BYTES: usize = 4096;

/// A validated description of a desired security operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    description: String,
}

impl TaskRequest {
    /// Build a request, rejecting empty, oversized, or control-character input.
    /// Newlines and tabs are allowed since descriptions are multi-line.
    pub fn new(description: impl Into<String>) -> Result<Self, RequestError> {
        let description = description.into();
        check_text("description", &description, MAX_DESCRIPTION_BYTES, |c| {
            c.is_control() && c != '\n' && c != '\t' && c != '\r'
        })?;
        Ok(Self { description })
    }

    /// Built-in descriptions skip validation; they are constants well inside every limit.
    pub(crate) fn from_static(description: &'static str) -> Self {
        Self {
            description: description.to_string(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn into_description(self) -> String {
        self.description
    }
}

impl fmt::Display for TaskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Validate a block device name. Whitespace is rejected along with control characters.
pub fn validate_device(device: &str) -> Result<(), RequestError> {
    check_text("device", device, MAX_DEVICE_BYTES, |c| {
        c.is_control() || c.is_whitespace()
    })
}

/// Validate a directory path. Spaces are legal in paths; control characters are not.
pub fn validate_path(path: &str) -> Result<(), RequestError> {
    check_text("path", path, MAX_PATH_BYTES, char::is_control)
}

fn check_text(
    field: &'static str,
    value: &str,
    max: usize,
    disallowed: impl Fn(char) -> bool,
) -> Result<(), RequestError> {
    if value.trim().is_empty() {
        return Err(RequestError::Empty { field });
    }
    if value.len() > max {
        return Err(RequestError::TooLong {
            field,
            len: value.len(),
            max,
        });
    }
    if let Some(ch) = value.chars().find(|c| disallowed(*c)) {
        return Err(RequestError::DisallowedChar { field, ch });
    }
    Ok(())
}
