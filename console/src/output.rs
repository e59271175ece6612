//! Terminal output panel shared by every task panel.

use colored::Colorize;
use sentinel_scripts::{display_text, ScriptResult};

pub const LOADING_TEXT: &str = "GENERATING SECURITY PROTOCOLS...";
pub const WAITING_TEXT: &str = "# Waiting for command generation...";

/// Rendered script area: a title bar, then a loading line, placeholder, or text.
#[derive(Debug, Clone)]
pub struct OutputPanel {
    title: &'static str,
    content: String,
    loading: bool,
    failed: bool,
}

impl OutputPanel {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            content: String::new(),
            loading: false,
            failed: false,
        }
    }

    pub fn title(&self) -> &str {
        self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True when the last result was an error. Rendering does not depend on it.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Store a finished result; errors are kept as their `# Error` text.
    pub fn set_result(&mut self, result: &ScriptResult) {
        self.content = display_text(result);
        self.failed = result.is_err();
        self.loading = false;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.loading = false;
        self.failed = false;
    }

    /// Copy is offered only for finished, non-empty output.
    pub fn can_copy(&self) -> bool {
        !self.loading && !self.content.is_empty()
    }

    /// Render the panel. Scripts and errors share the same style.
    pub fn render(&self) -> String {
        let mut header = format!(">_ {}", self.title.to_uppercase());
        if self.can_copy() {
            header.push_str("    [COPY SCRIPT]");
        }

        let body = if self.loading {
            LOADING_TEXT.to_string()
        } else if self.content.is_empty() {
            WAITING_TEXT.to_string()
        } else {
            self.content.clone()
        };

        format!("{}\n{}\n", header.bold().dimmed(), body.green())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_scripts::{GeneratedScript, ScriptError};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_empty_panel_shows_placeholder() {
        plain();
        let panel = OutputPanel::new("TPM 2.0 Sealing Script");
        let out = panel.render();
        assert!(out.starts_with(">_ TPM 2.0 SEALING SCRIPT\n"));
        assert!(out.contains(WAITING_TEXT));
        assert!(!panel.can_copy());
    }

    #[test]
    fn test_loading_hides_content_and_copy() {
        plain();
        let mut panel = OutputPanel::new("MySQL Security Procedure");
        panel.set_result(&Ok(GeneratedScript {
            text: "mysqldump --all-databases".into(),
            model_used: "m".into(),
            tokens_used: 0,
            latency_ms: 1,
        }));
        panel.set_loading(true);
        let out = panel.render();
        assert!(out.contains(LOADING_TEXT));
        assert!(!out.contains("mysqldump"));
        assert!(!panel.can_copy());
    }

    #[test]
    fn test_error_rendered_like_a_script() {
        plain();
        let mut panel = OutputPanel::new("Encryption Command Sequence");
        panel.set_result(&Err(ScriptError::Transport("dns error".into())));
        assert!(panel.is_failed());
        assert!(panel.can_copy());
        let out = panel.render();
        assert!(out.contains("# Error connecting to AI Security Engine: request to backend failed: dns error"));
        assert!(out.contains("[COPY SCRIPT]"));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut panel = OutputPanel::new("t");
        panel.set_result(&Err(ScriptError::EmptyResponse));
        panel.clear();
        assert!(panel.content().is_empty());
        assert!(!panel.is_failed());
    }
}
