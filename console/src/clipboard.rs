//! Host clipboard access through the platform's clipboard tool.

use anyhow::{bail, Context, Result};
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// A command that reads clipboard contents from stdin.
#[derive(Debug, Clone)]
pub struct ClipboardTool {
    pub program: String,
    pub args: Vec<String>,
}

impl ClipboardTool {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Tries each candidate tool in order until one accepts the text.
pub struct Clipboard {
    candidates: Vec<ClipboardTool>,
}

impl Clipboard {
    /// Wayland, X11, then macOS.
    pub fn detect() -> Self {
        Self::with_candidates(vec![
            ClipboardTool::new("wl-copy", &[]),
            ClipboardTool::new("xclip", &["-selection", "clipboard"]),
            ClipboardTool::new("xsel", &["--clipboard", "--input"]),
            ClipboardTool::new("pbcopy", &[]),
        ])
    }

    pub fn with_candidates(candidates: Vec<ClipboardTool>) -> Self {
        Self { candidates }
    }

    /// Copy `text`, returning the name of the tool that took it.
    pub async fn copy(&self, text: &str) -> Result<String> {
        for tool in &self.candidates {
            let child = Command::new(&tool.program)
                .args(&tool.args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            let mut child = match child {
                Ok(child) => child,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Clipboard tool {} not installed", tool.program);
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to start {}", tool.program))
                }
            };

            if let Some(mut stdin) = child.stdin.take() {
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    // The tool exited before reading, e.g. wl-copy without a compositor.
                    debug!("Clipboard tool {} refused input: {e}", tool.program);
                    drop(stdin);
                    let _ = child.kill().await;
                    continue;
                }
                // Closing stdin signals end of input.
                drop(stdin);
            }

            let status = child
                .wait()
                .await
                .with_context(|| format!("Failed to wait for {}", tool.program))?;
            if status.success() {
                info!("Copied {} bytes to clipboard via {}", text.len(), tool.program);
                return Ok(tool.program.clone());
            }
            debug!("Clipboard tool {} exited with {status}", tool.program);
        }

        bail!("No working clipboard tool found (tried wl-copy, xclip, xsel, pbcopy)")
    }
}
