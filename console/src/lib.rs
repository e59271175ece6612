//! Terminal presentation shell for SentinelKey: panel selection, per-panel
//! request lifecycle, output rendering and clipboard copy.

pub mod clipboard;
pub mod dashboard;
pub mod output;
pub mod panel;

pub use dashboard::Dashboard;
pub use output::OutputPanel;
pub use panel::{Panel, PanelAction, PanelKind, TriggerError};
