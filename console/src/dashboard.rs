//! Panel selector: exactly one panel is active at a time.

use std::sync::Arc;

use sentinel_scripts::{GenerationBackend, ScriptClient};
use tracing::info;
use uuid::Uuid;

use crate::panel::{Panel, PanelAction, PanelKind, TriggerError};

pub struct Dashboard {
    active: PanelKind,
    panels: Vec<Panel>,
}

impl Dashboard {
    /// Starts on the key management panel.
    pub fn new() -> Self {
        Self {
            active: PanelKind::KeyManagement,
            panels: PanelKind::ALL.iter().map(|k| Panel::new(*k)).collect(),
        }
    }

    pub fn active(&self) -> PanelKind {
        self.active
    }

    pub fn is_active(&self, kind: PanelKind) -> bool {
        self.active == kind
    }

    /// Activate `kind`. Switching away tears the previous panel down.
    /// Returns false when `kind` was already active.
    pub fn select(&mut self, kind: PanelKind) -> bool {
        if self.active == kind {
            return false;
        }
        self.panels[self.active.index()].teardown();
        info!("Panel switch: {} -> {}", self.active, kind);
        self.active = kind;
        true
    }

    pub fn panel(&self, kind: PanelKind) -> &Panel {
        &self.panels[kind.index()]
    }

    pub fn active_panel(&self) -> &Panel {
        self.panel(self.active)
    }

    pub fn active_panel_mut(&mut self) -> &mut Panel {
        &mut self.panels[self.active.index()]
    }

    /// Switch to the panel owning `action` and trigger it there.
    pub fn trigger<B>(
        &mut self,
        client: &Arc<ScriptClient<B>>,
        action: &PanelAction,
    ) -> Result<Uuid, TriggerError>
    where
        B: GenerationBackend + 'static,
    {
        self.select(action.panel());
        self.active_panel_mut().trigger(client, action)
    }

    /// Render the panel list with a marker on the active one.
    pub fn render_menu(&self) -> String {
        PanelKind::ALL
            .iter()
            .map(|kind| {
                let marker = if self.is_active(*kind) { '>' } else { ' ' };
                format!("{marker} {kind}\n")
            })
            .collect()
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::{client, GatedBackend};
    use sentinel_scripts::builders::DatabaseOperation;

    fn active_count(dashboard: &Dashboard) -> usize {
        PanelKind::ALL
            .iter()
            .filter(|k| dashboard.is_active(**k))
            .count()
    }

    #[test]
    fn test_exactly_one_active() {
        let mut dashboard = Dashboard::new();
        assert_eq!(dashboard.active(), PanelKind::KeyManagement);
        for kind in PanelKind::ALL {
            dashboard.select(kind);
            assert_eq!(active_count(&dashboard), 1);
            assert!(dashboard.is_active(kind));
            assert_eq!(dashboard.active_panel().kind(), kind);
        }
    }

    #[test]
    fn test_select_active_is_noop() {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.select(PanelKind::DatabaseOps));
        assert!(!dashboard.select(PanelKind::DatabaseOps));
        assert_eq!(dashboard.active(), PanelKind::DatabaseOps);
    }

    #[tokio::test]
    async fn test_reselecting_keeps_running_request() {
        let client = client(GatedBackend::closed());
        let mut dashboard = Dashboard::new();
        dashboard
            .trigger(&client, &PanelAction::Database(DatabaseOperation::EnableTde))
            .unwrap();
        dashboard.select(PanelKind::DatabaseOps);
        assert!(dashboard.active_panel().is_busy());

        client.backend().gate.add_permits(1);
        let result = dashboard.active_panel_mut().wait().await.unwrap();
        assert!(result.unwrap().text.contains("my.cnf"));
    }

    #[tokio::test]
    async fn test_switching_away_cancels_request() {
        let client = client(GatedBackend::closed());
        let mut dashboard = Dashboard::new();
        dashboard
            .trigger(&client, &PanelAction::SealHardware)
            .unwrap();
        assert_eq!(dashboard.active(), PanelKind::HardwareSeal);

        dashboard.select(PanelKind::UserSecurity);
        client.backend().gate.add_permits(1);
        let sealed = dashboard.panel(PanelKind::HardwareSeal);
        assert!(!sealed.is_busy());
        assert!(sealed.output().content().is_empty());
    }

    #[test]
    fn test_menu_marks_active_panel() {
        let mut dashboard = Dashboard::new();
        dashboard.select(PanelKind::HardwareSeal);
        let menu = dashboard.render_menu();
        assert!(menu.contains("> Hardware Seal\n"));
        assert!(menu.contains("  Key & License\n"));
        assert_eq!(menu.matches('>').count(), 1);
    }
}
