//! Task panels — collect input, run one request at a time, hold the output.
//!
//! Each request runs as a spawned task tied to a `CancellationToken` owned by
//! the panel. Tearing the panel down or superseding the request cancels the
//! token, and a cancelled request never writes into the output.

use std::fmt;
use std::sync::Arc;

use sentinel_scripts::builders::{self, DatabaseOperation, KeyConfig, UserOperation};
use sentinel_scripts::{
    GenerationBackend, RequestError, ScriptClient, ScriptError, ScriptResult, TaskRequest,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::output::OutputPanel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    KeyManagement,
    UserSecurity,
    DatabaseOps,
    DiskEncryption,
    HardwareSeal,
}

impl PanelKind {
    pub const ALL: [PanelKind; 5] = [
        PanelKind::KeyManagement,
        PanelKind::UserSecurity,
        PanelKind::DatabaseOps,
        PanelKind::DiskEncryption,
        PanelKind::HardwareSeal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::KeyManagement => "Key & License",
            Self::UserSecurity => "User Control",
            Self::DatabaseOps => "Database Ops",
            Self::DiskEncryption => "Disk Encryption",
            Self::HardwareSeal => "Hardware Seal",
        }
    }

    pub fn output_title(&self) -> &'static str {
        match self {
            Self::KeyManagement => "Generated Python Key Generator",
            Self::UserSecurity => "Access Control Operation Script",
            Self::DatabaseOps => "MySQL Security Procedure",
            Self::DiskEncryption => "Encryption Command Sequence",
            Self::HardwareSeal => "TPM 2.0 Sealing Script",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::KeyManagement => 0,
            Self::UserSecurity => 1,
            Self::DatabaseOps => 2,
            Self::DiskEncryption => 3,
            Self::HardwareSeal => 4,
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A button press on one of the panels, with the input it collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    GenerateKey(KeyConfig),
    User(UserOperation),
    Database(DatabaseOperation),
    /// `None` when no drive is selected.
    EncryptDevice(Option<String>),
    EncryptDirectory(String),
    SealHardware,
}

impl PanelAction {
    pub fn panel(&self) -> PanelKind {
        match self {
            Self::GenerateKey(_) => PanelKind::KeyManagement,
            Self::User(_) => PanelKind::UserSecurity,
            Self::Database(_) => PanelKind::DatabaseOps,
            Self::EncryptDevice(_) | Self::EncryptDirectory(_) => PanelKind::DiskEncryption,
            Self::SealHardware => PanelKind::HardwareSeal,
        }
    }

    /// Whether the trigger is enabled given the collected input alone.
    pub fn has_required_input(&self) -> bool {
        match self {
            Self::EncryptDevice(device) => device.as_deref().is_some_and(|d| !d.is_empty()),
            Self::EncryptDirectory(path) => !path.is_empty(),
            _ => true,
        }
    }

    /// Build the task description for this action.
    pub fn to_task(&self) -> Result<TaskRequest, RequestError> {
        match self {
            Self::GenerateKey(config) => builders::key_generation(config),
            Self::User(op) => Ok(builders::user_security(*op)),
            Self::Database(op) => Ok(builders::database(*op)),
            Self::EncryptDevice(device) => builders::disk_volume(device.as_deref().unwrap_or("")),
            Self::EncryptDirectory(path) => builders::disk_directory(path),
            Self::SealHardware => Ok(builders::hardware_seal()),
        }
    }
}

/// Why a trigger did not start a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// A request from this panel is still running.
    Busy,
    /// Required input is missing, so the trigger is disabled.
    Disabled(&'static str),
    /// The action belongs to a different panel.
    WrongPanel { expected: PanelKind, got: PanelKind },
    /// The collected input failed validation.
    Invalid(RequestError),
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("a request is already running on this panel"),
            Self::Disabled(reason) => write!(f, "action disabled: {reason}"),
            Self::WrongPanel { expected, got } => {
                write!(f, "action for {got} sent to the {expected} panel")
            }
            Self::Invalid(err) => write!(f, "invalid input: {err}"),
        }
    }
}

impl std::error::Error for TriggerError {}

struct InFlight {
    id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<ScriptResult>,
}

pub struct Panel {
    kind: PanelKind,
    output: OutputPanel,
    in_flight: Option<InFlight>,
}

impl Panel {
    pub fn new(kind: PanelKind) -> Self {
        Self {
            kind,
            output: OutputPanel::new(kind.output_title()),
            in_flight: None,
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn output(&self) -> &OutputPanel {
        &self.output
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn request_id(&self) -> Option<Uuid> {
        self.in_flight.as_ref().map(|f| f.id)
    }

    pub fn can_trigger(&self, action: &PanelAction) -> bool {
        !self.is_busy() && action.panel() == self.kind && action.has_required_input()
    }

    /// Start a request. Refused while another request from this panel runs.
    pub fn trigger<B>(
        &mut self,
        client: &Arc<ScriptClient<B>>,
        action: &PanelAction,
    ) -> Result<Uuid, TriggerError>
    where
        B: GenerationBackend + 'static,
    {
        if self.is_busy() {
            return Err(TriggerError::Busy);
        }
        let task = self.prepare(action)?;
        Ok(self.spawn(client, task))
    }

    /// Start a request, cancelling any request still running on this panel.
    pub fn supersede<B>(
        &mut self,
        client: &Arc<ScriptClient<B>>,
        action: &PanelAction,
    ) -> Result<Uuid, TriggerError>
    where
        B: GenerationBackend + 'static,
    {
        let task = self.prepare(action)?;
        if let Some(old) = self.in_flight.take() {
            info!("Superseding request {} on {}", old.id, self.kind);
            old.cancel.cancel();
        }
        Ok(self.spawn(client, task))
    }

    fn prepare(&self, action: &PanelAction) -> Result<TaskRequest, TriggerError> {
        if action.panel() != self.kind {
            return Err(TriggerError::WrongPanel {
                expected: self.kind,
                got: action.panel(),
            });
        }
        if !action.has_required_input() {
            let reason = match action {
                PanelAction::EncryptDevice(_) => "no drive selected",
                _ => "target path is empty",
            };
            return Err(TriggerError::Disabled(reason));
        }
        action.to_task().map_err(TriggerError::Invalid)
    }

    fn spawn<B>(&mut self, client: &Arc<ScriptClient<B>>, task: TaskRequest) -> Uuid
    where
        B: GenerationBackend + 'static,
    {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let client = Arc::clone(client);

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ScriptError::Cancelled),
                result = client.request_script(&task) => result,
            }
        });

        debug!("Request {id} started on {}", self.kind);
        self.output.set_loading(true);
        self.in_flight = Some(InFlight { id, cancel, handle });
        id
    }

    /// Wait for the running request and apply its result to the output.
    /// Returns `None` when nothing was running.
    /// Dropping this future leaves the request registered, so a later
    /// `teardown` still cancels it.
    pub async fn wait(&mut self) -> Option<ScriptResult> {
        let joined = (&mut self.in_flight.as_mut()?.handle).await;
        let id = self.in_flight.take().map(|f| f.id).unwrap_or_default();
        let result = match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ScriptError::Cancelled),
            Err(e) => Err(ScriptError::Interrupted(e.to_string())),
        };

        match &result {
            Err(ScriptError::Cancelled) => {
                debug!("Request {id} cancelled, output untouched");
                self.output.set_loading(false);
            }
            other => self.output.set_result(other),
        }
        Some(result)
    }

    /// Cancel any running request and drop the held output.
    pub fn teardown(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            warn!("Cancelling in-flight request {} on {}", in_flight.id, self.kind);
            in_flight.cancel.cancel();
        }
        self.output.clear();
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sentinel_scripts::{GenerationRequest, GenerationResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Holds every request until a permit is released, then echoes the prompt.
    pub(crate) struct GatedBackend {
        pub(crate) gate: Semaphore,
        pub(crate) calls: AtomicUsize,
    }

    impl GatedBackend {
        pub(crate) fn closed() -> Self {
            Self {
                gate: Semaphore::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn open() -> Self {
            Self {
                gate: Semaphore::new(Semaphore::MAX_PERMITS),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GenerationBackend for GatedBackend {
        fn name(&self) -> &str {
            "gated"
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, ScriptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| ScriptError::Transport(e.to_string()))?;
            Ok(GenerationResponse {
                text: request.prompt.clone(),
                model_used: request.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            })
        }
    }

    pub(crate) fn client(backend: GatedBackend) -> Arc<ScriptClient<GatedBackend>> {
        Arc::new(ScriptClient::new(backend, "test-model"))
    }

    #[tokio::test]
    async fn test_trigger_and_wait_sets_output() {
        let client = client(GatedBackend::open());
        let mut panel = Panel::new(PanelKind::HardwareSeal);

        panel.trigger(&client, &PanelAction::SealHardware).unwrap();
        assert!(panel.is_busy());
        assert!(panel.output().is_loading());

        let result = panel.wait().await.unwrap();
        assert!(result.is_ok());
        assert!(!panel.is_busy());
        assert!(panel.output().content().contains("tpm2-tools"));
        assert!(panel.output().can_copy());
    }

    #[tokio::test]
    async fn test_busy_panel_refuses_second_trigger() {
        let client = client(GatedBackend::closed());
        let mut panel = Panel::new(PanelKind::DatabaseOps);

        panel
            .trigger(&client, &PanelAction::Database(DatabaseOperation::Backup))
            .unwrap();
        let second = panel.trigger(&client, &PanelAction::Database(DatabaseOperation::Restore));
        assert_eq!(second, Err(TriggerError::Busy));

        client.backend().gate.add_permits(1);
        panel.wait().await.unwrap().unwrap();
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_drive_selected_never_requests() {
        let client = client(GatedBackend::open());
        let mut panel = Panel::new(PanelKind::DiskEncryption);

        let action = PanelAction::EncryptDevice(None);
        assert!(!panel.can_trigger(&action));
        assert_eq!(
            panel.trigger(&client, &action),
            Err(TriggerError::Disabled("no drive selected"))
        );
        assert_eq!(
            panel.trigger(&client, &PanelAction::EncryptDevice(Some(String::new()))),
            Err(TriggerError::Disabled("no drive selected"))
        );
        assert_eq!(
            panel.trigger(&client, &PanelAction::EncryptDirectory(String::new())),
            Err(TriggerError::Disabled("target path is empty"))
        );
        assert!(!panel.is_busy());
        assert!(panel.wait().await.is_none());
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_request() {
        let client = client(GatedBackend::open());
        let mut panel = Panel::new(PanelKind::DiskEncryption);

        let action = PanelAction::EncryptDevice(Some("/dev/sda1; reboot".into()));
        let err = panel.trigger(&client, &action).unwrap_err();
        assert!(matches!(err, TriggerError::Invalid(RequestError::DisallowedChar { .. })));
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_panel_rejected() {
        let client = client(GatedBackend::open());
        let mut panel = Panel::new(PanelKind::UserSecurity);
        let err = panel.trigger(&client, &PanelAction::SealHardware).unwrap_err();
        assert_eq!(
            err,
            TriggerError::WrongPanel {
                expected: PanelKind::UserSecurity,
                got: PanelKind::HardwareSeal
            }
        );
    }

    #[tokio::test]
    async fn test_supersede_discards_old_request() {
        let client = client(GatedBackend::closed());
        let mut panel = Panel::new(PanelKind::DiskEncryption);

        let first = panel
            .trigger(&client, &PanelAction::EncryptDevice(Some("/dev/sda1".into())))
            .unwrap();
        let second = panel
            .supersede(&client, &PanelAction::EncryptDirectory("/srv/vault".into()))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(panel.request_id(), Some(second));

        client.backend().gate.add_permits(2);
        panel.wait().await.unwrap().unwrap();
        let content = panel.output().content();
        assert!(content.contains("'/srv/vault'"));
        assert!(!content.contains("/dev/sda1"));
    }

    #[tokio::test]
    async fn test_teardown_cancels_and_never_writes() {
        let client = client(GatedBackend::closed());
        let mut panel = Panel::new(PanelKind::KeyManagement);
        let config = KeyConfig::defaults_from(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        panel
            .trigger(&client, &PanelAction::GenerateKey(config))
            .unwrap();
        panel.teardown();
        client.backend().gate.add_permits(1);

        assert!(!panel.is_busy());
        assert!(panel.wait().await.is_none());
        assert!(panel.output().content().is_empty());
        assert!(!panel.output().is_loading());
    }

    #[test]
    fn test_action_panel_mapping() {
        assert_eq!(
            PanelAction::User(UserOperation::LockUnauthorized).panel(),
            PanelKind::UserSecurity
        );
        assert_eq!(
            PanelAction::EncryptDirectory("/x".into()).panel(),
            PanelKind::DiskEncryption
        );
        for (i, kind) in PanelKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
