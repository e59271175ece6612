//! SentinelKey console — Ubuntu 24.04 security operations
//!
//! Five panels, each turning operator input into a request for a generated
//! script:
//! - Key & License: signed license key generator, optional hardware binding
//! - User Control: password rotation and lockout of unauthorized accounts
//! - Database Ops: encrypted backup, restore, encryption at rest
//! - Disk Encryption: LUKS volumes and fscrypt directories
//! - Hardware Seal: TPM2 PCR-bound disk key
//!
//! Generated scripts are printed, and optionally copied, but never executed.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sentinel_scripts::builders::{DatabaseOperation, KeyAlgorithm, KeyConfig, UserOperation};
use sentinel_scripts::{load_config, load_config_from, ScriptClient, ScriptError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use sentinel_console::clipboard::Clipboard;
use sentinel_console::dashboard::Dashboard;
use sentinel_console::panel::{PanelAction, TriggerError};

#[derive(Parser)]
#[command(name = "sentinelkey", version, about = "Ubuntu 24.04 security operations console")]
struct Cli {
    /// Config file (default: $SENTINELKEY_CONFIG or /etc/sentinelkey/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Copy the generated script to the clipboard
    #[arg(long, global = true)]
    copy: bool,

    /// Print only the script text, without colors or the panel header
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the panels
    Panels,
    /// Key & License: generate a signed system license key generator
    Keygen {
        #[arg(long, default_value = "AES-256")]
        algorithm: KeyAlgorithm,
        /// Expiry date, YYYY-MM-DD (default: one year from today)
        #[arg(long)]
        expires: Option<NaiveDate>,
        /// Do not bind the key to this machine
        #[arg(long)]
        no_hardware_binding: bool,
        #[arg(long, default_value_t = 1)]
        max_sessions: u32,
    },
    /// User Control: credential rotation and account lockout
    Users {
        #[arg(value_enum)]
        operation: UserOp,
    },
    /// Database Ops: MySQL backup, restore and encryption at rest
    Db {
        #[arg(value_enum)]
        operation: DbOp,
    },
    /// Disk Encryption: volume or directory
    Disk {
        #[command(subcommand)]
        target: DiskTarget,
    },
    /// Hardware Seal: bind the disk key to TPM PCRs
    Seal,
}

#[derive(Subcommand)]
enum DiskTarget {
    /// Encrypt a block device with LUKS
    Device { device: Option<String> },
    /// Encrypt a directory with fscrypt or ecryptfs
    Dir { path: Option<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum UserOp {
    Rotate,
    Lock,
}

#[derive(Clone, Copy, ValueEnum)]
enum DbOp {
    Backup,
    Restore,
    Tde,
}

impl Command {
    /// Translate a subcommand into the panel action it stands for.
    fn into_action(self, today: NaiveDate) -> Option<PanelAction> {
        let action = match self {
            Command::Panels => return None,
            Command::Keygen {
                algorithm,
                expires,
                no_hardware_binding,
                max_sessions,
            } => {
                let defaults = KeyConfig::defaults_from(today);
                PanelAction::GenerateKey(KeyConfig {
                    algorithm,
                    expiry_date: expires.unwrap_or(defaults.expiry_date),
                    hardware_binding: !no_hardware_binding,
                    max_sessions,
                })
            }
            Command::Users { operation } => PanelAction::User(match operation {
                UserOp::Rotate => UserOperation::RotatePasswords,
                UserOp::Lock => UserOperation::LockUnauthorized,
            }),
            Command::Db { operation } => PanelAction::Database(match operation {
                DbOp::Backup => DatabaseOperation::Backup,
                DbOp::Restore => DatabaseOperation::Restore,
                DbOp::Tde => DatabaseOperation::EnableTde,
            }),
            Command::Disk { target } => match target {
                DiskTarget::Device { device } => PanelAction::EncryptDevice(device),
                DiskTarget::Dir { path } => PanelAction::EncryptDirectory(path.unwrap_or_default()),
            },
            Command::Seal => PanelAction::SealHardware,
        };
        Some(action)
    }
}

/// Install the stderr subscriber. The filter can be swapped once config is loaded.
fn init_tracing() -> Option<reload::Handle<EnvFilter, Registry>> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_set = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    // RUST_LOG wins over the config file
    (!env_set).then_some(handle)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let filter_handle = init_tracing();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    if let Some(handle) = filter_handle {
        let level = EnvFilter::try_new(&config.system.log_level)
            .with_context(|| format!("Invalid log_level {:?}", config.system.log_level))?;
        handle
            .reload(level)
            .context("Failed to apply configured log level")?;
    }

    if cli.plain {
        colored::control::set_override(false);
    }

    let mut dashboard = Dashboard::new();
    let today = chrono::Local::now().date_naive();
    let Some(action) = cli.command.into_action(today) else {
        print!("{}", dashboard.render_menu());
        return Ok(ExitCode::SUCCESS);
    };

    let client = Arc::new(
        ScriptClient::from_config(&config.backend).context("Failed to initialize script client")?,
    );

    match dashboard.trigger(&client, &action) {
        Ok(id) => info!("Request {id} submitted from {}", dashboard.active()),
        Err(TriggerError::Disabled(reason)) => {
            warn!("Nothing to do: {reason}");
            eprintln!("sentinelkey: {reason}");
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e).context("Request rejected"),
    }

    if !cli.plain {
        eprint!("{}", dashboard.active_panel().output().render());
    }

    let finished = {
        let panel = dashboard.active_panel_mut();
        tokio::select! {
            result = panel.wait() => result,
            _ = tokio::signal::ctrl_c() => None,
        }
    };

    let Some(result) = finished else {
        warn!("Interrupted, cancelling request");
        dashboard.active_panel_mut().teardown();
        return Ok(ExitCode::from(130));
    };

    let output = dashboard.active_panel().output();
    if cli.plain {
        println!("{}", output.content());
    } else {
        print!("{}", output.render());
    }

    if cli.copy && output.can_copy() {
        match Clipboard::detect().copy(output.content()).await {
            Ok(tool) => eprintln!("sentinelkey: copied to clipboard ({tool})"),
            Err(e) => warn!("Copy failed: {e:#}"),
        }
    }

    Ok(match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(ScriptError::Cancelled) => ExitCode::from(130),
        Err(_) => ExitCode::FAILURE,
    })
}
