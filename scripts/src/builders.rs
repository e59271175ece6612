//! Request builders: typed panel input in, task description out.
//!
//! Every builder is deterministic and interpolates its parameters verbatim.
//! Free-text inputs are validated for length and characters, never escaped.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;
use crate::task::{validate_device, validate_path, TaskRequest};

/// Cipher named in the generated license tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KeyAlgorithm {
    #[default]
    #[serde(rename = "AES-256")]
    Aes256,
    #[serde(rename = "ChaCha20-Poly1305")]
    ChaCha20Poly1305,
}

impl KeyAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aes256 => "AES-256",
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-256" | "aes256" => Ok(Self::Aes256),
            "chacha20-poly1305" | "chacha20poly1305" => Ok(Self::ChaCha20Poly1305),
            other => Err(format!(
                "unknown algorithm {other:?}, expected AES-256 or ChaCha20-Poly1305"
            )),
        }
    }
}

/// Parameters for the license key generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    pub algorithm: KeyAlgorithm,
    pub expiry_date: NaiveDate,
    pub hardware_binding: bool,
    pub max_sessions: u32,
}

impl KeyConfig {
    /// Defaults used by the key panel: one year from `today`, bound, single session.
    pub fn defaults_from(today: NaiveDate) -> Self {
        // Feb 29 has no counterpart next year; fall back to Feb 28.
        let expiry_date = today
            .with_year(today.year() + 1)
            .or_else(|| today.pred_opt().and_then(|d| d.with_year(today.year() + 1)))
            .unwrap_or(today);
        Self {
            algorithm: KeyAlgorithm::Aes256,
            expiry_date,
            hardware_binding: true,
            max_sessions: 1,
        }
    }
}

/// Describe a signed license generator, optionally bound to this machine.
pub fn key_generation(config: &KeyConfig) -> Result<TaskRequest, RequestError> {
    if config.max_sessions == 0 {
        return Err(RequestError::ZeroSessions);
    }
    let binding = if config.hardware_binding {
        "Must bind to Machine ID (/etc/machine-id) and BIOS Serial"
    } else {
        "None (no hardware binding required)"
    };
    TaskRequest::new(format!(
        "Create a Python script that generates a signed system license key.\n\
         - Algorithm: {}\n\
         - Expiration: {}\n\
         - Maximum concurrent sessions: {}\n\
         - Hardware Binding: {}\n\
         - The script should output a license file verifiable by a PAM module.",
        config.algorithm,
        config.expiry_date.format("%Y-%m-%d"),
        config.max_sessions,
        binding
    ))
}

/// Describe sealing the disk key to TPM platform configuration registers.
pub fn hardware_seal() -> TaskRequest {
    fixed(
        "Generate a script to:\n\
         1. Install tpm2-tools.\n\
         2. Read the current PCR values (0, 1, and 7 for BIOS/SecureBoot).\n\
         3. Generate a LUKS key based on these PCR values (Hardware binding).\n\
         4. Provide commands to enroll this key into a LUKS partition.\n\
         This ensures the OS cannot boot if hardware/BIOS changes.",
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseOperation {
    /// Encrypted dump-and-compress.
    Backup,
    /// Decrypt and import a backup.
    Restore,
    /// Enable encryption at rest.
    EnableTde,
}

pub fn database(operation: DatabaseOperation) -> TaskRequest {
    fixed(match operation {
        DatabaseOperation::Backup => {
            "Generate a secure mysqldump script. It should: 1) Dump all databases. \
             2) Compress with gzip. 3) Encrypt the backup file using OpenSSL AES-256 \
             with a timestamped filename. 4) Save to /var/secure_backups/."
        }
        DatabaseOperation::Restore => {
            "Generate a script to: 1) Decrypt a specific AES-256 encrypted SQL backup. \
             2) Drop existing tables (safe mode). 3) Import the SQL dump into MySQL. \
             4) Flush privileges."
        }
        DatabaseOperation::EnableTde => {
            "Generate instructions to enable 'Data at Rest Encryption' (TDE) for \
             MySQL/MariaDB on Ubuntu 24.04. Include steps to generate keyring files, \
             modify my.cnf, and restart the service securely."
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOperation {
    RotatePasswords,
    LockUnauthorized,
}

pub fn user_security(operation: UserOperation) -> TaskRequest {
    fixed(match operation {
        UserOperation::RotatePasswords => {
            "Generate a script to force password rotation for ALL users with UID >= 1000. \
             Also generate a random strong password for the root user and 'mysql' root user. \
             Output the new credentials to a secured file /root/new_creds.txt only readable by root."
        }
        UserOperation::LockUnauthorized => {
            "Generate a script to audit /etc/passwd. Lock ALL users that are not in the \
             'sudo' group or verified list. Kill all active SSH sessions for these users immediately."
        }
    })
}

/// Describe full-volume LUKS encryption of `device`.
pub fn disk_volume(device: &str) -> Result<TaskRequest, RequestError> {
    validate_device(device)?;
    TaskRequest::new(format!(
        "Generate a script to encrypt partition {device} using LUKS (Linux Unified Key Setup). \
         Ensure it formats with ext4 after encryption, updates /etc/crypttab, and mounts \
         automatically on boot via a keyfile stored in /root/keys/."
    ))
}

/// Describe directory-level encryption of `path`.
pub fn disk_directory(path: &str) -> Result<TaskRequest, RequestError> {
    validate_path(path)?;
    TaskRequest::new(format!(
        "Generate a script to encrypt the directory '{path}' using 'fscrypt' or 'ecryptfs' \
         on Ubuntu 24.04. Create a specific user key for this directory so only the owner \
         can read contents."
    ))
}

fn fixed(text: &'static str) -> TaskRequest {
    TaskRequest::from_static(text)
}
