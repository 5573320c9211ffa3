//! Named key material on disk
//!
//! Each identity is a JSON array of the 64 secret-key bytes stored under
//! `<dir>/<name>.json`, readable and writable by the owner only.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use solana_sdk::signature::{Keypair, Signer};
use tracing::{error, info};

use vcoin_types::{LedgerError, LedgerResult};

#[cfg(unix)]
const KEYPAIR_FILE_MODE: u32 = 0o600;

const SECRET_KEY_LEN: usize = 64;

/// Directory of named keypairs
#[derive(Debug, Clone)]
pub struct Keystore {
    dir: PathBuf,
}

impl Keystore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the named keypair, generating and storing a new one when absent
    pub fn get_or_create(&self, name: &str) -> LedgerResult<Keypair> {
        validate_name(name)?;
        let path = self.dir.join(format!("{}.json", name));

        if path.exists() {
            return load_keypair(&path)
                .map_err(|e| LedgerError::Keystore(format!("Failed to load keypair {}: {}", name, e)));
        }

        fs::create_dir_all(&self.dir)?;
        let keypair = Keypair::new();
        write_keypair(&path, &keypair)
            .map_err(|e| LedgerError::Keystore(format!("Failed to save keypair {}: {}", name, e)))?;
        info!(name, pubkey = %keypair.pubkey(), "Created keypair");
        Ok(keypair)
    }

    /// Load an existing keypair without creating one
    pub fn load(&self, name: &str) -> LedgerResult<Keypair> {
        validate_name(name)?;
        let path = self.dir.join(format!("{}.json", name));
        if !path.exists() {
            return Err(LedgerError::MissingFile {
                path: path.display().to_string(),
            });
        }
        load_keypair(&path)
            .map_err(|e| LedgerError::Keystore(format!("Failed to load keypair {}: {}", name, e)))
    }
}

/// Reject names that could escape the keystore directory
fn validate_name(name: &str) -> LedgerResult<()> {
    if name.is_empty() {
        return Err(LedgerError::Keystore("Keypair name must be a non-empty string".to_string()));
    }

    if name.contains("..") || name.contains('/') || name.contains('\\') {
        error!(name, "Path traversal attempt in keypair name");
        return Err(LedgerError::Keystore(format!(
            "Security violation: path traversal attempt detected in keypair name: {}",
            name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Keystore(format!(
            "Invalid keypair name: {}. Only alphanumeric characters, hyphens, and underscores are allowed",
            name
        )));
    }

    Ok(())
}

fn load_keypair(path: &Path) -> LedgerResult<Keypair> {
    let contents = fs::read_to_string(path)?;
    let bytes: Vec<u8> = serde_json::from_str(&contents)?;
    if bytes.len() != SECRET_KEY_LEN {
        return Err(LedgerError::Keystore(format!(
            "expected {} secret key bytes, found {}",
            SECRET_KEY_LEN,
            bytes.len()
        )));
    }
    Keypair::from_bytes(&bytes).map_err(|e| LedgerError::Keystore(e.to_string()))
}

fn write_keypair(path: &Path, keypair: &Keypair) -> LedgerResult<()> {
    let contents = serde_json::to_string(&keypair.to_bytes().to_vec())?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(KEYPAIR_FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
