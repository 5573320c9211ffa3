//! Checksummed JSON persistence
//!
//! Every persisted ledger document carries a top-level `checksum`: the hex
//! SHA-256 of the document's other fields serialized as compact JSON with
//! object keys sorted at every level. Loading recomputes the digest and
//! rejects the file on mismatch before the typed record is decoded.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use vcoin_types::{LedgerError, LedgerResult, CHECKSUM_FIELD};

/// File mode for state documents: owner read/write, group read
#[cfg(unix)]
const STATE_FILE_MODE: u32 = 0o640;

/// Tamper-evident load/save of ledger documents
pub struct IntegrityStore;

impl IntegrityStore {
    /// Persist `record` with a freshly computed checksum, replacing the file atomically.
    ///
    /// Returns the checksum written.
    pub fn save<T: Serialize>(path: &Path, record: &T) -> LedgerResult<String> {
        let mut value = serde_json::to_value(record)?;
        let object = value.as_object_mut().ok_or_else(|| {
            LedgerError::Serialization("persisted record must be a JSON object".to_string())
        })?;
        object.remove(CHECKSUM_FIELD);

        let digest = checksum(&value);
        if let Value::Object(object) = &mut value {
            object.insert(CHECKSUM_FIELD.to_string(), Value::String(digest.clone()));
        }

        let contents = serde_json::to_string_pretty(&value)?;
        write_atomic(path, contents.as_bytes())?;
        debug!(path = %path.display(), checksum = %digest, "Saved state");
        Ok(digest)
    }

    /// Load and verify a document, failing when it is absent
    pub fn load<T: DeserializeOwned>(path: &Path) -> LedgerResult<T> {
        if !path.exists() {
            return Err(LedgerError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let contents = fs::read_to_string(path)?;
        let mut value: Value = serde_json::from_str(&contents)?;
        let object = value.as_object_mut().ok_or_else(|| {
            LedgerError::integrity(path.display(), "document is not a JSON object")
        })?;

        let stored = match object.remove(CHECKSUM_FIELD) {
            Some(Value::String(s)) => s,
            Some(_) => return Err(LedgerError::integrity(path.display(), "checksum is not a string")),
            None => return Err(LedgerError::integrity(path.display(), "checksum is missing")),
        };

        let computed = checksum(&value);
        if computed != stored {
            return Err(LedgerError::integrity(path.display(), "checksum mismatch"));
        }
        debug!(path = %path.display(), checksum = %computed, "Verified state");

        serde_json::from_value(value).map_err(|e| {
            LedgerError::Serialization(format!("{} has an unexpected shape: {}", path.display(), e))
        })
    }

    /// Load a document, returning the default state when the file does not exist yet
    pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> LedgerResult<T> {
        match Self::load(path) {
            Err(LedgerError::MissingFile { .. }) => Ok(T::default()),
            other => other,
        }
    }
}

/// Hex SHA-256 digest of the canonical serialization
pub fn checksum(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}

/// Compact JSON with object keys in lexicographic order at every depth
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> LedgerResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(STATE_FILE_MODE))?;
    }

    tmp.persist(path).map_err(|e| LedgerError::Io(e.error.to_string()))?;
    Ok(())
}
