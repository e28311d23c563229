//! Store construction parameters.

use crate::codec::EncryptionMethod;
use std::path::PathBuf;

/// Explicit configuration for a [`Store`](crate::Store).
///
/// Everything the store needs is carried here; there is no ambient
/// process state.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the database and backup files, created on open.
    pub dir: PathBuf,
    pub filename: String,
    pub backup_filename: String,
    pub method: EncryptionMethod,
    /// Secret for the `aes` method; ignored by the other methods.
    pub key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("database"),
            filename: "db.json".to_string(),
            backup_filename: "db_backup.json".to_string(),
            method: EncryptionMethod::Base64,
            key: None,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_backup_filename(mut self, backup_filename: impl Into<String>) -> Self {
        self.backup_filename = backup_filename.into();
        self
    }

    pub fn with_method(mut self, method: EncryptionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}
