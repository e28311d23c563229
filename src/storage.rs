//! File persistence for the document tree.
//!
//! [`FileStorage`] owns the database file and its sibling backup file.
//! Every write replaces the whole file, and the backup is refreshed from
//! the database file immediately before each mutation-triggered save, so
//! the backup always holds the pre-mutation state.

use crate::codec::Codec;
use crate::value::Map;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileStorage {
    file_path: PathBuf,
    backup_path: PathBuf,
}

impl FileStorage {
    /// Set up storage under `dir`, creating the directory if needed.
    pub fn new(dir: &Path, filename: &str, backup_filename: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            file_path: dir.join(filename),
            backup_path: dir.join(backup_filename),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Load the tree from the database file.
    ///
    /// A missing file is created holding the encoded empty tree; an empty
    /// file yields an empty tree. Filesystem and decode failures surface
    /// as-is, there are no retries.
    pub fn load(&self, codec: &Codec) -> Result<Map> {
        if !self.file_path.exists() {
            let encoded = codec.encode(&Map::new())?;
            fs::write(&self.file_path, encoded)?;
            tracing::debug!(path = %self.file_path.display(), "created empty database file");
            return Ok(Map::new());
        }

        let raw = fs::read_to_string(&self.file_path)?;
        let raw = raw.trim();
        if raw.is_empty() {
            tracing::debug!(path = %self.file_path.display(), "database file is empty");
            return Ok(Map::new());
        }
        codec.decode(raw)
    }

    /// Encode the tree and overwrite the database file with it.
    pub fn save(&self, codec: &Codec, tree: &Map) -> Result<()> {
        let encoded = codec.encode(tree)?;
        fs::write(&self.file_path, encoded)?;
        tracing::info!(path = %self.file_path.display(), "database saved");
        Ok(())
    }

    /// Copy the database file over the backup file.
    pub fn backup(&self) -> Result<()> {
        fs::copy(&self.file_path, &self.backup_path)?;
        tracing::info!(path = %self.backup_path.display(), "backup created");
        Ok(())
    }

    /// Copy the backup file over the database file.
    ///
    /// Fails with [`Error::BackupMissing`] when no backup exists.
    pub fn restore(&self) -> Result<()> {
        if !self.backup_path.exists() {
            tracing::warn!(path = %self.backup_path.display(), "no backup file found to restore");
            return Err(Error::BackupMissing);
        }
        fs::copy(&self.backup_path, &self.file_path)?;
        tracing::info!(path = %self.backup_path.display(), "database restored from backup");
        Ok(())
    }
}
