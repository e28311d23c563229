//! The in-memory document tree and its path-addressed operations.
//!
//! A [`Store`] owns the whole database: the tree, the codec that encodes
//! it, the file storage that persists it, and the observer bus notified
//! on writes. Every mutating call backs up the database file and then
//! rewrites it in full, so operation cost is proportional to the size of
//! the entire database.

use crate::codec::{Codec, EncryptionMethod};
use crate::config::StoreConfig;
use crate::observer::{ObserverBus, ObserverHandle};
use crate::path::KeyPath;
use crate::search::{self, SearchOptions};
use crate::storage::FileStorage;
use crate::subcollection::Subcollection;
use crate::value::{deep_merge, Map, Value};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

pub struct Store {
    tree: Map,
    codec: Codec,
    storage: FileStorage,
    observers: ObserverBus,
}

impl Store {
    /// Open the database described by `config`.
    ///
    /// Creates the storage directory and an empty database file on first
    /// use. Fails with [`Error::Config`] when the `aes` method is chosen
    /// without a key, with [`Error::Io`] on filesystem failure, and with
    /// [`Error::Decode`] when the existing file cannot be decoded.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let codec = Codec::new(config.method, config.key)?;
        let storage = FileStorage::new(&config.dir, &config.filename, &config.backup_filename)?;
        let tree = storage.load(&codec)?;
        Ok(Self {
            tree,
            codec,
            storage,
            observers: ObserverBus::new(),
        })
    }

    /// Whether `path` resolves through present keys all the way down.
    pub fn exists(&self, path: &str) -> bool {
        resolve(&self.tree, &KeyPath::parse(path)).is_some()
    }

    /// The node at `path`, which may be a whole subtree.
    pub fn get(&self, path: &str) -> Result<&Value> {
        match resolve(&self.tree, &KeyPath::parse(path)) {
            Some(node) => Ok(node),
            None => {
                tracing::warn!(path, "key not found");
                Err(Error::NotFound(path.to_string()))
            }
        }
    }

    /// Insert a new document at `path`, creating intermediate maps for
    /// every segment except the last.
    ///
    /// Set never overwrites: an existing path fails with
    /// [`Error::AlreadyExists`] and the tree is left untouched. Use
    /// [`edit`](Store::edit) to change existing data.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let document = into_document(value)?;
        if self.exists(path) {
            tracing::warn!(path, "key already exists, refusing to overwrite");
            return Err(Error::AlreadyExists(path.to_string()));
        }

        let key_path = KeyPath::parse(path);
        let mut node = &mut self.tree;
        for segment in key_path.parents() {
            let child = node
                .entry(segment.clone())
                .or_insert_with(|| Value::Map(Map::new()));
            match child {
                Value::Map(map) => node = map,
                other => {
                    return Err(Error::Validation(format!(
                        "path segment '{segment}' holds a {}, not a map",
                        other.type_name()
                    )));
                }
            }
        }
        node.insert(key_path.leaf().to_string(), Value::Map(document));

        let stored = &node[key_path.leaf()];
        self.observers.notify("set", path, stored);
        self.persist()
    }

    /// Initialize `path` with an empty map.
    pub fn set_empty(&mut self, path: &str) -> Result<()> {
        self.set(path, Value::Map(Map::new()))
    }

    /// Modify the existing document at `path`.
    ///
    /// When the incoming map carries the key `increment`, its value names
    /// numeric fields of the target node and the deltas to add; the batch
    /// is applied all-or-nothing and nothing else in the incoming map is
    /// merged. Otherwise the incoming map deep-merges into an existing
    /// map node, or replaces a non-map node outright.
    pub fn edit(&mut self, path: &str, value: Value) -> Result<()> {
        if !self.exists(path) {
            tracing::warn!(path, "key not found, cannot edit");
            return Err(Error::NotFound(path.to_string()));
        }
        let incoming = into_document(value)?;
        let key_path = KeyPath::parse(path);

        if let Some(increments) = incoming.get("increment") {
            let Value::Map(increments) = increments else {
                return Err(Error::Validation(format!(
                    "increment payload must be a map, got {}",
                    increments.type_name()
                )));
            };
            let increments = increments.clone();
            let Some(target) = resolve_mut(&mut self.tree, &key_path) else {
                return Err(Error::NotFound(path.to_string()));
            };
            let Value::Map(fields) = target else {
                return Err(Error::Increment {
                    field: increments.keys().next().cloned().unwrap_or_default(),
                    reason: format!("target holds a {}, not a map", target.type_name()),
                });
            };
            apply_increments(fields, &increments)?;
        } else {
            let Some(target) = resolve_mut(&mut self.tree, &key_path) else {
                return Err(Error::NotFound(path.to_string()));
            };
            if let Value::Map(existing) = target {
                deep_merge(existing, incoming);
            } else {
                *target = Value::Map(incoming);
            }
        }

        self.persist()
    }

    /// Delete the node at `path`.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        let key_path = KeyPath::parse(path);
        let mut node = &mut self.tree;
        for segment in key_path.parents() {
            node = match node.get_mut(segment.as_str()) {
                Some(Value::Map(map)) => map,
                _ => {
                    tracing::warn!(path, "key not found, cannot remove");
                    return Err(Error::NotFound(path.to_string()));
                }
            };
        }
        if node.remove(key_path.leaf()).is_none() {
            tracing::warn!(path, "key not found, cannot remove");
            return Err(Error::NotFound(path.to_string()));
        }
        self.persist()
    }

    /// Snapshot of the whole tree.
    ///
    /// With `raw`, or under the `none` method, this is a plain clone.
    /// Otherwise the tree is round-tripped through the codec, the form
    /// external exporters consume.
    pub fn export(&self, raw: bool) -> Result<Map> {
        if raw || self.codec.method() == EncryptionMethod::None {
            return Ok(self.tree.clone());
        }
        self.codec.decode(&self.codec.encode(&self.tree)?)
    }

    /// Switch to a new encryption method and re-persist the database
    /// under it.
    ///
    /// Fails with [`Error::Config`] when switching to `aes` without a
    /// key, in which case the current codec stays in effect.
    pub fn migrate(&mut self, method: EncryptionMethod, key: Option<String>) -> Result<()> {
        self.codec = Codec::new(method, key)?;
        self.save()?;
        tracing::info!(method = %method, "database migrated to new encryption method");
        Ok(())
    }

    /// Encode the current tree and overwrite the database file.
    pub fn save(&self) -> Result<()> {
        self.storage.save(&self.codec, &self.tree)
    }

    /// Copy the backup file over the database file and reload from it.
    pub fn restore(&mut self) -> Result<()> {
        self.storage.restore()?;
        self.tree = self.storage.load(&self.codec)?;
        Ok(())
    }

    /// Path of the database file, for external upload collaborators.
    pub fn file_path(&self) -> &Path {
        self.storage.file_path()
    }

    pub fn backup_path(&self) -> &Path {
        self.storage.backup_path()
    }

    /// Register `callback` to fire after every `set` whose path starts
    /// with `prefix`.
    pub fn subscribe<F>(&mut self, prefix: impl Into<String>, callback: F) -> ObserverHandle
    where
        F: FnMut(&str, &str, &Value) + 'static,
    {
        self.observers.subscribe(prefix, callback)
    }

    pub fn unsubscribe(&mut self, prefix: &str, handle: ObserverHandle) -> bool {
        self.observers.unsubscribe(prefix, handle)
    }

    /// Search the tree, or the subtree under `key`, for `needle`.
    pub fn search(
        &self,
        needle: &Value,
        key: Option<&str>,
        options: SearchOptions,
    ) -> BTreeMap<String, Value> {
        search::search(&self.tree, needle, key, options)
    }

    /// A handle addressing the two-level collection named `name`.
    pub fn subcollection(&mut self, name: impl Into<String>) -> Subcollection<'_> {
        Subcollection::new(self, name.into())
    }

    pub(crate) fn top_level(&self, key: &str) -> Option<&Value> {
        self.tree.get(key)
    }

    pub(crate) fn ensure_top_level(&mut self, key: &str) {
        self.tree
            .entry(key.to_string())
            .or_insert_with(|| Value::Map(Map::new()));
    }

    fn persist(&self) -> Result<()> {
        self.storage.backup()?;
        self.storage.save(&self.codec, &self.tree)
    }
}

/// Every stored document must be a map.
///
/// Key stringness and one-value-per-key consistency are structural
/// properties of [`Map`] itself, so this is the whole validation step.
fn into_document(value: Value) -> Result<Map> {
    match value {
        Value::Map(map) => Ok(map),
        other => {
            tracing::warn!(kind = other.type_name(), "document must be a map");
            Err(Error::Validation(format!(
                "document must be a map, got {}",
                other.type_name()
            )))
        }
    }
}

fn resolve<'a>(root: &'a Map, key_path: &KeyPath) -> Option<&'a Value> {
    let (first, rest) = key_path.segments().split_first()?;
    let mut node = root.get(first.as_str())?;
    for segment in rest {
        node = match node {
            Value::Map(map) => map.get(segment.as_str())?,
            _ => return None,
        };
    }
    Some(node)
}

fn resolve_mut<'a>(root: &'a mut Map, key_path: &KeyPath) -> Option<&'a mut Value> {
    let (first, rest) = key_path.segments().split_first()?;
    let mut node = root.get_mut(first.as_str())?;
    for segment in rest {
        node = match node {
            Value::Map(map) => map.get_mut(segment.as_str())?,
            _ => return None,
        };
    }
    Some(node)
}

// Every delta is validated and staged before any field is written, so a
// failing batch leaves the target untouched.
fn apply_increments(target: &mut Map, increments: &Map) -> Result<()> {
    let mut staged = Vec::with_capacity(increments.len());
    for (field, delta) in increments {
        let Some(current) = target.get(field) else {
            return Err(Error::Increment {
                field: field.clone(),
                reason: "field does not exist".to_string(),
            });
        };
        let next = match (current, delta) {
            (Value::Int(current), Value::Int(delta)) => {
                let sum = current.checked_add(*delta).ok_or_else(|| Error::Increment {
                    field: field.clone(),
                    reason: "integer overflow".to_string(),
                })?;
                Value::Int(sum)
            }
            (Value::Int(current), Value::Float(delta)) => Value::Float(*current as f64 + delta),
            (Value::Float(current), Value::Int(delta)) => Value::Float(current + *delta as f64),
            (Value::Float(current), Value::Float(delta)) => Value::Float(current + delta),
            (Value::Int(_) | Value::Float(_), delta) => {
                return Err(Error::Increment {
                    field: field.clone(),
                    reason: format!("increment value is {}, not a number", delta.type_name()),
                });
            }
            (current, _) => {
                return Err(Error::Increment {
                    field: field.clone(),
                    reason: format!("field holds a {}, cannot increment", current.type_name()),
                });
            }
        };
        staged.push((field.clone(), next));
    }
    for (field, next) in staged {
        target.insert(field, next);
    }
    Ok(())
}
