//! Two-level `collection/item` addressing over the store.

use crate::store::Store;
use crate::value::{Map, Value};
use crate::Result;

/// A handle scoping store operations to one top-level collection.
///
/// Operations delegate to the [`Store`] with the path
/// `collection/item`, so they carry the same validation, persistence,
/// and notification behavior as the generic key-path operations. Setting
/// or editing through the handle creates a missing collection as an
/// empty map first.
pub struct Subcollection<'a> {
    store: &'a mut Store,
    name: String,
}

impl<'a> Subcollection<'a> {
    pub(crate) fn new(store: &'a mut Store, name: String) -> Self {
        Self { store, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn item_path(&self, item: &str) -> String {
        format!("{}/{}", self.name, item)
    }

    /// The item named `item`, or [`Error::NotFound`](crate::Error::NotFound)
    /// when it is absent.
    pub fn get(&self, item: &str) -> Result<&Value> {
        self.store.get(&self.item_path(item))
    }

    /// The whole collection, or an empty map when it does not exist yet.
    pub fn get_all(&self) -> Map {
        match self.store.top_level(&self.name) {
            Some(Value::Map(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    pub fn set(&mut self, item: &str, value: Value) -> Result<()> {
        self.store.ensure_top_level(&self.name);
        self.store.set(&self.item_path(item), value)
    }

    pub fn edit(&mut self, item: &str, value: Value) -> Result<()> {
        self.store.ensure_top_level(&self.name);
        self.store.edit(&self.item_path(item), value)
    }

    /// Remove one item, or the entire collection when `item` is `None`.
    pub fn remove(&mut self, item: Option<&str>) -> Result<()> {
        match item {
            Some(item) => self.store.remove(&self.item_path(item)),
            None => self.store.remove(&self.name),
        }
    }
}
