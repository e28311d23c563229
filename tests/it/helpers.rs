use stashdb::{EncryptionMethod, Map, Store, StoreConfig, Value};
use tempfile::TempDir;

/// Creates a store with no encryption in a fresh temporary directory.
///
/// The TempDir is returned alongside the store because the directory is
/// deleted when it is dropped.
pub fn setup_store() -> (TempDir, Store) {
    setup_store_with_method(EncryptionMethod::None, None)
}

/// Creates a store using the given encryption method and key.
pub fn setup_store_with_method(method: EncryptionMethod, key: Option<&str>) -> (TempDir, Store) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = open_in(&dir, method, key);
    (dir, store)
}

/// Opens a store over an existing directory, e.g. to reopen a database
/// written by an earlier store instance.
pub fn open_in(dir: &TempDir, method: EncryptionMethod, key: Option<&str>) -> Store {
    let mut config = StoreConfig::new().with_dir(dir.path()).with_method(method);
    if let Some(key) = key {
        config = config.with_key(key);
    }
    Store::open(config).expect("Failed to open store")
}

/// Builds a map value from the given entries.
pub fn map_of(entries: &[(&str, Value)]) -> Value {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert((*key).to_string(), value.clone());
    }
    Value::Map(map)
}

/// A typical user document for tests.
pub fn user(name: &str, age: i64) -> Value {
    map_of(&[("name", Value::from(name)), ("age", Value::from(age))])
}

/// Builds an increment edit payload: `{"increment": {field: delta, ...}}`.
pub fn increment(deltas: &[(&str, Value)]) -> Value {
    map_of(&[("increment", map_of(deltas))])
}
