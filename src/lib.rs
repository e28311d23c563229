//!
//! Stashdb: an embedded, file-backed JSON document store.
//! One process opens one JSON file as its entire database, holds it in
//! memory as a nested key-value tree, and rewrites the whole file after
//! every mutation.
//!
//! ## Core Concepts
//!
//! * **Values (`value::Value`)**: The tagged value union making up the document tree, with `value::Map` as its mapping node.
//! * **Key Paths (`path::KeyPath`)**: Slash-delimited addresses resolving to a node at any depth of the tree.
//! * **Store (`store::Store`)**: The main database struct; path-addressed `exists`/`get`/`set`/`edit`/`remove` plus export, migration, and restore.
//! * **Codec (`codec::Codec`)**: The on-disk encoding layer, selectable between plain JSON, base64, and AES-256-CBC under a password-derived key.
//! * **Storage (`storage::FileStorage`)**: The database file and its sibling backup file; the backup is refreshed before every write.
//! * **Observers (`observer::ObserverBus`)**: Callbacks registered against key-path prefixes, fired synchronously after each successful `set`.
//! * **Search (`search`)**: A linear recursive value scan over the tree with substring and case-sensitivity options.
//! * **Subcollections (`subcollection::Subcollection`)**: A two-level `collection/item` addressing convenience over the store.

pub mod codec;
pub mod config;
pub mod observer;
pub mod path;
pub mod search;
pub mod storage;
pub mod store;
pub mod subcollection;
pub mod value;

/// Re-export the main types for easier access.
pub use codec::{Codec, EncryptionMethod};
pub use config::StoreConfig;
pub use observer::ObserverHandle;
pub use search::SearchOptions;
pub use store::Store;
pub use subcollection::Subcollection;
pub use value::{Map, Value};

/// Result type used throughout the stashdb library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the stashdb library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// The supplied document is not a mapping, or a path segment that
    /// must be a mapping holds something else
    #[error("Invalid document: {0}")]
    Validation(String),

    /// An increment batch referenced a missing or non-numeric field; the
    /// whole edit is aborted
    #[error("Cannot increment '{field}': {reason}")]
    Increment { field: String, reason: String },

    /// The on-disk payload could not be decoded, including decryption
    /// with a wrong key
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid encryption configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No backup file found to restore")]
    BackupMissing,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
