//! Persistent key/value store
//!
//! `FileStore` persists JSON-encoded values, one file per key, in an
//! XDG-compliant data directory. `Settings` layers the typed keys used by the
//! rest of the crate on top of it (selected region/city, accessibility filter,
//! installation code, route selection and the route/station caches).
//!
//! Unreadable or corrupted values are reported as missing, never as errors.

mod file_store;
mod settings;

pub use file_store::FileStore;
pub use settings::{keys, Settings};

use thiserror::Error;

/// Errors that can occur when writing to the store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creating the directory or writing the file failed
    #[error("Failed to access store: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be serialized
    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
