//! Core type definitions for panelsync.
//!
//! This crate defines the data shared by every panelsync component:
//! - `Value`: a single control value (switch or number)
//! - `VariableSet`: the named mapping of control values mirrored between peers
//! - `ControlSchema`: the fixed key set and value kinds a set must match
//! - `Payload` / `FramePayload`: the typed unions used at the transport edge
//!
//! Nothing here does I/O or scheduling; the sync engine lives in `panelsync-sync`.

mod payload;
mod schema;
mod value;
mod variables;

pub use payload::{FramePayload, Payload};
pub use schema::ControlSchema;
pub use value::{Value, ValueKind};
pub use variables::VariableSet;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown variable: {0}")]
    UnknownKey(String),

    #[error("missing variable: {0}")]
    MissingKey(String),

    #[error("variable {key} expects a {expected} value")]
    KindMismatch { key: String, expected: ValueKind },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}
