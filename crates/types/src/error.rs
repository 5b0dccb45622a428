//! Error types for parsing pipeline values

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Malformed cut id: {0}")]
    MalformedCutId(String),
}
