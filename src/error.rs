//! Error types for schema compatibility and resolution

use thiserror::Error;

/// Errors that can occur during schema operations
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reader schema cannot read data written with the writer schema
    #[error("incompatible schemas: {0}")]
    Incompatible(String),
    /// Resolution failed after a passing compatibility check
    #[error("resolution error: {0}")]
    Resolution(String),
    /// A `Ref` names a schema not defined in its tree
    #[error("unresolved named type reference: '{0}'")]
    UnresolvedRef(String),
}

impl SchemaError {
    /// The reason string carried by this error.
    pub fn reason(&self) -> &str {
        match self {
            SchemaError::Incompatible(r) | SchemaError::Resolution(r) => r,
            SchemaError::UnresolvedRef(r) => r,
        }
    }
}
