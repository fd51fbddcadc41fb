//! Error types for the scorecard engine.
//!
//! Store implementations report `StoreError`; the calculators wrap it into
//! `EvalError::DataAccess` with a message naming what they were doing.

use thiserror::Error;

/// Failure raised by a `ReferenceStore` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not answer the query
    #[error("reference store unavailable: {0}")]
    Unavailable(String),

    /// A record was rejected on insert or delete
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

#[derive(Error, Debug)]
pub enum EvalError {
    /// Underlying store query failed
    #[error("data access error while {context}: {source}")]
    DataAccess {
        context: String,
        #[source]
        source: StoreError,
    },

    /// Referenced id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    pub fn not_found(kind: &'static str, id: u32) -> Self {
        EvalError::NotFound { kind, id }
    }
}

/// Attach a component-specific message to a store result.
pub trait ResultExt<T> {
    fn context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for std::result::Result<T, StoreError> {
    fn context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| EvalError::DataAccess {
            context: f().into(),
            source,
        })
    }
}
