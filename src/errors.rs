// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::store::StoreError;
use crate::types::EntityKind;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} already exists: {id}")]
    Exists { kind: EntityKind, id: String },

    #[error("Cyclic dependency: {0}")]
    CyclicDependency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Plan file error: {0}")]
    Config(String),

    /// Persistence failure, forwarded unchanged.
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GraphError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn exists(kind: EntityKind, id: impl Into<String>) -> Self {
        GraphError::Exists {
            kind,
            id: id.into(),
        }
    }
}

impl From<StoreError> for GraphError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => GraphError::NotFound { kind, id },
            other => GraphError::Store(other),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GraphError>;
