//! Reconciliation error types.

use std::fmt;

use thiserror::Error;

use crate::resource::{ObjectKind, ResourceKind};
use crate::store::StoreError;

/// Remote operation that was being attempted when a store error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookup,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Lookup => "look up",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Errors that abort a reconciliation.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced object could not be found.
    #[error("{kind}: {target} `{value}' given for '{field}' was not found")]
    ReferenceNotFound {
        kind: ResourceKind,
        field: &'static str,
        target: ObjectKind,
        value: String,
    },

    /// A field needed to create the resource was not supplied.
    #[error("parameter '{field}' is required to create a {kind}")]
    MissingRequiredField {
        kind: ResourceKind,
        field: &'static str,
    },

    /// The desired state names an unknown field or has a malformed value.
    #[error("invalid parameter '{field}' for {kind}: {reason}")]
    InvalidParameter {
        kind: ResourceKind,
        field: String,
        reason: String,
    },

    /// The remote store failed.
    #[error("failed to {operation} {kind}: {source}")]
    RemoteStore {
        kind: ObjectKind,
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl Error {
    pub(crate) fn remote(kind: ObjectKind, operation: Operation) -> impl FnOnce(StoreError) -> Self {
        move |source| Error::RemoteStore {
            kind,
            operation,
            source,
        }
    }

    pub(crate) fn invalid(kind: ResourceKind, field: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            kind,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, Error>;
