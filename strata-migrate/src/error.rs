//! Error types for the diff and apply engine.

use strata_schema::{EntityKind, SnapshotError};
use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors surfaced to callers of the schema service.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Caller lacks admin privilege.
    #[error("You don't have permission to access this")]
    Forbidden,

    /// Malformed or semantically invalid diff, patch or snapshot.
    #[error("Invalid payload. {reason}")]
    InvalidPayload {
        /// Human-readable explanation.
        reason: String,
    },

    /// A collaborator failed. The original message is logged, not returned.
    #[error("An unexpected error occurred")]
    InternalServerError,
}

impl MigrationError {
    /// Create an invalid payload error.
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidPayload { .. } => "INVALID_PAYLOAD",
            Self::InternalServerError => "INTERNAL",
        }
    }

    /// HTTP-equivalent status for transports that need one.
    pub fn status(&self) -> u16 {
        match self {
            Self::Forbidden => 403,
            Self::InvalidPayload { .. } => 400,
            Self::InternalServerError => 500,
        }
    }

    /// The reason of an invalid payload error.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::InvalidPayload { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<SnapshotError> for MigrationError {
    fn from(err: SnapshotError) -> Self {
        Self::invalid_payload(err.to_string())
    }
}

/// Errors raised while applying change records to JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The path does not lead to an existing value.
    #[error("path `{path}` does not exist")]
    PathNotFound {
        /// Rendered path.
        path: String,
    },

    /// An array record targets something that is not an array.
    #[error("path `{path}` is not an array")]
    NotAnArray {
        /// Rendered path.
        path: String,
    },

    /// An array record targets an index past the end of the array.
    #[error("index {index} is out of bounds at `{path}` (length {len})")]
    IndexOutOfBounds {
        /// Rendered path.
        path: String,
        /// Requested index.
        index: usize,
        /// Array length.
        len: usize,
    },
}

/// Errors raised by the in-memory snapshot applier.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// A create targets an entity that already exists.
    #[error("cannot create {kind} \"{key}\": it already exists")]
    AlreadyExists {
        /// Entity kind.
        kind: EntityKind,
        /// Rendered identity.
        key: String,
    },

    /// An update or delete targets a missing entity.
    #[error("cannot change {kind} \"{key}\": it does not exist")]
    NotFound {
        /// Entity kind.
        kind: EntityKind,
        /// Rendered identity.
        key: String,
    },

    /// The resulting document is not a valid entity.
    #[error("{kind} \"{key}\" is not a valid descriptor after applying changes: {source}")]
    InvalidDocument {
        /// Entity kind.
        kind: EntityKind,
        /// Rendered identity.
        key: String,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The resulting document names another entity than the entry.
    #[error("{kind} \"{key}\" would be stored as \"{found}\": a diff cannot change an identity")]
    IdentityMismatch {
        /// Entity kind.
        kind: EntityKind,
        /// Identity named by the entry.
        key: String,
        /// Identity of the resulting document.
        found: String,
    },

    /// A change record could not be applied.
    #[error("cannot change {kind} \"{key}\": {source}")]
    Patch {
        /// Entity kind.
        kind: EntityKind,
        /// Rendered identity.
        key: String,
        /// Underlying failure.
        #[source]
        source: PatchError,
    },
}
