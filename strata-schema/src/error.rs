//! Error types for snapshot validation.

use miette::Diagnostic;
use thiserror::Error;

use crate::entity::EntityKind;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors raised while checking a snapshot against the running instance.
#[derive(Error, Debug, Diagnostic)]
pub enum SnapshotError {
    /// The snapshot uses a format version this build cannot read.
    #[error("Provided snapshot's format version {found} is not supported. Expected version {expected}")]
    #[diagnostic(code(strata::snapshot::unsupported_version))]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u32,
        /// Version this build produces.
        expected: u32,
    },

    /// The snapshot was produced by a different platform version.
    #[error(
        "Provided snapshot's platform version {snapshot} does not match the current instance's version {instance}. You can bypass this check by passing the force option"
    )]
    #[diagnostic(code(strata::snapshot::platform_mismatch), help("regenerate the snapshot or pass `force`"))]
    PlatformMismatch {
        /// Platform version recorded in the snapshot.
        snapshot: String,
        /// Platform version of the running instance.
        instance: String,
    },

    /// The snapshot was produced against another database vendor.
    #[error(
        "Provided snapshot's vendor {snapshot} does not match the current instance's vendor {instance}. You can bypass this check by passing the force option"
    )]
    #[diagnostic(code(strata::snapshot::vendor_mismatch), help("regenerate the snapshot or pass `force`"))]
    VendorMismatch {
        /// Vendor recorded in the snapshot.
        snapshot: String,
        /// Vendor of the running instance.
        instance: String,
    },

    /// Two entities of the same kind share an identity key.
    #[error("Provided snapshot contains {kind} \"{key}\" more than once")]
    #[diagnostic(code(strata::snapshot::duplicate))]
    Duplicate {
        /// Entity kind.
        kind: EntityKind,
        /// Rendered identity key.
        key: String,
    },

    /// An identity attribute is empty.
    #[error("Provided snapshot contains a {kind} at position {position} with an empty \"{attribute}\"")]
    #[diagnostic(code(strata::snapshot::empty_identifier))]
    EmptyIdentifier {
        /// Entity kind.
        kind: EntityKind,
        /// Index of the entity in its sequence.
        position: usize,
        /// Name of the empty attribute.
        attribute: &'static str,
    },

    /// Snapshot JSON could not be read.
    #[error("Provided snapshot is not valid: {0}")]
    #[diagnostic(code(strata::snapshot::serde))]
    Serde(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Whether passing `force` would have bypassed this error.
    pub fn is_forceable(&self) -> bool {
        matches!(self, Self::PlatformMismatch { .. } | Self::VendorMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SnapshotError::Duplicate {
            kind: EntityKind::Field,
            key: "articles.title".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Provided snapshot contains field \"articles.title\" more than once"
        );
    }

    #[test]
    fn test_is_forceable() {
        let mismatch = SnapshotError::PlatformMismatch {
            snapshot: "1.0.0".to_string(),
            instance: "1.1.0".to_string(),
        };
        assert!(mismatch.is_forceable());
        assert!(mismatch.to_string().contains("force"));

        let version = SnapshotError::UnsupportedVersion {
            found: 2,
            expected: 1,
        };
        assert!(!version.is_forceable());
    }
}
