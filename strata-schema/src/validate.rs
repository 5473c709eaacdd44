//! Compatibility checks for snapshots supplied by callers.

use std::collections::HashSet;

use tracing::debug;

use crate::entity::{Collection, EntityKind, Field, Relation, SchemaEntity};
use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{DatabaseVendor, SNAPSHOT_VERSION, Snapshot};

/// Identity of the running instance a snapshot is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Platform version of the running instance.
    pub platform: String,
    /// Database vendor of the running instance.
    pub vendor: Option<DatabaseVendor>,
}

impl InstanceInfo {
    /// Create instance info for a platform version.
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            vendor: None,
        }
    }

    /// Set the database vendor.
    pub fn with_vendor(mut self, vendor: DatabaseVendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Create an empty snapshot stamped with this instance's identity.
    pub fn empty_snapshot(&self) -> Snapshot {
        Snapshot {
            vendor: self.vendor,
            ..Snapshot::new(&self.platform)
        }
    }
}

impl Default for InstanceInfo {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

/// Check that a snapshot can be diffed against this instance.
///
/// `force` relaxes the platform and vendor checks only. The format version
/// and identity-key uniqueness are always enforced.
pub fn validate_snapshot(
    snapshot: &Snapshot,
    instance: &InstanceInfo,
    force: bool,
) -> SnapshotResult<()> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    if !force {
        if snapshot.platform != instance.platform {
            return Err(SnapshotError::PlatformMismatch {
                snapshot: snapshot.platform.clone(),
                instance: instance.platform.clone(),
            });
        }

        if let (Some(theirs), Some(ours)) = (snapshot.vendor, instance.vendor) {
            if theirs != ours {
                return Err(SnapshotError::VendorMismatch {
                    snapshot: theirs.to_string(),
                    instance: ours.to_string(),
                });
            }
        }
    } else if snapshot.platform != instance.platform || snapshot.vendor != instance.vendor {
        debug!(
            snapshot_platform = %snapshot.platform,
            instance_platform = %instance.platform,
            "accepting snapshot from another instance"
        );
    }

    for (position, collection) in snapshot.collections.iter().enumerate() {
        require_identifier(EntityKind::Collection, position, "collection", &collection.collection)?;
    }
    for (position, field) in snapshot.fields.iter().enumerate() {
        require_identifier(EntityKind::Field, position, "collection", &field.collection)?;
        require_identifier(EntityKind::Field, position, "field", &field.field)?;
    }
    for (position, relation) in snapshot.relations.iter().enumerate() {
        require_identifier(EntityKind::Relation, position, "collection", &relation.collection)?;
        require_identifier(EntityKind::Relation, position, "field", &relation.field)?;
    }

    ensure_unique::<Collection>(snapshot)?;
    ensure_unique::<Field>(snapshot)?;
    ensure_unique::<Relation>(snapshot)?;

    Ok(())
}

fn require_identifier(
    kind: EntityKind,
    position: usize,
    attribute: &'static str,
    value: &str,
) -> SnapshotResult<()> {
    if value.is_empty() {
        return Err(SnapshotError::EmptyIdentifier {
            kind,
            position,
            attribute,
        });
    }
    Ok(())
}

fn ensure_unique<E: SchemaEntity>(snapshot: &Snapshot) -> SnapshotResult<()> {
    let mut seen = HashSet::new();
    for entity in E::of(snapshot) {
        let key = entity.key();
        if !seen.insert(key.clone()) {
            return Err(SnapshotError::Duplicate {
                kind: E::KIND,
                key: key.to_string(),
            });
        }
    }
    Ok(())
}
