//! Structural validation of raw diff and patch payloads.
//!
//! Runs before deserialization so that a malformed payload is reported with
//! the location of the first violation, e.g.
//! `"diff.fields[0].diff[1].kind" must be one of [N, E, D, A]`.

use serde_json::{Map, Value};

use crate::change::DiffKind;
use crate::error::{MigrateResult, MigrationError};

/// Shape of one entry sequence of a diff.
struct EntrySchema {
    name: &'static str,
    identity: &'static [&'static str],
    nullable: &'static [&'static str],
}

const ENTRY_SCHEMAS: [EntrySchema; 3] = [
    EntrySchema {
        name: "collections",
        identity: &["collection"],
        nullable: &[],
    },
    EntrySchema {
        name: "fields",
        identity: &["collection", "field"],
        nullable: &[],
    },
    EntrySchema {
        name: "relations",
        identity: &["collection", "field"],
        nullable: &["related_collection"],
    },
];

const CHANGE_KEYS: [&str; 6] = ["kind", "path", "lhs", "rhs", "index", "item"];

/// Validate a `{hash, diff}` payload.
pub fn validate_diff_with_hash(value: &Value) -> MigrateResult<()> {
    let map = object(value, "value")?;

    match map.get("hash") {
        None => return Err(fail("hash", "is required")),
        Some(Value::String(hash)) if hash.is_empty() => {
            return Err(fail("hash", "is not allowed to be empty"));
        }
        Some(Value::String(_)) => {}
        Some(_) => return Err(fail("hash", "must be a string")),
    }

    let diff = map.get("diff").ok_or_else(|| fail("diff", "is required"))?;
    validate_diff(diff, "diff")?;

    reject_unknown(map, "", &["hash", "diff"])
}

/// Validate a bare diff (or patch) object labelled `label`.
pub fn validate_diff(value: &Value, label: &str) -> MigrateResult<()> {
    let map = object(value, label)?;

    for schema in &ENTRY_SCHEMAS {
        let entries_label = child(label, schema.name);
        let entries = map
            .get(schema.name)
            .ok_or_else(|| fail(&entries_label, "is required"))?;
        let Value::Array(entries) = entries else {
            return Err(fail(&entries_label, "must be an array"));
        };
        for (position, entry) in entries.iter().enumerate() {
            validate_entry(entry, &format!("{entries_label}[{position}]"), schema)?;
        }
    }

    let known: Vec<&str> = ENTRY_SCHEMAS.iter().map(|s| s.name).collect();
    reject_unknown(map, label, &known)
}

fn validate_entry(value: &Value, label: &str, schema: &EntrySchema) -> MigrateResult<()> {
    let map = object(value, label)?;

    for key in schema.identity {
        let key_label = child(label, key);
        match map.get(*key) {
            None => return Err(fail(&key_label, "is required")),
            Some(Value::String(s)) if s.is_empty() => {
                return Err(fail(&key_label, "is not allowed to be empty"));
            }
            Some(Value::String(_)) => {}
            Some(_) => return Err(fail(&key_label, "must be a string")),
        }
    }

    for key in schema.nullable {
        match map.get(*key) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => return Err(fail(&child(label, key), "must be a string")),
        }
    }

    let diff_label = child(label, "diff");
    let changes = map.get("diff").ok_or_else(|| fail(&diff_label, "is required"))?;
    let Value::Array(changes) = changes else {
        return Err(fail(&diff_label, "must be an array"));
    };
    if changes.is_empty() {
        return Err(fail(&diff_label, "must contain at least 1 items"));
    }
    for (position, change) in changes.iter().enumerate() {
        validate_change(change, &format!("{diff_label}[{position}]"))?;
    }

    let mut known: Vec<&str> = schema.identity.to_vec();
    known.extend_from_slice(schema.nullable);
    known.push("diff");
    reject_unknown(map, label, &known)?;

    for (position, change) in changes.iter().enumerate() {
        validate_created_identity(change, map, &format!("{diff_label}[{position}]"), schema)?;
    }
    Ok(())
}

fn validate_change(value: &Value, label: &str) -> MigrateResult<()> {
    let map = object(value, label)?;

    let kind_label = child(label, "kind");
    let kind = match map.get("kind") {
        None => return Err(fail(&kind_label, "is required")),
        Some(kind) => kind
            .as_str()
            .and_then(DiffKind::from_code)
            .ok_or_else(|| fail(&kind_label, "must be one of [N, E, D, A]"))?,
    };

    if let Some(path) = map.get("path") {
        let path_label = child(label, "path");
        let Value::Array(segments) = path else {
            return Err(fail(&path_label, "must be an array"));
        };
        for (position, segment) in segments.iter().enumerate() {
            if !(segment.is_string() || segment.is_u64()) {
                return Err(fail(
                    &format!("{path_label}[{position}]"),
                    "must be a string or a non-negative integer",
                ));
            }
        }
    }

    if !matches!(kind, DiffKind::New | DiffKind::Array) && !map.contains_key("lhs") {
        return Err(fail(&child(label, "lhs"), "is required"));
    }
    if !matches!(kind, DiffKind::Delete | DiffKind::Array) && !map.contains_key("rhs") {
        return Err(fail(&child(label, "rhs"), "is required"));
    }

    let index_label = child(label, "index");
    match map.get("index") {
        Some(index) if !index.is_u64() => {
            return Err(fail(&index_label, "must be a non-negative integer"));
        }
        None if kind == DiffKind::Array => return Err(fail(&index_label, "is required")),
        _ => {}
    }

    let item_label = child(label, "item");
    match map.get("item") {
        Some(item) => validate_change(item, &item_label)?,
        None if kind == DiffKind::Array => return Err(fail(&item_label, "is required")),
        None => {}
    }

    reject_unknown(map, label, &CHANGE_KEYS)
}

/// A root-level `N` record must describe the entity its entry names.
fn validate_created_identity(
    change: &Value,
    entry: &Map<String, Value>,
    label: &str,
    schema: &EntrySchema,
) -> MigrateResult<()> {
    let is_root = change
        .get("path")
        .and_then(Value::as_array)
        .is_none_or(Vec::is_empty);
    if change.get("kind").and_then(Value::as_str) != Some(DiffKind::New.code()) || !is_root {
        return Ok(());
    }

    let rhs_label = child(label, "rhs");
    let rhs = object(&change["rhs"], &rhs_label)?;
    for key in schema.identity {
        if rhs.get(*key) != entry.get(*key) {
            return Err(fail(&child(&rhs_label, key), "must match the identity of the entry"));
        }
    }
    Ok(())
}

fn object<'a>(value: &'a Value, label: &str) -> MigrateResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| fail(label, "must be of type object"))
}

fn reject_unknown(map: &Map<String, Value>, label: &str, known: &[&str]) -> MigrateResult<()> {
    match map.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => Err(fail(&child(label, key), "is not allowed")),
        None => Ok(()),
    }
}

fn child(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn fail(label: &str, message: &str) -> MigrationError {
    MigrationError::invalid_payload(format!("\"{label}\" {message}"))
}
