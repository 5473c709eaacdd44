//! Recursive comparison of JSON documents and application of change records.

use serde_json::Value;

use crate::change::{Change, PathSegment, render_path};
use crate::error::PatchError;

/// Compute the change records turning `lhs` into `rhs`.
///
/// Objects are walked key by key: keys of `lhs` first (removed keys yield
/// `D`, shared keys are recursed into), then keys only present in `rhs`
/// (yielding `N`). Arrays are compared element-wise over their common
/// prefix. Surplus `lhs` elements yield `A`/`D` records from the highest
/// index down and surplus `rhs` elements yield `A`/`N` records from the
/// lowest index up, so applying the records in order is always valid. Any
/// other inequality is an `E` record at the current path.
pub fn deep_diff(lhs: &Value, rhs: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    walk(&mut Vec::new(), lhs, rhs, &mut changes);
    changes
}

fn walk(path: &mut Vec<PathSegment>, lhs: &Value, rhs: &Value, out: &mut Vec<Change>) {
    match (lhs, rhs) {
        (Value::Object(left), Value::Object(right)) => {
            for (key, old) in left {
                path.push(PathSegment::Key(key.clone()));
                match right.get(key) {
                    Some(new) => walk(path, old, new, out),
                    None => out.push(Change::Delete {
                        path: path.clone(),
                        lhs: old.clone(),
                    }),
                }
                path.pop();
            }
            for (key, new) in right {
                if !left.contains_key(key) {
                    let mut at = path.clone();
                    at.push(PathSegment::Key(key.clone()));
                    out.push(Change::New {
                        path: at,
                        rhs: new.clone(),
                    });
                }
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            let common = left.len().min(right.len());
            for index in 0..common {
                path.push(PathSegment::Index(index));
                walk(path, &left[index], &right[index], out);
                path.pop();
            }
            for index in (common..left.len()).rev() {
                out.push(Change::Array {
                    path: path.clone(),
                    index,
                    item: Box::new(Change::deleted(left[index].clone())),
                });
            }
            for (index, new) in right.iter().enumerate().skip(common) {
                out.push(Change::Array {
                    path: path.clone(),
                    index,
                    item: Box::new(Change::created(new.clone())),
                });
            }
        }
        _ if lhs == rhs => {}
        _ => out.push(Change::Edit {
            path: path.clone(),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }),
    }
}

/// Apply one change record to a document in place.
pub fn apply_change(target: &mut Value, change: &Change) -> Result<(), PatchError> {
    match change {
        Change::New { path, rhs } | Change::Edit { path, rhs, .. } => {
            set_at(target, path, rhs.clone())
        }
        Change::Delete { path, .. } => remove_at(target, path),
        Change::Array { path, index, item } => {
            let Value::Array(items) = navigate_mut(target, path)? else {
                return Err(PatchError::NotAnArray {
                    path: render_path(path),
                });
            };
            let len = items.len();
            let out_of_bounds = || PatchError::IndexOutOfBounds {
                path: render_path(path),
                index: *index,
                len,
            };
            match item.as_ref() {
                Change::New { rhs, .. } | Change::Edit { rhs, .. } => {
                    if *index < len {
                        items[*index] = rhs.clone();
                    } else if *index == len {
                        items.push(rhs.clone());
                    } else {
                        return Err(out_of_bounds());
                    }
                }
                Change::Delete { .. } => {
                    if *index >= len {
                        return Err(out_of_bounds());
                    }
                    items.remove(*index);
                }
                nested @ Change::Array { .. } => {
                    let element = items.get_mut(*index).ok_or_else(out_of_bounds)?;
                    apply_change(element, nested)?;
                }
            }
            Ok(())
        }
    }
}

/// Apply a sequence of change records in order.
pub fn apply_changes<'a>(
    target: &mut Value,
    changes: impl IntoIterator<Item = &'a Change>,
) -> Result<(), PatchError> {
    for change in changes {
        apply_change(target, change)?;
    }
    Ok(())
}

fn navigate_mut<'a>(root: &'a mut Value, path: &[PathSegment]) -> Result<&'a mut Value, PatchError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let next = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key),
            (PathSegment::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        };
        current = next.ok_or_else(|| PatchError::PathNotFound {
            path: render_path(&path[..=depth]),
        })?;
    }
    Ok(current)
}

fn set_at(root: &mut Value, path: &[PathSegment], value: Value) -> Result<(), PatchError> {
    let Some((last, parent_path)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    match (last, navigate_mut(root, parent_path)?) {
        (PathSegment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            let len = items.len();
            if *index < len {
                items[*index] = value;
            } else if *index == len {
                items.push(value);
            } else {
                return Err(PatchError::IndexOutOfBounds {
                    path: render_path(parent_path),
                    index: *index,
                    len,
                });
            }
            Ok(())
        }
        _ => Err(PatchError::PathNotFound {
            path: render_path(path),
        }),
    }
}

fn remove_at(root: &mut Value, path: &[PathSegment]) -> Result<(), PatchError> {
    let Some((last, parent_path)) = path.split_last() else {
        *root = Value::Null;
        return Ok(());
    };
    let not_found = || PatchError::PathNotFound {
        path: render_path(path),
    };
    match (last, navigate_mut(root, parent_path)?) {
        (PathSegment::Key(key), Value::Object(map)) => {
            map.remove(key).map(drop).ok_or_else(not_found)
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            let len = items.len();
            if *index >= len {
                return Err(PatchError::IndexOutOfBounds {
                    path: render_path(parent_path),
                    index: *index,
                    len,
                });
            }
            items.remove(*index);
            Ok(())
        }
        _ => Err(not_found()),
    }
}
