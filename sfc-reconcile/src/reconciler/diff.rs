//! Field comparison and payload construction.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::resource::Descriptor;
use crate::state::{DesiredState, Object, Resolution, ResolvedDeps, string_list};

/// Scalar equality that tolerates `"1"` vs `1` and `"true"` vs `true`.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.trim() == n.to_string()
        }
        (Value::String(s), Value::Bool(v)) | (Value::Bool(v), Value::String(s)) => {
            s.trim().eq_ignore_ascii_case(if *v { "true" } else { "false" })
        }
        _ => false,
    }
}

/// The value to send for a supplied field: resolved ID(s) for references,
/// the raw value otherwise. `None` when the reference did not resolve.
fn effective_value(field: &str, value: &Value, resolved: &ResolvedDeps) -> Option<Value> {
    match resolved.get(field) {
        Some(resolution) => resolution.to_value(),
        None => Some(value.clone()),
    }
}

fn unresolved(descriptor: &Descriptor, field: &'static str, value: &Value) -> Error {
    let shown = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match descriptor.reference(field) {
        Some(reference) => Error::ReferenceNotFound {
            kind: descriptor.kind,
            field,
            target: reference.target,
            value: shown,
        },
        None => Error::invalid(descriptor.kind, field, "value could not be resolved"),
    }
}

fn id_set<'a, I: IntoIterator<Item = &'a str>>(ids: I) -> BTreeSet<&'a str> {
    ids.into_iter().collect()
}

/// Fields whose desired value differs from the current object.
///
/// Only fields the caller supplied are compared; the name never is. An
/// unresolved reference always counts as a difference.
pub(crate) fn differing_fields(
    descriptor: &Descriptor,
    desired: &DesiredState,
    resolved: &ResolvedDeps,
    current: &Object,
) -> Vec<&'static str> {
    let mut differing = Vec::new();

    for &field in descriptor.scalar_fields {
        let Some(value) = desired.get(field) else {
            continue;
        };
        let live = current.get(field).unwrap_or(&Value::Null);
        let same = match effective_value(field, value, resolved) {
            Some(wanted) => scalar_eq(&wanted, live),
            None => false,
        };
        if !same {
            differing.push(field);
        }
    }

    for &field in descriptor.dict_fields {
        if let Some(value) = desired.get(field) {
            if current.get(field) != Some(value) {
                differing.push(field);
            }
        }
    }

    for &field in descriptor.list_ref_fields {
        if desired.is_blank(field) {
            continue;
        }
        let live = id_set(current.get(field).and_then(string_list).unwrap_or_default());
        let same = match resolved.get(field) {
            Some(Resolution::Ids(ids)) => id_set(ids.iter().map(String::as_str)) == live,
            Some(_) => false,
            None => desired
                .get(field)
                .and_then(string_list)
                .is_some_and(|names| id_set(names) == live),
        };
        if !same {
            differing.push(field);
        }
    }

    differing
}

/// First `required_on_create` field the caller left blank.
pub(crate) fn missing_required(descriptor: &Descriptor, desired: &DesiredState) -> Option<&'static str> {
    descriptor
        .required_on_create
        .iter()
        .copied()
        .find(|field| desired.is_blank(field))
}

/// Payload for a create: the name plus every supplied field.
pub(crate) fn create_payload(
    descriptor: &Descriptor,
    desired: &DesiredState,
    resolved: &ResolvedDeps,
) -> Result<Object> {
    let mut payload = Object::new();
    if let Some(name) = desired.name() {
        payload.insert("name".to_string(), Value::String(name.to_string()));
    }
    for field in descriptor.fields() {
        if let Some(value) = desired.get(field) {
            let wanted = effective_value(field, value, resolved)
                .ok_or_else(|| unresolved(descriptor, field, value))?;
            payload.insert(field.to_string(), wanted);
        }
    }
    Ok(payload)
}

/// Payload for an update: the differing fields plus the resolved fields the
/// descriptor re-sends on every update. Never carries the name.
pub(crate) fn update_payload(
    descriptor: &Descriptor,
    desired: &DesiredState,
    resolved: &ResolvedDeps,
    differing: &[&'static str],
) -> Result<Object> {
    let mut payload = Object::new();
    for &field in differing {
        let Some(value) = desired.get(field) else {
            continue;
        };
        let wanted = effective_value(field, value, resolved)
            .ok_or_else(|| unresolved(descriptor, field, value))?;
        payload.insert(field.to_string(), wanted);
    }
    for &field in descriptor.sent_on_every_update {
        if payload.contains_key(field) || desired.is_blank(field) {
            continue;
        }
        if let Some(wanted) = resolved.get(field).and_then(Resolution::to_value) {
            payload.insert(field.to_string(), wanted);
        }
    }
    Ok(payload)
}
