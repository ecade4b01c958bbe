//! The reconciliation decision procedure.

use serde_json::Value;
use tracing::{debug, info};

use super::diff::{create_payload, differing_fields, missing_required, update_payload};
use crate::error::{Error, Operation, Result};
use crate::resource::Descriptor;
use crate::state::{DesiredState, Object, ResolvedDeps, TargetState};
use crate::store::{RemoteStore, StoreError};

/// Terminal result of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub changed: bool,
    pub object: Option<Object>,
}

impl Outcome {
    fn changed(object: Option<Object>) -> Self {
        Self {
            changed: true,
            object,
        }
    }

    fn unchanged(object: Option<Object>) -> Self {
        Self {
            changed: false,
            object,
        }
    }
}

fn object_id(descriptor: &Descriptor, object: &Object, operation: Operation) -> Result<String> {
    object
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::RemoteStore {
            kind: descriptor.kind.object_kind(),
            operation,
            source: StoreError::Decode(format!("{} has no id", descriptor.kind)),
        })
}

/// Converge one resource towards `target`.
///
/// Issues at most one mutating call, and none when `speculative`.
pub async fn reconcile(
    store: &dyn RemoteStore,
    descriptor: &'static Descriptor,
    desired: &DesiredState,
    resolved: &ResolvedDeps,
    current: Option<Object>,
    target: TargetState,
    speculative: bool,
) -> Result<Outcome> {
    let kind = descriptor.kind;
    let name = desired.name();

    match (target, current) {
        (TargetState::Present, None) => {
            if speculative {
                info!(kind = %kind, name = ?name, "Would create");
                return Ok(Outcome::changed(None));
            }
            if let Some(field) = missing_required(descriptor, desired) {
                return Err(Error::MissingRequiredField { kind, field });
            }

            let payload = create_payload(descriptor, desired, resolved)?;
            info!(kind = %kind, name = ?name, "Creating");
            let created = store
                .create(kind.object_kind(), payload)
                .await
                .map_err(Error::remote(kind.object_kind(), Operation::Create))?;
            Ok(Outcome::changed(Some(created)))
        }
        (TargetState::Present, Some(current)) => {
            let differing = differing_fields(descriptor, desired, resolved, &current);
            if differing.is_empty() {
                debug!(kind = %kind, name = ?name, "Up to date");
                return Ok(Outcome::unchanged(Some(current)));
            }
            if speculative {
                info!(kind = %kind, name = ?name, fields = ?differing, "Would update");
                return Ok(Outcome::changed(Some(current)));
            }

            let id = object_id(descriptor, &current, Operation::Update)?;
            let payload = update_payload(descriptor, desired, resolved, &differing)?;
            info!(kind = %kind, id = %id, fields = ?differing, "Updating");
            let updated = store
                .update(kind.object_kind(), &id, payload)
                .await
                .map_err(Error::remote(kind.object_kind(), Operation::Update))?;
            Ok(Outcome::changed(Some(updated)))
        }
        (TargetState::Absent, None) => {
            debug!(kind = %kind, name = ?name, "Already absent");
            Ok(Outcome::unchanged(None))
        }
        (TargetState::Absent, Some(current)) => {
            let id = object_id(descriptor, &current, Operation::Delete)?;
            if speculative {
                info!(kind = %kind, id = %id, "Would delete");
                return Ok(Outcome::changed(None));
            }

            info!(kind = %kind, id = %id, "Deleting");
            store
                .delete(kind.object_kind(), &id)
                .await
                .map_err(Error::remote(kind.object_kind(), Operation::Delete))?;
            Ok(Outcome::changed(None))
        }
    }
}
