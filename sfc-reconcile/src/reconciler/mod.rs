//! Reconciliation of networking-sfc resources.
//!
//! One engine serves every resource kind. It compares the desired state
//! (from the caller) with the live object (from the remote store) and takes
//! at most one action to converge:
//!
//! ```text
//! validate → required fields → read current → resolve references → decide
//!          → create | update | delete | nothing
//! ```

mod diff;
mod engine;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

pub use engine::{Outcome, reconcile};

use crate::error::{Error, Operation, Result};
use crate::resolver::DependencyResolver;
use crate::resource::{Descriptor, ResourceKind};
use crate::state::{ApplyResult, DesiredState, ResolvedDeps, TargetState, string_list};
use crate::store::RemoteStore;

/// Check every desired field against the descriptor before any remote call.
pub fn validate(descriptor: &Descriptor, desired: &DesiredState) -> Result<()> {
    let kind = descriptor.kind;
    for (field, value) in desired.fields() {
        if !descriptor.is_known(field) {
            return Err(Error::invalid(kind, field, "unknown field"));
        }
        if descriptor.is_dict(field) && !value.is_object() {
            return Err(Error::invalid(kind, field, "expected a dictionary"));
        }
        if descriptor.is_list_ref(field) && string_list(value).is_none() {
            return Err(Error::invalid(kind, field, "expected a list of names or IDs"));
        }
        if descriptor.is_scalar(field) {
            if descriptor.reference(field).is_some() && !value.is_string() {
                return Err(Error::invalid(kind, field, "expected a name or ID"));
            }
            if matches!(value, Value::Array(_) | Value::Object(_)) {
                return Err(Error::invalid(kind, field, "expected a single value"));
            }
        }
    }
    Ok(())
}

/// Applies desired states against a remote store.
pub struct SfcReconciler {
    store: Arc<dyn RemoteStore>,
}

impl SfcReconciler {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    /// Bring the resource of `kind` named in `desired` to `target`.
    ///
    /// With `speculative`, references that do not resolve are tolerated and
    /// nothing is mutated; the result only says whether a change would occur.
    pub async fn apply(
        &self,
        kind: ResourceKind,
        desired: &DesiredState,
        target: TargetState,
        speculative: bool,
    ) -> Result<ApplyResult> {
        let descriptor = kind.descriptor();
        info!(
            kind = %kind,
            name = ?desired.name(),
            state = %target,
            check = speculative,
            "Reconciling"
        );

        validate(descriptor, desired)?;

        let resolver = DependencyResolver::new(self.store(), descriptor);
        let strict = target == TargetState::Present && !speculative;
        if strict {
            resolver.require(desired, false)?;
        }

        let current = match desired.name() {
            Some(name) => self
                .store
                .get(kind.object_kind(), name)
                .await
                .map_err(Error::remote(kind.object_kind(), Operation::Lookup))?,
            None => None,
        };
        debug!(kind = %kind, exists = current.is_some(), "Fetched current state");

        let resolved = match target {
            TargetState::Present => {
                if strict && current.is_none() {
                    resolver.require(desired, true)?;
                }
                resolver.resolve_all(desired, !speculative).await?
            }
            TargetState::Absent => ResolvedDeps::new(),
        };

        let outcome = reconcile(
            self.store(),
            descriptor,
            desired,
            &resolved,
            current,
            target,
            speculative,
        )
        .await?;

        Ok(ApplyResult::new(outcome.changed, outcome.object))
    }
}
