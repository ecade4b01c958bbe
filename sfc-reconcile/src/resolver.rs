//! Dependency resolution.
//!
//! Turns user-supplied names or IDs of referenced objects into canonical IDs.
//! Lookups are read-only and issued one at a time in input order.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Operation, Result};
use crate::resource::{Cardinality, Descriptor, Reference};
use crate::state::{DesiredState, Resolution, ResolvedDeps, string_list};
use crate::store::{RemoteStore, StoreError};

/// Resolves the reference fields of one resource kind.
pub struct DependencyResolver<'a> {
    store: &'a dyn RemoteStore,
    descriptor: &'static Descriptor,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(store: &'a dyn RemoteStore, descriptor: &'static Descriptor) -> Self {
        Self { store, descriptor }
    }

    /// Fail on a `required_on_create` field that cannot be satisfied, without
    /// any remote call.
    ///
    /// A required field supplied with an empty value never resolves, whatever
    /// the live state. With `creating`, a required field left out entirely
    /// fails too.
    pub fn require(&self, desired: &DesiredState, creating: bool) -> Result<()> {
        let missing = self
            .descriptor
            .required_on_create
            .iter()
            .copied()
            .find(|field| desired.is_blank(field) && (creating || desired.get(field).is_some()));
        match missing {
            Some(field) => Err(Error::MissingRequiredField {
                kind: self.descriptor.kind,
                field,
            }),
            None => Ok(()),
        }
    }

    /// Resolve every reference field present in `desired`, in descriptor order.
    pub async fn resolve_all(&self, desired: &DesiredState, required: bool) -> Result<ResolvedDeps> {
        let mut resolved = ResolvedDeps::new();
        for reference in self.descriptor.references {
            if let Some(value) = desired.get(reference.field) {
                let resolution = self.resolve(reference.field, value, required).await?;
                resolved.insert(reference.field, resolution);
            }
        }
        Ok(resolved)
    }

    /// Resolve one reference field.
    ///
    /// With `required`, a value that does not resolve is an error. Without it
    /// the field comes back [`Resolution::Unresolved`]. List fields stop at the
    /// first element that does not resolve.
    pub async fn resolve(&self, field: &str, value: &Value, required: bool) -> Result<Resolution> {
        let kind = self.descriptor.kind;
        let reference = self
            .descriptor
            .reference(field)
            .ok_or_else(|| Error::invalid(kind, field, "not a reference field"))?;

        match reference.cardinality {
            Cardinality::One => {
                let name = value
                    .as_str()
                    .ok_or_else(|| Error::invalid(kind, field, "expected a name or ID"))?;
                Ok(match self.lookup(reference, name, required).await? {
                    Some(id) => Resolution::Id(id),
                    None => Resolution::Unresolved(name.to_string()),
                })
            }
            Cardinality::Many => {
                let names = string_list(value)
                    .ok_or_else(|| Error::invalid(kind, field, "expected a list of names or IDs"))?;
                let mut ids = Vec::with_capacity(names.len());
                for name in names {
                    match self.lookup(reference, name, required).await? {
                        Some(id) => ids.push(id),
                        None => return Ok(Resolution::Unresolved(name.to_string())),
                    }
                }
                Ok(Resolution::Ids(ids))
            }
        }
    }

    async fn lookup(&self, reference: &Reference, value: &str, required: bool) -> Result<Option<String>> {
        debug!(field = reference.field, target = %reference.target, value, "Resolving reference");

        let found = self
            .store
            .get(reference.target, value)
            .await
            .map_err(Error::remote(reference.target, Operation::Lookup))?;

        match found {
            Some(object) => match object.get("id").and_then(Value::as_str) {
                Some(id) => Ok(Some(id.to_string())),
                None => Err(Error::RemoteStore {
                    kind: reference.target,
                    operation: Operation::Lookup,
                    source: StoreError::Decode(format!("{} `{value}' has no id", reference.target)),
                }),
            },
            None if required => Err(Error::ReferenceNotFound {
                kind: self.descriptor.kind,
                field: reference.field,
                target: reference.target,
                value: value.to_string(),
            }),
            None => {
                warn!(field = reference.field, target = %reference.target, value, "Reference not found");
                Ok(None)
            }
        }
    }
}
