//! In-memory remote store.
//!
//! Holds objects per kind and records every mutating call, so reconciliation
//! can be exercised and asserted on without a cloud.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::traits::RemoteStore;
use crate::resource::ObjectKind;
use crate::state::Object;

/// A mutating call received by the [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create {
        kind: ObjectKind,
        fields: Object,
    },
    Update {
        kind: ObjectKind,
        id: String,
        fields: Object,
    },
    Delete {
        kind: ObjectKind,
        id: String,
    },
}

impl StoreCall {
    /// Fields sent with a create or update.
    pub fn fields(&self) -> Option<&Object> {
        match self {
            StoreCall::Create { fields, .. } | StoreCall::Update { fields, .. } => Some(fields),
            StoreCall::Delete { .. } => None,
        }
    }
}

#[derive(Default)]
struct Inner {
    objects: HashMap<ObjectKind, Vec<Object>>,
    calls: Vec<StoreCall>,
    lookups: usize,
    mutation_error: Option<String>,
}

/// Remote store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an object. Non-object values are stored as empty objects; a
    /// missing `id` is generated. Returns the object's ID.
    pub fn insert(&self, kind: ObjectKind, object: Value) -> String {
        let mut object = match object {
            Value::Object(map) => map,
            _ => Object::new(),
        };
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                object.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        self.lock().objects.entry(kind).or_default().push(object);
        id
    }

    /// Snapshot of the stored objects of one kind.
    pub fn objects(&self, kind: ObjectKind) -> Vec<Object> {
        self.lock().objects.get(&kind).cloned().unwrap_or_default()
    }

    /// Every mutating call received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn lookup_count(&self) -> usize {
        self.lock().lookups
    }

    /// Make every following create/update/delete fail with `message`.
    pub fn fail_mutations(&self, message: impl Into<String>) {
        self.lock().mutation_error = Some(message.into());
    }

    fn check_mutation(inner: &Inner) -> Result<()> {
        match &inner.mutation_error {
            Some(message) => Err(StoreError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn id_of(object: &Object) -> Option<&str> {
    object.get("id").and_then(Value::as_str)
}

/// Populate the fields a live object always carries.
fn with_defaults(kind: ObjectKind, mut object: Object) -> Object {
    object
        .entry("name")
        .or_insert_with(|| Value::String(String::new()));
    if let Some(resource) = kind.resource_kind() {
        let descriptor = resource.descriptor();
        for field in descriptor.scalar_fields {
            object.entry(*field).or_insert(Value::Null);
        }
        for field in descriptor.dict_fields {
            object.entry(*field).or_insert_with(|| Value::Object(Object::new()));
        }
        for field in descriptor.list_ref_fields {
            object.entry(*field).or_insert_with(|| Value::Array(Vec::new()));
        }
    }
    object
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, kind: ObjectKind, name_or_id: &str) -> Result<Option<Object>> {
        let mut inner = self.lock();
        inner.lookups += 1;

        let objects = match inner.objects.get(&kind) {
            Some(objects) => objects,
            None => return Ok(None),
        };
        if let Some(object) = objects.iter().find(|o| id_of(o) == Some(name_or_id)) {
            return Ok(Some(object.clone()));
        }

        let mut matches = objects
            .iter()
            .filter(|o| o.get("name").and_then(Value::as_str) == Some(name_or_id));
        match (matches.next(), matches.next()) {
            (None, _) => Ok(None),
            (Some(object), None) => Ok(Some(object.clone())),
            (Some(_), Some(_)) => Err(StoreError::Conflict(format!(
                "multiple {kind} objects match name `{name_or_id}'"
            ))),
        }
    }

    async fn create(&self, kind: ObjectKind, fields: Object) -> Result<Object> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Create {
            kind,
            fields: fields.clone(),
        });
        Self::check_mutation(&inner)?;

        let mut object = with_defaults(kind, fields);
        object.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        inner.objects.entry(kind).or_default().push(object.clone());
        Ok(object)
    }

    async fn update(&self, kind: ObjectKind, id: &str, fields: Object) -> Result<Object> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Update {
            kind,
            id: id.to_string(),
            fields: fields.clone(),
        });
        Self::check_mutation(&inner)?;

        let object = inner
            .objects
            .get_mut(&kind)
            .and_then(|objects| objects.iter_mut().find(|o| id_of(o) == Some(id)))
            .ok_or_else(|| StoreError::NotFound(format!("{kind} {id}")))?;
        object.extend(fields);
        Ok(object.clone())
    }

    async fn delete(&self, kind: ObjectKind, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Delete {
            kind,
            id: id.to_string(),
        });
        Self::check_mutation(&inner)?;

        let objects = inner.objects.entry(kind).or_default();
        let before = objects.len();
        objects.retain(|o| id_of(o) != Some(id));
        if objects.len() == before {
            return Err(StoreError::NotFound(format!("{kind} {id}")));
        }
        Ok(())
    }
}
