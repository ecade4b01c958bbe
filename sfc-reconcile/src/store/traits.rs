//! RemoteStore trait definition.

use async_trait::async_trait;

use super::error::Result;
use crate::resource::ObjectKind;
use crate::state::Object;

/// Remote resource store, keyed by object kind.
///
/// Objects are JSON mappings carrying an `id` plus their live field values.
/// Reference fields of stored objects always hold IDs, never names.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up an object by name or ID.
    async fn get(&self, kind: ObjectKind, name_or_id: &str) -> Result<Option<Object>>;

    /// Create an object from the given fields.
    async fn create(&self, kind: ObjectKind, fields: Object) -> Result<Object>;

    /// Update the given fields of an existing object.
    async fn update(&self, kind: ObjectKind, id: &str, fields: Object) -> Result<Object>;

    /// Delete an object by ID.
    async fn delete(&self, kind: ObjectKind, id: &str) -> Result<()>;
}
