//! Declarative reconciliation of OpenStack networking-sfc resources.
//!
//! Flow classifiers, port pairs, port pair groups and port chains are brought
//! to a desired state by a single engine driven by static resource
//! descriptors. Each run resolves references, reads the live object, and
//! issues at most one create, update or delete.

pub mod config;
pub mod error;
pub mod output;
pub mod reconciler;
pub mod resolver;
pub mod resource;
pub mod state;
pub mod store;

pub use config::{CloudConfig, ConfigError};
pub use error::{Error, Operation, Result};
pub use reconciler::{Outcome, SfcReconciler, reconcile};
pub use resolver::DependencyResolver;
pub use resource::{Descriptor, ObjectKind, ResourceKind};
pub use state::{ApplyResult, DesiredState, Object, Resolution, ResolvedDeps, TargetState};
pub use store::{MemoryStore, NeutronStore, RemoteStore, StoreCall, StoreError};
