//! Remote store abstraction.
//!
//! The engine only ever talks to a [`RemoteStore`]:
//! - [`NeutronStore`]: the Neutron v2.0 API (networking-sfc extension)
//! - [`MemoryStore`]: in-process store that records every mutating call
//!
//! # Usage
//!
//! ```ignore
//! use sfc_reconcile::store::{NeutronStore, RemoteStore};
//!
//! let store = NeutronStore::new(&config)?;
//! let pair = store.get(ObjectKind::PortPair, "pp1").await?;
//! ```

mod error;
mod memory;
mod neutron;
mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, StoreCall};
pub use neutron::NeutronStore;
pub use traits::RemoteStore;
