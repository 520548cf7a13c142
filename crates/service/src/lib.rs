//! PostgreSQL-backed configuration store for host-platform modules.
//! - Maps module descriptors to storage keys (`key`).
//! - Normalises documents before they are written (`codec`).
//! - Bootstraps the `module` table on start (`schema`).
//! - Exposes load/save through `ConfigStore`, which registers itself with the host.

pub mod errors;
pub mod descriptor;
pub mod key;
pub mod codec;
pub mod schema;
pub mod host;
pub mod store;
#[cfg(test)]
pub mod test_support;

pub use common::utils::logging;
pub use descriptor::{Descriptor, ModuleRef};
pub use errors::StoreError;
pub use host::{ConfigBackend, ConfigHost};
pub use store::{ConfigStore, Lifecycle, Lookup, SaveOutcome};
