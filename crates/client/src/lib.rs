//! `merchdesk-client` — IO shell around the access core.
//!
//! REST client for the console backend, the persisted access-state snapshot
//! store, and the resolver that owns the session's [`AccessState`]
//! (`merchdesk_access::AccessState`) and notifies subscribers when it
//! changes.

pub mod api;
pub mod catalog;
pub mod resolver;
pub mod snapshot;
pub mod source;
pub mod telemetry;

pub use api::{ApiClient, ApiError};
pub use catalog::SessionCatalog;
pub use resolver::AccessResolver;
pub use snapshot::SnapshotStore;
pub use source::{CatalogSource, RoleSource, StaticCatalogSource, StaticRoleSource};
