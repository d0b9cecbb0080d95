//! `merchdesk-access` — pure RBAC domain for the console (no IO).
//!
//! Permission codes, roles, the grouped permission catalog, the resolved
//! per-session access state, and the gating mechanisms that consume it.
//! Fetching and persistence live in `merchdesk-client`.

pub mod gate;
pub mod permission;
pub mod query;
pub mod role;
pub mod state;

pub use gate::{
    GuardOutcome, NavItem, NavSection, PermissionRequirement, RouteGuard, RouteRule, ViewGate,
    filter_nav,
};
pub use permission::{Permission, PermissionCatalog, PermissionCode};
pub use query::AccessQuery;
pub use role::Role;
pub use state::{AccessSnapshot, AccessState};
