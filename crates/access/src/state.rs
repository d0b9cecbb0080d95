use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::permission::PermissionCode;
use crate::query::AccessQuery;
use crate::role::Role;

/// The resolved, session-scoped access state for the current user.
///
/// Constructor-only: fields are private so the invariants hold by
/// construction rather than by discipline —
/// - `permission_set` is always exactly the role's active permission codes;
/// - `is_admin` always mirrors `role.is_administrative`;
/// - the anonymous state has an empty set and `is_admin == false`.
///
/// The single writer is the access resolver in `merchdesk-client`; everything
/// else reads through [`AccessQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessState {
    role: Option<Role>,
    permission_set: BTreeSet<PermissionCode>,
    is_admin: bool,
}

impl AccessState {
    /// The unauthenticated state: no role, nothing granted.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve a role into an access state.
    ///
    /// Deterministic: the same role always yields an identical state, which
    /// is what makes repeated resolution idempotent.
    pub fn from_role(role: Role) -> Self {
        let permission_set = role.active_permission_codes();
        let is_admin = role.is_administrative;
        Self {
            role: Some(role),
            permission_set,
            is_admin,
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn permission_set(&self) -> &BTreeSet<PermissionCode> {
        &self.permission_set
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    /// Borrow the query surface over this state.
    pub fn query(&self) -> AccessQuery<'_> {
        AccessQuery::new(self)
    }
}

/// Serializable snapshot of an [`AccessState`].
///
/// Persisted under a fixed key so a page reload can restore access state
/// before the first network round trip completes. `resolved_at` makes
/// staleness explicit; the store's load path can enforce a maximum age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessSnapshot {
    pub role: Option<Role>,
    pub permissions: Vec<String>,
    pub is_admin: bool,
    pub resolved_at: DateTime<Utc>,
}

impl AccessSnapshot {
    pub fn capture(state: &AccessState, resolved_at: DateTime<Utc>) -> Self {
        Self {
            role: state.role().cloned(),
            permissions: state
                .permission_set()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            is_admin: state.is_admin(),
            resolved_at,
        }
    }

    /// Rebuild the access state from the snapshot.
    ///
    /// The role is the source of truth: the permission set is recomputed
    /// from it rather than trusted from the stored list, so a snapshot can
    /// never smuggle in codes the role does not grant.
    pub fn restore(self) -> AccessState {
        match self.role {
            Some(role) => AccessState::from_role(role),
            None => AccessState::anonymous(),
        }
    }
}
