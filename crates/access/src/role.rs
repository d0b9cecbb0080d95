use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use merchdesk_core::{DomainError, DomainResult, RoleId, StoreId};

use crate::permission::{Permission, PermissionCode};

/// A named bundle of permissions.
///
/// # Invariants
/// - An administrative role is global: `store_id` must be absent.
/// - A non-administrative role is scoped to exactly one store: `store_id`
///   must be present.
/// - `permissions` contains no duplicate codes.
///
/// Roles are created and edited through the administrative screens; this
/// type only guards the invariants on the mutation paths and on
/// [`Role::validate`] (used when accepting a role from the backend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub is_administrative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_role_active")]
    pub is_active: bool,
}

fn default_role_active() -> bool {
    true
}

impl Role {
    /// Check the role's structural invariants.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_administrative && self.store_id.is_some() {
            return Err(DomainError::invariant(
                "administrative role must not be store-scoped",
            ));
        }
        if !self.is_administrative && self.store_id.is_none() {
            return Err(DomainError::invariant("store role requires a store id"));
        }

        let mut seen = HashSet::new();
        for p in &self.permissions {
            if !p.code.is_empty() && !seen.insert(p.code.as_str()) {
                return Err(DomainError::invariant(format!(
                    "duplicate permission code '{}'",
                    p.code
                )));
            }
        }

        Ok(())
    }

    /// Incrementally grant a permission.
    ///
    /// Granting an already-present code violates the no-duplicates invariant.
    pub fn grant(&mut self, permission: Permission) -> DomainResult<()> {
        if self.permissions.iter().any(|p| p.code == permission.code) {
            return Err(DomainError::invariant(format!(
                "permission '{}' already granted",
                permission.code
            )));
        }
        self.permissions.push(permission);
        Ok(())
    }

    /// Incrementally revoke a permission by code.
    pub fn revoke(&mut self, code: &PermissionCode) -> DomainResult<()> {
        let before = self.permissions.len();
        self.permissions.retain(|p| &p.code != code);
        if self.permissions.len() == before {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    /// Full-replace mutation used by the role editor's save path.
    pub fn replace_permissions(&mut self, permissions: Vec<Permission>) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for p in &permissions {
            if !p.code.is_empty() && !seen.insert(p.code.as_str()) {
                return Err(DomainError::invariant(format!(
                    "duplicate permission code '{}'",
                    p.code
                )));
            }
        }
        self.permissions = permissions;
        Ok(())
    }

    /// The flattened set of codes granted by this role.
    ///
    /// Inactive permissions and records with no code are skipped silently:
    /// inconsistent backend data means "not granted", never an error.
    pub fn active_permission_codes(&self) -> BTreeSet<PermissionCode> {
        self.permissions
            .iter()
            .filter(|p| p.is_grantable())
            .map(|p| p.code.clone())
            .collect()
    }
}
