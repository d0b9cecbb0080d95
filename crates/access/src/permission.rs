use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use merchdesk_core::PermissionId;

/// Permission code.
///
/// Codes are opaque, namespaced strings of the form `module.resource.action`
/// (e.g. `"erp.orders.view"`). They are stable keys: once issued a code is
/// never renamed, so it is safe to persist and compare across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(Cow<'static, str>);

impl PermissionCode {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The leading `module` segment of the code, or the whole code when it
    /// carries no namespace separator.
    pub fn module(&self) -> &str {
        self.as_str().split('.').next().unwrap_or_default()
    }
}

impl core::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A grantable capability as served by the backend catalog.
///
/// Backends occasionally serve incomplete records; a missing `code`
/// deserializes to the empty code and a missing `isActive` to inactive, both
/// of which are treated as "not granted" downstream rather than as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: PermissionId,
    #[serde(default)]
    pub code: PermissionCode,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub module: String,
    pub group: String,
    #[serde(default)]
    pub is_active: bool,
}

impl Permission {
    /// Whether this record may contribute its code to a permission set.
    pub fn is_grantable(&self) -> bool {
        self.is_active && !self.code.is_empty()
    }
}

/// Immutable reference data: the universe of permissions grouped by
/// module and, within each module, by display group.
///
/// Mirrors the `GET /permissions/grouped` wire shape and is fetched once per
/// session (see `merchdesk-client`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCatalog {
    groups: BTreeMap<String, BTreeMap<String, Vec<Permission>>>,
}

impl PermissionCatalog {
    pub fn from_grouped(groups: BTreeMap<String, BTreeMap<String, Vec<Permission>>>) -> Self {
        Self { groups }
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn groups_in(&self, module: &str) -> impl Iterator<Item = (&str, &[Permission])> {
        self.groups
            .get(module)
            .into_iter()
            .flat_map(|groups| groups.iter().map(|(g, perms)| (g.as_str(), perms.as_slice())))
    }

    /// Flat iteration over every permission in the catalog.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.groups
            .values()
            .flat_map(|groups| groups.values())
            .flatten()
    }

    pub fn find(&self, code: &PermissionCode) -> Option<&Permission> {
        self.iter().find(|p| &p.code == code)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
