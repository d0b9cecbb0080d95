//! Backend seams for role and catalog fetches.
//!
//! The resolver and catalog cache depend on these traits rather than on the
//! HTTP client directly, so tests (and offline tooling) can substitute
//! in-memory sources.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use merchdesk_access::{PermissionCatalog, Role};
use merchdesk_core::UserId;

use crate::api::{ApiClient, ApiError};

/// Source of a user's resolved role.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn fetch_role(&self, user_id: UserId) -> Result<Role, ApiError>;
}

/// Source of the grouped permission catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<PermissionCatalog, ApiError>;
}

#[async_trait]
impl RoleSource for ApiClient {
    async fn fetch_role(&self, user_id: UserId) -> Result<Role, ApiError> {
        self.merchant_role(user_id).await
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn fetch_catalog(&self) -> Result<PermissionCatalog, ApiError> {
        self.grouped_permissions().await
    }
}

/// In-memory role source.
///
/// Roles can be inserted and removed between fetches to exercise re-resolution
/// and failure paths; a missing user maps to a 404-shaped [`ApiError`].
#[derive(Debug, Default)]
pub struct StaticRoleSource {
    roles: Mutex<HashMap<UserId, Role>>,
}

impl StaticRoleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: UserId, role: Role) {
        self.roles.lock().unwrap().insert(user_id, role);
    }

    pub fn remove(&self, user_id: UserId) {
        self.roles.lock().unwrap().remove(&user_id);
    }
}

#[async_trait]
impl RoleSource for StaticRoleSource {
    async fn fetch_role(&self, user_id: UserId) -> Result<Role, ApiError> {
        self.roles
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ApiError::Api(404, "role not found".to_string()))
    }
}

/// In-memory catalog source with a fetch counter, for asserting the
/// once-per-session memoization.
#[derive(Debug)]
pub struct StaticCatalogSource {
    catalog: PermissionCatalog,
    fetches: Mutex<usize>,
}

impl StaticCatalogSource {
    pub fn new(catalog: PermissionCatalog) -> Self {
        Self {
            catalog,
            fetches: Mutex::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_catalog(&self) -> Result<PermissionCatalog, ApiError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.catalog.clone())
    }
}
