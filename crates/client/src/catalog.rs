//! Session-scoped permission catalog cache.

use std::sync::Arc;

use tokio::sync::OnceCell;

use merchdesk_access::PermissionCatalog;

use crate::api::ApiError;
use crate::source::CatalogSource;

/// The permission catalog, fetched once per session.
///
/// The catalog is immutable reference data; the first successful fetch is
/// memoized for the lifetime of the session. A failed fetch is not memoized,
/// so the next call retries.
pub struct SessionCatalog {
    source: Arc<dyn CatalogSource>,
    cell: OnceCell<PermissionCatalog>,
}

impl SessionCatalog {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&PermissionCatalog, ApiError> {
        self.cell
            .get_or_try_init(|| async { self.source.fetch_catalog().await })
            .await
    }

    /// The catalog, if a fetch already succeeded this session.
    pub fn cached(&self) -> Option<&PermissionCatalog> {
        self.cell.get()
    }
}
