//! Access-state resolution and ownership.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use merchdesk_access::{AccessSnapshot, AccessState};
use merchdesk_core::UserId;

use crate::api::ApiError;
use crate::snapshot::SnapshotStore;
use crate::source::RoleSource;

/// Owns the session's [`AccessState`]: the single writer.
///
/// Everything else observes the state through [`AccessResolver::current`] or
/// the change notification from [`AccessResolver::subscribe`]. Resolution
/// always re-fetches from the backend; the persisted snapshot is a
/// read-through cache for the window between page load and the first
/// resolution, never the source of truth.
///
/// Concurrent resolutions are last-write-wins; the superseded request is not
/// cancelled, its result is simply overwritten.
pub struct AccessResolver {
    source: Arc<dyn RoleSource>,
    store: SnapshotStore,
    profile: String,
    tx: watch::Sender<AccessState>,
}

impl AccessResolver {
    pub fn new(
        source: Arc<dyn RoleSource>,
        store: SnapshotStore,
        profile: impl Into<String>,
    ) -> Self {
        let (tx, _rx) = watch::channel(AccessState::anonymous());
        Self {
            source,
            store,
            profile: profile.into(),
            tx,
        }
    }

    /// The current state (cloned).
    pub fn current(&self) -> AccessState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes. Receivers see the value current at
    /// subscription time and every published change after it.
    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.tx.subscribe()
    }

    /// Startup read-through: publish the persisted snapshot, if any, so the
    /// UI is not blocked before the first network round trip.
    ///
    /// Returns whether a snapshot was applied. `max_age` bounds how stale a
    /// snapshot may be before it is ignored.
    pub async fn restore(&self, max_age: Option<chrono::Duration>) -> anyhow::Result<bool> {
        match self.store.load(&self.profile, max_age).await? {
            Some(snapshot) => {
                tracing::debug!(resolved_at = %snapshot.resolved_at, "restored access snapshot");
                self.tx.send_replace(snapshot.restore());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolve the user's access state from the backend.
    ///
    /// On success the new state is persisted and published. On failure the
    /// previous state is left untouched (stale-but-available) and the error
    /// is returned, so a caller holding no prior state can fail closed.
    pub async fn resolve(&self, user_id: UserId) -> Result<AccessState, ApiError> {
        let role = match self.source.fetch_role(user_id).await {
            Ok(role) => role,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "role resolution failed; keeping previous access state");
                return Err(err);
            }
        };

        if let Err(err) = role.validate() {
            tracing::warn!(%user_id, error = %err, "backend served a role violating invariants; keeping previous access state");
            return Err(ApiError::Parse(err.to_string()));
        }

        let state = AccessState::from_role(role);
        let snapshot = AccessSnapshot::capture(&state, Utc::now());

        // A snapshot write failure costs only the fast reload path.
        if let Err(err) = self.store.save(&self.profile, &snapshot).await {
            tracing::warn!(error = ?err, "failed to persist access snapshot");
        }

        self.tx.send_replace(state.clone());
        Ok(state)
    }

    /// Logout: drop the persisted snapshot and publish the anonymous state.
    pub async fn clear(&self) -> anyhow::Result<()> {
        self.store.clear(&self.profile).await?;
        self.tx.send_replace(AccessState::anonymous());
        Ok(())
    }
}
