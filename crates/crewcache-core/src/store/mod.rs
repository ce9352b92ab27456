//! Client-side stores over the backend row-store.
//!
//! Each store owns the mirrors for its tables and the business rules on
//! top of them:
//!
//! - `UserStore`: authentication, profile/role management, team rosters
//! - `CoachingStore`: coaching sessions and attendance
//! - `ShowStore`: shows, performance dates, assignments, availability
//! - `matrix`: the dense roster-by-event grid both matrices share
//! - `gate`: the past-event admission check for status updates
//!
//! Stores are constructed with their backend handle and cache manager by
//! the composition root; there is no global state. Every action returns a
//! [`StoreResult`] rather than panicking, and a backend failure never
//! disturbs a mirror.

pub mod coaching;
pub mod error;
pub mod gate;
pub mod matrix;
pub mod shows;
pub mod user;

pub use coaching::CoachingStore;
pub use error::{StoreError, StoreResult};
pub use matrix::{build_matrix, EventColumn, Matrix, MatrixRow};
pub use shows::ShowStore;
pub use user::{ProfileUpdate, UserStore};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::cache::{CacheManager, CachedData, Mirror};

/// Persist a mirror snapshot with its fetch stamp. Persistence failures are
/// logged, not returned: the in-memory mirror stays authoritative for the
/// rest of the run.
pub(crate) fn persist_mirror<T: Serialize + Clone>(
    cache: &CacheManager,
    name: &str,
    mirror: &Mirror<T>,
) {
    let snapshot = CachedData {
        data: mirror.rows().to_vec(),
        cached_at: mirror.fetched_at().unwrap_or_else(Utc::now),
    };
    if let Err(e) = cache.save(name, &snapshot) {
        warn!(cache = name, error = %e, "Failed to persist cache");
    }
}

/// Restore a mirror from its persisted snapshot, keeping the original
/// fetch stamp so the TTL is not reset by a restart.
pub(crate) fn restore_mirror<T: DeserializeOwned>(
    cache: &CacheManager,
    name: &str,
    mirror: &mut Mirror<T>,
) {
    match cache.load::<Vec<T>>(name) {
        Ok(Some(cached)) => mirror.restore(cached.data, cached.cached_at),
        Ok(None) => {}
        Err(e) => warn!(cache = name, error = %e, "Failed to load cache"),
    }
}
