//! Local caching of backend rows.
//!
//! Each store keeps an in-memory [`Mirror`] per table and persists it
//! through the [`CacheManager`] as JSON with its fetch stamp, so the TTL
//! survives a restart. A mirror is only replaced by a successful backend
//! fetch or cleared by invalidation; a failed fetch leaves it untouched.

pub mod manager;

pub use manager::{default_ttl, roster_ttl, CacheManager, CachedData, Mirror};
