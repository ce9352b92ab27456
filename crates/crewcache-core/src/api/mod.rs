//! Backend row-store access.
//!
//! The hosted backend is a relational row-store reached over REST; this
//! module defines the [`RowStore`] trait the rest of the crate is written
//! against, the [`ApiClient`] that implements it over HTTP, and the
//! [`MemoryStore`] used by demo mode and tests.

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::ApiClient;
pub use error::ApiError;
pub use memory::MemoryStore;
pub use store::{row_into, rows_into, tables, to_row, Filter, Order, RowStore};
