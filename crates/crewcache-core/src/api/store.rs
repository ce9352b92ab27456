use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::ApiError;

/// Backend table names.
pub mod tables {
    pub const USERS: &str = "users";
    pub const COACHING_SESSIONS: &str = "coaching_sessions";
    pub const ATTENDANCE_RECORDS: &str = "attendance_records";
    pub const SHOWS: &str = "shows";
    pub const SHOW_DATES: &str = "show_dates";
    pub const SHOW_ASSIGNMENTS: &str = "show_assignments";
    pub const SHOW_AVAILABILITY: &str = "show_availability";
}

/// Column equality filter (`column = value`).
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            value: value.into(),
        }
    }
}

/// Single-column ordering.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// The remote row-store: CRUD over named tables with server-assigned ids.
///
/// Rows travel as JSON values; the store layer owns the typed views. Only
/// equality filters and single-column ordering are supported, which is all
/// the application needs.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Select rows matching all `filters`, optionally ordered.
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<Value>, ApiError>;

    /// Insert one row and return it as created (with id and defaults filled).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, ApiError>;

    /// Patch the row with the given id and return it as updated.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, ApiError>;

    /// Delete the row with the given id. Missing rows are an error, not a no-op.
    async fn delete(&self, table: &str, id: &str) -> Result<(), ApiError>;
}

/// Deserialize a set of backend rows into a typed vector.
pub fn rows_into<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, ApiError> {
    rows.into_iter().map(row_into).collect()
}

/// Deserialize a single backend row.
pub fn row_into<T: DeserializeOwned>(row: Value) -> Result<T, ApiError> {
    serde_json::from_value(row).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Serialize an insert payload into a backend row value.
pub fn to_row<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
