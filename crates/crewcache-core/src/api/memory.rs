//! In-memory row-store.
//!
//! Backs the demo mode and the test suites: the same tables and id
//! assignment as the hosted backend, held in process memory. Rows are plain
//! JSON objects so the store layer treats both backends identically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{tables, ApiError, Filter, Order, RowStore};

pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    select_calls: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            select_calls: AtomicU64::new(0),
        }
    }

    /// A store pre-seeded with the demo roster, sessions, and shows.
    ///
    /// Demo accounts authenticate with the password `password123` (stored
    /// plaintext, exercising the legacy credential path).
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        {
            let mut tables_guard = store.tables.lock().unwrap_or_else(|e| e.into_inner());
            seed_demo(&mut tables_guard);
        }
        store.next_id.store(100, Ordering::Relaxed);
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn matches(row: &Value, filters: &[Filter]) -> bool {
        filters.iter().all(|f| match row.get(&f.column) {
            Some(Value::String(s)) => s == &f.value,
            Some(other) => other.to_string() == f.value,
            None => false,
        })
    }

    fn sort_key(row: &Value, column: &str) -> String {
        match row.get(column) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// Number of select calls served so far; the TTL tests use this to prove
    /// a cache hit never reached the backend.
    #[cfg(test)]
    pub(crate) fn select_calls(&self) -> u64 {
        self.select_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<Value>, ApiError> {
        self.select_calls.fetch_add(1, Ordering::Relaxed);
        let guard = self.lock();
        let mut rows: Vec<Value> = guard
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| Self::matches(r, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(o) = order {
            rows.sort_by_key(|r| Self::sort_key(r, o.column));
            if !o.ascending {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, ApiError> {
        let mut row = match row {
            Value::Object(map) => map,
            other => {
                return Err(ApiError::InvalidResponse(format!(
                    "Insert payload must be an object, got {}",
                    other
                )))
            }
        };
        if !row.contains_key("id") {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            row.insert("id".to_string(), Value::String(id.to_string()));
        }
        let row = Value::Object(row);
        self.lock()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, ApiError> {
        let patch = match patch {
            Value::Object(map) => map,
            other => {
                return Err(ApiError::InvalidResponse(format!(
                    "Update payload must be an object, got {}",
                    other
                )))
            }
        };
        let mut guard = self.lock();
        let rows = guard
            .get_mut(table)
            .ok_or_else(|| ApiError::NotFound(format!("{} id {}", table, id)))?;
        let row = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| ApiError::NotFound(format!("{} id {}", table, id)))?;
        if let Value::Object(fields) = row {
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), ApiError> {
        let mut guard = self.lock();
        let rows = guard
            .get_mut(table)
            .ok_or_else(|| ApiError::NotFound(format!("{} id {}", table, id)))?;
        let before = rows.len();
        rows.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        if rows.len() == before {
            return Err(ApiError::NotFound(format!("{} id {}", table, id)));
        }
        Ok(())
    }
}

fn seed_demo(tables_map: &mut HashMap<String, Vec<Value>>) {
    let user = |id: &str, name: &str, email: &str, role: &str, team: Value, is_captain: bool| {
        json!({
            "id": id,
            "name": name,
            "email": email,
            "role": role,
            "team": team,
            "is_captain": is_captain,
            "password_hash": "password123",
            "created_at": "2024-01-01T10:00:00Z",
        })
    };
    tables_map.insert(
        tables::USERS.to_string(),
        vec![
            user("1", "Admin User", "admin@example.com", "admin", Value::Null, false),
            user("2", "Samurai Captain", "samurai@example.com", "captain", json!("Samurai"), true),
            user("3", "Gladiator Captain", "gladiator@example.com", "captain", json!("Gladiator"), true),
            user("4", "Viking Captain", "viking@example.com", "captain", json!("Viking"), true),
            user("5", "Samurai Member", "member1@example.com", "member", json!("Samurai"), false),
            user("6", "Samurai Member 2", "member2@example.com", "member", json!("Samurai"), false),
            user("7", "Gladiator Member", "member3@example.com", "member", json!("Gladiator"), false),
            user("8", "Viking Member", "member4@example.com", "member", json!("Viking"), false),
        ],
    );

    let session = |id: &str, date: &str, team: &str, coach: &str, created_by: &str| {
        json!({
            "id": id,
            "date": date,
            "team": team,
            "coach": coach,
            "created_by": created_by,
            "created_at": "2024-11-01T10:00:00Z",
        })
    };
    tables_map.insert(
        tables::COACHING_SESSIONS.to_string(),
        vec![
            session("10", "2025-01-15", "Samurai", "Coach Sarah", "2"),
            session("11", "2025-01-20", "Samurai", "Coach Mike", "2"),
            session("12", "2024-12-10", "Samurai", "Coach Sarah", "2"),
            session("13", "2025-01-18", "Gladiator", "Coach Alex", "3"),
            session("14", "2025-02-12", "Gladiator", "Coach Alex", "3"),
            session("15", "2025-02-20", "Viking", "Coach Erik", "4"),
        ],
    );

    let attendance = |id: &str, user_id: &str, session_id: &str, status: &str| {
        json!({
            "id": id,
            "user_id": user_id,
            "session_id": session_id,
            "status": status,
            "updated_at": "2024-12-01T15:30:00Z",
        })
    };
    tables_map.insert(
        tables::ATTENDANCE_RECORDS.to_string(),
        vec![
            attendance("20", "5", "10", "present"),
            attendance("21", "5", "11", "undecided"),
            attendance("22", "6", "10", "present"),
            attendance("23", "6", "11", "absent"),
            attendance("24", "7", "13", "present"),
            attendance("25", "8", "15", "undecided"),
        ],
    );

    let show = |id: &str, name: &str, team: &str, created_by: &str| {
        json!({
            "id": id,
            "name": name,
            "team": team,
            "created_by": created_by,
            "created_at": "2024-01-05T10:00:00Z",
        })
    };
    tables_map.insert(
        tables::SHOWS.to_string(),
        vec![
            show("30", "Winter Performance", "Samurai", "2"),
            show("31", "Spring Festival", "Gladiator", "3"),
            show("32", "Viking Conquest", "Viking", "4"),
        ],
    );

    let show_date = |id: &str, show_id: &str, date: &str, created_by: &str| {
        json!({
            "id": id,
            "show_id": show_id,
            "date": date,
            "max_members": 5,
            "created_by": created_by,
            "created_at": "2024-01-10T10:00:00Z",
        })
    };
    tables_map.insert(
        tables::SHOW_DATES.to_string(),
        vec![
            show_date("40", "30", "2025-02-15", "2"),
            show_date("41", "30", "2024-12-15", "2"),
            show_date("42", "31", "2025-03-20", "3"),
            show_date("43", "32", "2025-07-04", "4"),
        ],
    );

    tables_map.insert(
        tables::SHOW_ASSIGNMENTS.to_string(),
        vec![
            json!({"id": "50", "show_date_id": "40", "user_id": "5"}),
            json!({"id": "51", "show_date_id": "40", "user_id": "6"}),
            json!({"id": "52", "show_date_id": "42", "user_id": "7"}),
        ],
    );

    let availability = |id: &str, user_id: &str, show_date_id: &str, status: &str| {
        json!({
            "id": id,
            "user_id": user_id,
            "show_date_id": show_date_id,
            "status": status,
            "updated_at": "2024-01-14T15:30:00Z",
        })
    };
    tables_map.insert(
        tables::SHOW_AVAILABILITY.to_string(),
        vec![
            availability("60", "5", "40", "present"),
            availability("61", "6", "40", "undecided"),
            availability("62", "7", "42", "present"),
            availability("63", "8", "43", "present"),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert("users", json!({"name": "A"})).await.unwrap();
        let b = store.insert("users", json!({"name": "B"})).await.unwrap();
        assert_eq!(a.get("id").and_then(Value::as_str), Some("1"));
        assert_eq!(b.get("id").and_then(Value::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let store = MemoryStore::with_demo_data();
        let rows = store
            .select(
                tables::COACHING_SESSIONS,
                &[Filter::eq("team", "Samurai")],
                Some(Order::asc("date")),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        let dates: Vec<&str> = rows
            .iter()
            .map(|r| r.get("date").and_then(Value::as_str).unwrap())
            .collect();
        assert_eq!(dates, vec!["2024-12-10", "2025-01-15", "2025-01-20"]);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryStore::with_demo_data();
        let row = store
            .update(tables::ATTENDANCE_RECORDS, "20", json!({"status": "absent"}))
            .await
            .unwrap();
        assert_eq!(row.get("status").and_then(Value::as_str), Some("absent"));
        // Untouched fields survive the merge.
        assert_eq!(row.get("user_id").and_then(Value::as_str), Some("5"));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(tables::USERS, "999", json!({"name": "X"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = MemoryStore::with_demo_data();
        store.delete(tables::SHOWS, "30").await.unwrap();
        let rows = store.select(tables::SHOWS, &[], None).await.unwrap();
        assert_eq!(rows.len(), 2);
        let err = store.delete(tables::SHOWS, "30").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
