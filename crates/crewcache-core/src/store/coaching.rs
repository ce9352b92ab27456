//! Coaching sessions and attendance.
//!
//! Mirrors the `coaching_sessions` and `attendance_records` tables, applies
//! the past-event gate before mutating attendance, and owns the explicit
//! session-delete cascade so no attendance record can outlive its session.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::{row_into, rows_into, tables, to_row, Filter, Order, RowStore};
use crate::cache::{default_ttl, CacheManager, Mirror};
use crate::models::{
    AttendanceRecord, CoachingSession, NewAttendanceRecord, NewCoachingSession, Status, Team, User,
};

use super::matrix::{build_matrix, EventColumn, Matrix};
use super::{gate, persist_mirror, restore_mirror, StoreError, StoreResult};

const SESSIONS_CACHE: &str = "coaching_sessions";
const ATTENDANCE_CACHE: &str = "attendance_records";

pub struct CoachingStore {
    backend: Arc<dyn RowStore>,
    cache: Arc<CacheManager>,
    sessions: Mirror<CoachingSession>,
    attendance: Mirror<AttendanceRecord>,
}

impl CoachingStore {
    pub fn new(backend: Arc<dyn RowStore>, cache: Arc<CacheManager>) -> Self {
        Self {
            backend,
            cache,
            sessions: Mirror::new(default_ttl()),
            attendance: Mirror::new(default_ttl()),
        }
    }

    /// Restore persisted mirrors and their fetch stamps.
    pub fn restore(&mut self) {
        restore_mirror(&self.cache, SESSIONS_CACHE, &mut self.sessions);
        restore_mirror(&self.cache, ATTENDANCE_CACHE, &mut self.attendance);
    }

    // =========================================================================
    // Fetch (impure: may hit the backend)
    // =========================================================================

    /// All coaching sessions, date ascending. Served from the mirror while
    /// it is within its TTL unless `force` is set.
    pub async fn sessions(&mut self, force: bool) -> StoreResult<&[CoachingSession]> {
        if !force && self.sessions.is_fresh() {
            debug!(entity = SESSIONS_CACHE, "Cache hit");
            return Ok(self.sessions.rows());
        }

        let rows = self
            .backend
            .select(tables::COACHING_SESSIONS, &[], Some(Order::asc("date")))
            .await?;
        let parsed = rows_into::<CoachingSession>(rows)?;
        self.sessions.replace(parsed);
        persist_mirror(&self.cache, SESSIONS_CACHE, &self.sessions);
        Ok(self.sessions.rows())
    }

    /// All attendance records, mirrored with the same TTL policy.
    pub async fn attendance(&mut self, force: bool) -> StoreResult<&[AttendanceRecord]> {
        if !force && self.attendance.is_fresh() {
            debug!(entity = ATTENDANCE_CACHE, "Cache hit");
            return Ok(self.attendance.rows());
        }

        let rows = self
            .backend
            .select(tables::ATTENDANCE_RECORDS, &[], None)
            .await?;
        let parsed = rows_into::<AttendanceRecord>(rows)?;
        self.attendance.replace(parsed);
        persist_mirror(&self.cache, ATTENDANCE_CACHE, &self.attendance);
        Ok(self.attendance.rows())
    }

    /// Refresh both mirrors, issuing the backend fetches together. A failed
    /// fetch is logged and leaves that mirror untouched.
    pub async fn refresh_all(&mut self) {
        let sessions_fut =
            self.backend
                .select(tables::COACHING_SESSIONS, &[], Some(Order::asc("date")));
        let attendance_fut = self.backend.select(tables::ATTENDANCE_RECORDS, &[], None);
        let (sessions_res, attendance_res) = futures::join!(sessions_fut, attendance_fut);

        match sessions_res.and_then(rows_into::<CoachingSession>) {
            Ok(rows) => {
                self.sessions.replace(rows);
                persist_mirror(&self.cache, SESSIONS_CACHE, &self.sessions);
            }
            Err(e) => warn!(error = %e, "Failed to refresh coaching sessions"),
        }
        match attendance_res.and_then(rows_into::<AttendanceRecord>) {
            Ok(rows) => {
                self.attendance.replace(rows);
                persist_mirror(&self.cache, ATTENDANCE_CACHE, &self.attendance);
            }
            Err(e) => warn!(error = %e, "Failed to refresh attendance records"),
        }
    }

    // =========================================================================
    // Pure mirror lookups
    // =========================================================================

    pub fn cached_sessions(&self) -> &[CoachingSession] {
        self.sessions.rows()
    }

    pub fn cached_attendance(&self) -> &[AttendanceRecord] {
        self.attendance.rows()
    }

    pub fn sessions_by_team(&self, team: Team) -> Vec<&CoachingSession> {
        self.sessions.rows().iter().filter(|s| s.team == team).collect()
    }

    pub fn attendance_by_session(&self, session_id: &str) -> Vec<&AttendanceRecord> {
        self.attendance
            .rows()
            .iter()
            .filter(|r| r.session_id == session_id)
            .collect()
    }

    fn recorded_status(&self, user_id: &str, session_id: &str) -> Option<Status> {
        self.attendance
            .rows()
            .iter()
            .find(|r| r.user_id == user_id && r.session_id == session_id)
            .map(|r| r.status)
    }

    /// A member's status for a session, defaulting when no record exists.
    pub fn status_for(&self, user_id: &str, session_id: &str) -> Status {
        self.recorded_status(user_id, session_id).unwrap_or_default()
    }

    pub fn sessions_fresh(&self) -> bool {
        self.sessions.is_fresh()
    }

    pub fn attendance_fresh(&self) -> bool {
        self.attendance.is_fresh()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a session and backfill a default-status record for every
    /// roster member of the team, so the matrix starts dense on the backend
    /// too. Backfill failures are logged and skipped; there is no rollback.
    pub async fn create_session(
        &mut self,
        date: NaiveDate,
        team: Team,
        coach: &str,
        created_by: &str,
        roster: &[User],
    ) -> StoreResult<CoachingSession> {
        let payload = NewCoachingSession {
            date,
            team,
            coach: coach.to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        let created = self
            .backend
            .insert(tables::COACHING_SESSIONS, to_row(&payload)?)
            .await?;
        let session: CoachingSession = row_into(created)?;

        self.sessions.rows_mut().push(session.clone());
        self.sessions.rows_mut().sort_by(|a, b| a.date.cmp(&b.date));
        persist_mirror(&self.cache, SESSIONS_CACHE, &self.sessions);

        for member in roster.iter().filter(|m| m.team == Some(team)) {
            let record = NewAttendanceRecord {
                user_id: member.id.clone(),
                session_id: session.id.clone(),
                status: Status::default(),
                updated_at: Utc::now(),
            };
            let row = match to_row(&record) {
                Ok(row) => row,
                Err(e) => {
                    warn!(user_id = %member.id, error = %e, "Skipping backfill record");
                    continue;
                }
            };
            match self.backend.insert(tables::ATTENDANCE_RECORDS, row).await {
                Ok(created) => match row_into::<AttendanceRecord>(created) {
                    Ok(record) => self.attendance.rows_mut().push(record),
                    Err(e) => warn!(user_id = %member.id, error = %e, "Backfill row unreadable"),
                },
                Err(e) => warn!(user_id = %member.id, error = %e, "Backfill insert failed"),
            }
        }
        persist_mirror(&self.cache, ATTENDANCE_CACHE, &self.attendance);

        info!(session_id = %session.id, team = %team, "Coaching session created");
        Ok(session)
    }

    /// Record a member's attendance for a session, subject to the past-event
    /// gate. Upserts: at most one record per (user, session) pair.
    pub async fn update_attendance(
        &mut self,
        caller: &User,
        user_id: &str,
        session_id: &str,
        status: Status,
    ) -> StoreResult<()> {
        self.sessions(false).await?;
        let session_date = self
            .sessions
            .rows()
            .iter()
            .find(|s| s.id == session_id)
            .map(|s| s.date)
            .ok_or(StoreError::NotFound("Session"))?;
        gate::check_status_update(session_date, Local::now().date_naive(), caller)?;

        self.attendance(false).await?;
        let existing = self
            .attendance
            .rows()
            .iter()
            .find(|r| r.user_id == user_id && r.session_id == session_id)
            .map(|r| r.id.clone());
        let now = Utc::now();

        match existing {
            Some(record_id) => {
                let updated = self
                    .backend
                    .update(
                        tables::ATTENDANCE_RECORDS,
                        &record_id,
                        json!({ "status": status, "updated_at": now }),
                    )
                    .await?;
                let updated: AttendanceRecord = row_into(updated)?;
                if let Some(slot) = self
                    .attendance
                    .rows_mut()
                    .iter_mut()
                    .find(|r| r.id == record_id)
                {
                    *slot = updated;
                }
            }
            None => {
                let payload = NewAttendanceRecord {
                    user_id: user_id.to_string(),
                    session_id: session_id.to_string(),
                    status,
                    updated_at: now,
                };
                let created = self
                    .backend
                    .insert(tables::ATTENDANCE_RECORDS, to_row(&payload)?)
                    .await?;
                self.attendance.rows_mut().push(row_into(created)?);
            }
        }
        persist_mirror(&self.cache, ATTENDANCE_CACHE, &self.attendance);
        Ok(())
    }

    /// Delete a session and every attendance record referencing it. The
    /// records go first, so a partial failure cannot orphan them behind a
    /// deleted session.
    pub async fn delete_session_cascade(&mut self, session_id: &str) -> StoreResult<()> {
        self.sessions(false).await?;
        if !self.sessions.rows().iter().any(|s| s.id == session_id) {
            return Err(StoreError::NotFound("Session"));
        }

        let rows = self
            .backend
            .select(
                tables::ATTENDANCE_RECORDS,
                &[Filter::eq("session_id", session_id)],
                None,
            )
            .await?;
        let records: Vec<AttendanceRecord> = rows_into(rows)?;
        for record in &records {
            self.backend
                .delete(tables::ATTENDANCE_RECORDS, &record.id)
                .await?;
        }
        self.backend
            .delete(tables::COACHING_SESSIONS, session_id)
            .await?;

        self.attendance
            .rows_mut()
            .retain(|r| r.session_id != session_id);
        self.sessions.rows_mut().retain(|s| s.id != session_id);
        persist_mirror(&self.cache, SESSIONS_CACHE, &self.sessions);
        persist_mirror(&self.cache, ATTENDANCE_CACHE, &self.attendance);

        info!(session_id, "Coaching session deleted");
        Ok(())
    }

    // =========================================================================
    // Matrix
    // =========================================================================

    /// The team's attendance matrix: roster x sessions, dense.
    pub async fn attendance_matrix(&mut self, team: Team, roster: &[User]) -> StoreResult<Matrix> {
        self.sessions(false).await?;
        self.attendance(false).await?;

        let columns = self
            .sessions
            .rows()
            .iter()
            .filter(|s| s.team == team)
            .map(|s| EventColumn {
                event_id: s.id.clone(),
                date: s.date,
                label: s.coach.clone(),
            })
            .collect();

        Ok(build_matrix(team, roster, columns, |user_id, event_id| {
            self.recorded_status(user_id, event_id)
        }))
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    pub fn invalidate_sessions(&mut self) {
        self.sessions.invalidate();
        if let Err(e) = self.cache.remove(SESSIONS_CACHE) {
            warn!(error = %e, "Failed to remove sessions cache");
        }
    }

    pub fn invalidate_attendance(&mut self) {
        self.attendance.invalidate();
        if let Err(e) = self.cache.remove(ATTENDANCE_CACHE) {
            warn!(error = %e, "Failed to remove attendance cache");
        }
    }

    pub fn invalidate_all(&mut self) {
        self.invalidate_sessions();
        self.invalidate_attendance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::models::Role;

    fn test_store(name: &str) -> (Arc<MemoryStore>, CoachingStore) {
        let dir = std::env::temp_dir().join(format!("crewcache-coaching-test-{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let backend = Arc::new(MemoryStore::with_demo_data());
        let cache = Arc::new(CacheManager::new(dir).unwrap());
        let store = CoachingStore::new(backend.clone(), cache);
        (backend, store)
    }

    fn user(id: &str, role: Role, team: Team, is_captain: bool) -> User {
        User {
            id: id.to_string(),
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            role,
            team: Some(team),
            is_captain,
        }
    }

    fn samurai_captain() -> User {
        user("2", Role::Captain, Team::Samurai, true)
    }

    fn samurai_member() -> User {
        user("5", Role::Member, Team::Samurai, false)
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_is_served_from_mirror() {
        let (backend, mut store) = test_store("ttl");
        let first: Vec<CoachingSession> = store.sessions(false).await.unwrap().to_vec();
        let calls = backend.select_calls();

        // A row added behind the mirror's back must not show up yet.
        backend
            .insert(
                tables::COACHING_SESSIONS,
                serde_json::json!({
                    "date": "2025-09-01",
                    "team": "Samurai",
                    "coach": "Coach New",
                    "created_by": "2",
                    "created_at": "2025-08-01T10:00:00Z",
                }),
            )
            .await
            .unwrap();

        let second: Vec<CoachingSession> = store.sessions(false).await.unwrap().to_vec();
        assert_eq!(backend.select_calls(), calls);
        assert_eq!(first, second);

        // Force refresh does hit the backend and picks the row up.
        let forced = store.sessions(true).await.unwrap();
        assert_eq!(forced.len(), first.len() + 1);
        assert_eq!(backend.select_calls(), calls + 1);
    }

    #[tokio::test]
    async fn test_update_attendance_is_idempotent_upsert() {
        let (backend, mut store) = test_store("upsert");
        let captain = samurai_captain();

        // No record exists for the captain yet: first call inserts, the
        // repeat updates in place.
        store
            .update_attendance(&captain, "2", "11", Status::Present)
            .await
            .unwrap();
        store
            .update_attendance(&captain, "2", "11", Status::Present)
            .await
            .unwrap();

        let rows = backend
            .select(
                tables::ATTENDANCE_RECORDS,
                &[
                    Filter::eq("user_id", "2"),
                    Filter::eq("session_id", "11"),
                ],
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.status_for("2", "11"), Status::Present);
    }

    #[tokio::test]
    async fn test_past_session_gate_by_role() {
        let (_, mut store) = test_store("gate");
        // Every demo session is dated in the past.
        let err = store
            .update_attendance(&samurai_member(), "5", "10", Status::Present)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Denied(_)));

        store
            .update_attendance(&samurai_captain(), "5", "10", Status::Absent)
            .await
            .unwrap();
        assert_eq!(store.status_for("5", "10"), Status::Absent);
    }

    #[tokio::test]
    async fn test_member_can_answer_for_future_session() {
        let (_, mut store) = test_store("gate-future");
        let roster = vec![samurai_member()];
        let future = Local::now().date_naive() + chrono::Duration::days(30);
        let session = store
            .create_session(future, Team::Samurai, "Coach Sarah", "2", &roster)
            .await
            .unwrap();

        store
            .update_attendance(&samurai_member(), "5", &session.id, Status::Present)
            .await
            .unwrap();
        assert_eq!(store.status_for("5", &session.id), Status::Present);
    }

    #[tokio::test]
    async fn test_create_session_backfills_default_status() {
        let (backend, mut store) = test_store("backfill");
        let roster = vec![
            samurai_captain(),
            samurai_member(),
            user("6", Role::Member, Team::Samurai, false),
            user("7", Role::Member, Team::Gladiator, false),
        ];
        let future = Local::now().date_naive() + chrono::Duration::days(14);
        let session = store
            .create_session(future, Team::Samurai, "Coach Mike", "2", &roster)
            .await
            .unwrap();

        let rows = backend
            .select(
                tables::ATTENDANCE_RECORDS,
                &[Filter::eq("session_id", &session.id)],
                None,
            )
            .await
            .unwrap();
        // Only the three Samurai roster entries get records.
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(
                row.get("status").and_then(serde_json::Value::as_str),
                Some("undecided")
            );
        }
    }

    #[tokio::test]
    async fn test_delete_session_cascade_removes_records() {
        let (backend, mut store) = test_store("cascade");
        store.attendance(false).await.unwrap();
        assert!(!store.attendance_by_session("10").is_empty());

        store.delete_session_cascade("10").await.unwrap();

        assert!(store.attendance_by_session("10").is_empty());
        assert!(!store.cached_sessions().iter().any(|s| s.id == "10"));
        let rows = backend
            .select(
                tables::ATTENDANCE_RECORDS,
                &[Filter::eq("session_id", "10")],
                None,
            )
            .await
            .unwrap();
        assert!(rows.is_empty());

        let err = store.delete_session_cascade("10").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Session")));
    }

    #[tokio::test]
    async fn test_attendance_matrix_is_dense_and_ordered() {
        let (_, mut store) = test_store("matrix");
        let roster = vec![
            samurai_captain(),
            samurai_member(),
            user("6", Role::Member, Team::Samurai, false),
        ];
        let matrix = store
            .attendance_matrix(Team::Samurai, &roster)
            .await
            .unwrap();

        assert_eq!(matrix.rows.len(), 3);
        assert_eq!(matrix.columns.len(), 3);
        // Columns date ascending: session 12 (2024-12-10) first.
        assert_eq!(matrix.columns[0].event_id, "12");
        assert_eq!(matrix.columns[1].event_id, "10");
        assert_eq!(matrix.columns[2].event_id, "11");

        // User 5 (row 1): no record for 12, present for 10, undecided for 11.
        assert_eq!(matrix.rows[1].user_id, "5");
        assert_eq!(matrix.rows[1].statuses[0], Status::default());
        assert_eq!(matrix.rows[1].statuses[1], Status::Present);
        assert_eq!(matrix.rows[1].statuses[2], Status::Undecided);

        // The captain has no records at all.
        assert!(matrix.rows[0]
            .statuses
            .iter()
            .all(|s| *s == Status::default()));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_mirror_untouched() {
        let (_, mut store) = test_store("fetch-error");
        store.sessions(false).await.unwrap();
        let before: Vec<CoachingSession> = store.cached_sessions().to_vec();

        // Swap in a backend with a corrupt row so the refetch fails to parse.
        let broken = Arc::new(MemoryStore::new());
        broken
            .insert(tables::COACHING_SESSIONS, serde_json::json!({"date": 42}))
            .await
            .unwrap();
        store.backend = broken;

        let err = store.sessions(true).await;
        assert!(err.is_err());
        assert_eq!(store.cached_sessions(), before.as_slice());
    }

    #[tokio::test]
    async fn test_invalidate_all_empties_mirrors() {
        let (_, mut store) = test_store("invalidate");
        store.sessions(false).await.unwrap();
        store.attendance(false).await.unwrap();
        assert!(store.sessions_fresh());

        store.invalidate_all();
        assert!(!store.sessions_fresh());
        assert!(!store.attendance_fresh());
        assert!(store.cached_sessions().is_empty());
        assert!(store.cached_attendance().is_empty());
    }
}
