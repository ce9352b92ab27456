//! Shows, performance dates, assignments, and availability.
//!
//! Four mirrored tables. Assignment is bounded by each show date's
//! `max_members`; availability updates pass the same past-event gate as
//! attendance. Deleting a show or a show date cascades through the
//! dependent rows in one named operation.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::{row_into, rows_into, tables, to_row, Filter, Order, RowStore};
use crate::cache::{default_ttl, CacheManager, Mirror};
use crate::models::{
    NewShow, NewShowAssignment, NewShowAvailability, NewShowDate, Show, ShowAssignment,
    ShowAvailability, ShowDate, Status, Team, User,
};

use super::matrix::{build_matrix, EventColumn, Matrix};
use super::{gate, persist_mirror, restore_mirror, StoreError, StoreResult};

const SHOWS_CACHE: &str = "shows";
const SHOW_DATES_CACHE: &str = "show_dates";
const ASSIGNMENTS_CACHE: &str = "show_assignments";
const AVAILABILITY_CACHE: &str = "show_availability";

/// Cap applied to newly created show dates.
const DEFAULT_MAX_MEMBERS: u32 = 5;

pub struct ShowStore {
    backend: Arc<dyn RowStore>,
    cache: Arc<CacheManager>,
    shows: Mirror<Show>,
    show_dates: Mirror<ShowDate>,
    assignments: Mirror<ShowAssignment>,
    availability: Mirror<ShowAvailability>,
}

impl ShowStore {
    pub fn new(backend: Arc<dyn RowStore>, cache: Arc<CacheManager>) -> Self {
        Self {
            backend,
            cache,
            shows: Mirror::new(default_ttl()),
            show_dates: Mirror::new(default_ttl()),
            assignments: Mirror::new(default_ttl()),
            availability: Mirror::new(default_ttl()),
        }
    }

    /// Restore persisted mirrors and their fetch stamps.
    pub fn restore(&mut self) {
        restore_mirror(&self.cache, SHOWS_CACHE, &mut self.shows);
        restore_mirror(&self.cache, SHOW_DATES_CACHE, &mut self.show_dates);
        restore_mirror(&self.cache, ASSIGNMENTS_CACHE, &mut self.assignments);
        restore_mirror(&self.cache, AVAILABILITY_CACHE, &mut self.availability);
    }

    // =========================================================================
    // Fetch (impure: may hit the backend)
    // =========================================================================

    pub async fn shows(&mut self, force: bool) -> StoreResult<&[Show]> {
        if !force && self.shows.is_fresh() {
            debug!(entity = SHOWS_CACHE, "Cache hit");
            return Ok(self.shows.rows());
        }
        let rows = self.backend.select(tables::SHOWS, &[], None).await?;
        self.shows.replace(rows_into::<Show>(rows)?);
        persist_mirror(&self.cache, SHOWS_CACHE, &self.shows);
        Ok(self.shows.rows())
    }

    pub async fn show_dates(&mut self, force: bool) -> StoreResult<&[ShowDate]> {
        if !force && self.show_dates.is_fresh() {
            debug!(entity = SHOW_DATES_CACHE, "Cache hit");
            return Ok(self.show_dates.rows());
        }
        let rows = self
            .backend
            .select(tables::SHOW_DATES, &[], Some(Order::asc("date")))
            .await?;
        self.show_dates.replace(rows_into::<ShowDate>(rows)?);
        persist_mirror(&self.cache, SHOW_DATES_CACHE, &self.show_dates);
        Ok(self.show_dates.rows())
    }

    pub async fn assignments(&mut self, force: bool) -> StoreResult<&[ShowAssignment]> {
        if !force && self.assignments.is_fresh() {
            debug!(entity = ASSIGNMENTS_CACHE, "Cache hit");
            return Ok(self.assignments.rows());
        }
        let rows = self
            .backend
            .select(tables::SHOW_ASSIGNMENTS, &[], None)
            .await?;
        self.assignments.replace(rows_into::<ShowAssignment>(rows)?);
        persist_mirror(&self.cache, ASSIGNMENTS_CACHE, &self.assignments);
        Ok(self.assignments.rows())
    }

    pub async fn availability(&mut self, force: bool) -> StoreResult<&[ShowAvailability]> {
        if !force && self.availability.is_fresh() {
            debug!(entity = AVAILABILITY_CACHE, "Cache hit");
            return Ok(self.availability.rows());
        }
        let rows = self
            .backend
            .select(tables::SHOW_AVAILABILITY, &[], None)
            .await?;
        self.availability
            .replace(rows_into::<ShowAvailability>(rows)?);
        persist_mirror(&self.cache, AVAILABILITY_CACHE, &self.availability);
        Ok(self.availability.rows())
    }

    /// Refresh all four mirrors, issuing the fetches together. Individual
    /// failures are logged; the other mirrors still update.
    pub async fn refresh_all(&mut self) {
        let shows_fut = self.backend.select(tables::SHOWS, &[], None);
        let dates_fut = self
            .backend
            .select(tables::SHOW_DATES, &[], Some(Order::asc("date")));
        let assignments_fut = self.backend.select(tables::SHOW_ASSIGNMENTS, &[], None);
        let availability_fut = self.backend.select(tables::SHOW_AVAILABILITY, &[], None);
        let (shows_res, dates_res, assignments_res, availability_res) =
            futures::join!(shows_fut, dates_fut, assignments_fut, availability_fut);

        match shows_res.and_then(rows_into::<Show>) {
            Ok(rows) => {
                self.shows.replace(rows);
                persist_mirror(&self.cache, SHOWS_CACHE, &self.shows);
            }
            Err(e) => warn!(error = %e, "Failed to refresh shows"),
        }
        match dates_res.and_then(rows_into::<ShowDate>) {
            Ok(rows) => {
                self.show_dates.replace(rows);
                persist_mirror(&self.cache, SHOW_DATES_CACHE, &self.show_dates);
            }
            Err(e) => warn!(error = %e, "Failed to refresh show dates"),
        }
        match assignments_res.and_then(rows_into::<ShowAssignment>) {
            Ok(rows) => {
                self.assignments.replace(rows);
                persist_mirror(&self.cache, ASSIGNMENTS_CACHE, &self.assignments);
            }
            Err(e) => warn!(error = %e, "Failed to refresh show assignments"),
        }
        match availability_res.and_then(rows_into::<ShowAvailability>) {
            Ok(rows) => {
                self.availability.replace(rows);
                persist_mirror(&self.cache, AVAILABILITY_CACHE, &self.availability);
            }
            Err(e) => warn!(error = %e, "Failed to refresh show availability"),
        }
    }

    // =========================================================================
    // Pure mirror lookups
    // =========================================================================

    pub fn cached_shows(&self) -> &[Show] {
        self.shows.rows()
    }

    pub fn cached_show_dates(&self) -> &[ShowDate] {
        self.show_dates.rows()
    }

    pub fn shows_by_team(&self, team: Team) -> Vec<&Show> {
        self.shows.rows().iter().filter(|s| s.team == team).collect()
    }

    pub fn dates_for_show(&self, show_id: &str) -> Vec<&ShowDate> {
        self.show_dates
            .rows()
            .iter()
            .filter(|d| d.show_id == show_id)
            .collect()
    }

    pub fn show_by_id(&self, show_id: &str) -> Option<&Show> {
        self.shows.rows().iter().find(|s| s.id == show_id)
    }

    pub fn show_date_by_id(&self, show_date_id: &str) -> Option<&ShowDate> {
        self.show_dates.rows().iter().find(|d| d.id == show_date_id)
    }

    pub fn assignments_for(&self, show_date_id: &str) -> Vec<&ShowAssignment> {
        self.assignments
            .rows()
            .iter()
            .filter(|a| a.show_date_id == show_date_id)
            .collect()
    }

    fn recorded_status(&self, user_id: &str, show_date_id: &str) -> Option<Status> {
        self.availability
            .rows()
            .iter()
            .find(|r| r.user_id == user_id && r.show_date_id == show_date_id)
            .map(|r| r.status)
    }

    /// A member's availability for a show date, defaulting when no record
    /// exists.
    pub fn availability_for(&self, user_id: &str, show_date_id: &str) -> Status {
        self.recorded_status(user_id, show_date_id).unwrap_or_default()
    }

    pub fn shows_fresh(&self) -> bool {
        self.shows.is_fresh()
    }

    pub fn availability_fresh(&self) -> bool {
        self.availability.is_fresh()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create_show(
        &mut self,
        name: &str,
        team: Team,
        created_by: &str,
    ) -> StoreResult<Show> {
        let payload = NewShow {
            name: name.to_string(),
            team,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        let created = self.backend.insert(tables::SHOWS, to_row(&payload)?).await?;
        let show: Show = row_into(created)?;
        self.shows.rows_mut().push(show.clone());
        persist_mirror(&self.cache, SHOWS_CACHE, &self.shows);
        info!(show_id = %show.id, team = %team, "Show created");
        Ok(show)
    }

    pub async fn create_show_date(
        &mut self,
        show_id: &str,
        date: NaiveDate,
        created_by: &str,
    ) -> StoreResult<ShowDate> {
        self.shows(false).await?;
        if self.show_by_id(show_id).is_none() {
            return Err(StoreError::NotFound("Show"));
        }

        let payload = NewShowDate {
            show_id: show_id.to_string(),
            date,
            max_members: DEFAULT_MAX_MEMBERS,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        let created = self
            .backend
            .insert(tables::SHOW_DATES, to_row(&payload)?)
            .await?;
        let show_date: ShowDate = row_into(created)?;
        self.show_dates.rows_mut().push(show_date.clone());
        self.show_dates.rows_mut().sort_by(|a, b| a.date.cmp(&b.date));
        persist_mirror(&self.cache, SHOW_DATES_CACHE, &self.show_dates);
        Ok(show_date)
    }

    /// Move a show date to a different calendar date.
    pub async fn update_show_date(
        &mut self,
        show_date_id: &str,
        date: NaiveDate,
    ) -> StoreResult<ShowDate> {
        self.show_dates(false).await?;
        if self.show_date_by_id(show_date_id).is_none() {
            return Err(StoreError::NotFound("Show date"));
        }

        let updated = self
            .backend
            .update(tables::SHOW_DATES, show_date_id, json!({ "date": date }))
            .await?;
        let updated: ShowDate = row_into(updated)?;
        if let Some(slot) = self
            .show_dates
            .rows_mut()
            .iter_mut()
            .find(|d| d.id == show_date_id)
        {
            *slot = updated.clone();
        }
        self.show_dates.rows_mut().sort_by(|a, b| a.date.cmp(&b.date));
        persist_mirror(&self.cache, SHOW_DATES_CACHE, &self.show_dates);
        Ok(updated)
    }

    /// Book a member onto a show date, bounded by its `max_members`.
    /// Booking someone already assigned is a no-op.
    pub async fn assign_member(&mut self, show_date_id: &str, user_id: &str) -> StoreResult<()> {
        self.show_dates(false).await?;
        self.assignments(false).await?;

        let max_members = self
            .show_date_by_id(show_date_id)
            .map(|d| d.max_members)
            .ok_or(StoreError::NotFound("Show date"))?;

        let assigned = self.assignments_for(show_date_id);
        if assigned.iter().any(|a| a.user_id == user_id) {
            return Ok(());
        }
        if assigned.len() as u32 >= max_members {
            return Err(StoreError::Denied(
                "Maximum members already assigned".to_string(),
            ));
        }

        let payload = NewShowAssignment {
            show_date_id: show_date_id.to_string(),
            user_id: user_id.to_string(),
        };
        let created = self
            .backend
            .insert(tables::SHOW_ASSIGNMENTS, to_row(&payload)?)
            .await?;
        self.assignments.rows_mut().push(row_into(created)?);
        persist_mirror(&self.cache, ASSIGNMENTS_CACHE, &self.assignments);
        Ok(())
    }

    /// Release a member from a show date. Removing someone who is not
    /// assigned is a no-op.
    pub async fn remove_member(&mut self, show_date_id: &str, user_id: &str) -> StoreResult<()> {
        self.show_dates(false).await?;
        if self.show_date_by_id(show_date_id).is_none() {
            return Err(StoreError::NotFound("Show date"));
        }
        self.assignments(false).await?;

        let existing = self
            .assignments
            .rows()
            .iter()
            .find(|a| a.show_date_id == show_date_id && a.user_id == user_id)
            .map(|a| a.id.clone());
        let Some(assignment_id) = existing else {
            return Ok(());
        };

        self.backend
            .delete(tables::SHOW_ASSIGNMENTS, &assignment_id)
            .await?;
        self.assignments
            .rows_mut()
            .retain(|a| a.id != assignment_id);
        persist_mirror(&self.cache, ASSIGNMENTS_CACHE, &self.assignments);
        Ok(())
    }

    /// Record a member's availability for a show date, subject to the
    /// past-event gate. Upserts: at most one record per (user, date) pair.
    pub async fn update_availability(
        &mut self,
        caller: &User,
        user_id: &str,
        show_date_id: &str,
        status: Status,
    ) -> StoreResult<()> {
        self.show_dates(false).await?;
        let event_date = self
            .show_date_by_id(show_date_id)
            .map(|d| d.date)
            .ok_or(StoreError::NotFound("Show date"))?;
        gate::check_status_update(event_date, Local::now().date_naive(), caller)?;

        self.availability(false).await?;
        let existing = self
            .availability
            .rows()
            .iter()
            .find(|r| r.user_id == user_id && r.show_date_id == show_date_id)
            .map(|r| r.id.clone());
        let now = Utc::now();

        match existing {
            Some(record_id) => {
                let updated = self
                    .backend
                    .update(
                        tables::SHOW_AVAILABILITY,
                        &record_id,
                        json!({ "status": status, "updated_at": now }),
                    )
                    .await?;
                let updated: ShowAvailability = row_into(updated)?;
                if let Some(slot) = self
                    .availability
                    .rows_mut()
                    .iter_mut()
                    .find(|r| r.id == record_id)
                {
                    *slot = updated;
                }
            }
            None => {
                let payload = NewShowAvailability {
                    user_id: user_id.to_string(),
                    show_date_id: show_date_id.to_string(),
                    status,
                    updated_at: now,
                };
                let created = self
                    .backend
                    .insert(tables::SHOW_AVAILABILITY, to_row(&payload)?)
                    .await?;
                self.availability.rows_mut().push(row_into(created)?);
            }
        }
        persist_mirror(&self.cache, AVAILABILITY_CACHE, &self.availability);
        Ok(())
    }

    /// Delete a show date with its assignments and availability records.
    pub async fn delete_show_date_cascade(&mut self, show_date_id: &str) -> StoreResult<()> {
        self.show_dates(false).await?;
        if self.show_date_by_id(show_date_id).is_none() {
            return Err(StoreError::NotFound("Show date"));
        }

        self.delete_date_children(show_date_id).await?;
        self.backend.delete(tables::SHOW_DATES, show_date_id).await?;

        self.apply_date_removal(show_date_id);
        self.persist_date_mirrors();
        info!(show_date_id, "Show date deleted");
        Ok(())
    }

    /// Delete a show, all of its dates, and everything hanging off them.
    /// Children go first at every level, so no orphaned row survives a
    /// partial failure.
    pub async fn delete_show_cascade(&mut self, show_id: &str) -> StoreResult<()> {
        self.shows(false).await?;
        if self.show_by_id(show_id).is_none() {
            return Err(StoreError::NotFound("Show"));
        }

        let rows = self
            .backend
            .select(tables::SHOW_DATES, &[Filter::eq("show_id", show_id)], None)
            .await?;
        let dates: Vec<ShowDate> = rows_into(rows)?;
        for date in &dates {
            self.delete_date_children(&date.id).await?;
            self.backend.delete(tables::SHOW_DATES, &date.id).await?;
            self.apply_date_removal(&date.id);
        }
        self.backend.delete(tables::SHOWS, show_id).await?;

        self.shows.rows_mut().retain(|s| s.id != show_id);
        persist_mirror(&self.cache, SHOWS_CACHE, &self.shows);
        self.persist_date_mirrors();
        info!(show_id, "Show deleted");
        Ok(())
    }

    /// Delete the assignments and availability records of one show date on
    /// the backend.
    async fn delete_date_children(&self, show_date_id: &str) -> StoreResult<()> {
        let filter = [Filter::eq("show_date_id", show_date_id)];
        let assignments: Vec<ShowAssignment> = rows_into(
            self.backend
                .select(tables::SHOW_ASSIGNMENTS, &filter, None)
                .await?,
        )?;
        for assignment in &assignments {
            self.backend
                .delete(tables::SHOW_ASSIGNMENTS, &assignment.id)
                .await?;
        }

        let records: Vec<ShowAvailability> = rows_into(
            self.backend
                .select(tables::SHOW_AVAILABILITY, &filter, None)
                .await?,
        )?;
        for record in &records {
            self.backend
                .delete(tables::SHOW_AVAILABILITY, &record.id)
                .await?;
        }
        Ok(())
    }

    /// Drop one show date and its dependents from the mirrors.
    fn apply_date_removal(&mut self, show_date_id: &str) {
        self.assignments
            .rows_mut()
            .retain(|a| a.show_date_id != show_date_id);
        self.availability
            .rows_mut()
            .retain(|r| r.show_date_id != show_date_id);
        self.show_dates.rows_mut().retain(|d| d.id != show_date_id);
    }

    fn persist_date_mirrors(&self) {
        persist_mirror(&self.cache, SHOW_DATES_CACHE, &self.show_dates);
        persist_mirror(&self.cache, ASSIGNMENTS_CACHE, &self.assignments);
        persist_mirror(&self.cache, AVAILABILITY_CACHE, &self.availability);
    }

    // =========================================================================
    // Matrix
    // =========================================================================

    /// The team's availability matrix: roster x show dates of the team's
    /// shows, dense, columns labelled with the show name.
    pub async fn availability_matrix(
        &mut self,
        team: Team,
        roster: &[User],
    ) -> StoreResult<Matrix> {
        self.shows(false).await?;
        self.show_dates(false).await?;
        self.availability(false).await?;

        let columns = self
            .show_dates
            .rows()
            .iter()
            .filter(|date| {
                self.show_by_id(&date.show_id)
                    .map(|show| show.team == team)
                    .unwrap_or(false)
            })
            .map(|date| EventColumn {
                event_id: date.id.clone(),
                date: date.date,
                label: self
                    .show_by_id(&date.show_id)
                    .map(|show| show.name.clone())
                    .unwrap_or_else(|| "Unknown Show".to_string()),
            })
            .collect();

        Ok(build_matrix(team, roster, columns, |user_id, event_id| {
            self.recorded_status(user_id, event_id)
        }))
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    pub fn invalidate_shows(&mut self) {
        self.shows.invalidate();
        if let Err(e) = self.cache.remove(SHOWS_CACHE) {
            warn!(error = %e, "Failed to remove shows cache");
        }
    }

    pub fn invalidate_show_dates(&mut self) {
        self.show_dates.invalidate();
        if let Err(e) = self.cache.remove(SHOW_DATES_CACHE) {
            warn!(error = %e, "Failed to remove show dates cache");
        }
    }

    pub fn invalidate_assignments(&mut self) {
        self.assignments.invalidate();
        if let Err(e) = self.cache.remove(ASSIGNMENTS_CACHE) {
            warn!(error = %e, "Failed to remove assignments cache");
        }
    }

    pub fn invalidate_availability(&mut self) {
        self.availability.invalidate();
        if let Err(e) = self.cache.remove(AVAILABILITY_CACHE) {
            warn!(error = %e, "Failed to remove availability cache");
        }
    }

    pub fn invalidate_all(&mut self) {
        self.invalidate_shows();
        self.invalidate_show_dates();
        self.invalidate_assignments();
        self.invalidate_availability();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::models::Role;

    fn test_store(name: &str) -> (Arc<MemoryStore>, ShowStore) {
        let dir = std::env::temp_dir().join(format!("crewcache-shows-test-{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let backend = Arc::new(MemoryStore::with_demo_data());
        let cache = Arc::new(CacheManager::new(dir).unwrap());
        let store = ShowStore::new(backend.clone(), cache);
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

    #[tokio::test]
    async fn test_assign_member_respects_max_members() {
        let (_, mut store) = test_store("assign-cap");
        // Date 40 starts with members 5 and 6 assigned, max 5.
        store.assign_member("40", "2").await.unwrap();
        store.assign_member("40", "7").await.unwrap();
        store.assign_member("40", "8").await.unwrap();

        let err = store.assign_member("40", "1").await.unwrap_err();
        match err {
            StoreError::Denied(msg) => assert_eq!(msg, "Maximum members already assigned"),
            other => panic!("expected Denied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_assign_member_twice_is_noop() {
        let (backend, mut store) = test_store("assign-dup");
        store.assign_member("42", "8").await.unwrap();
        store.assign_member("42", "8").await.unwrap();

        let rows = backend
            .select(
                tables::SHOW_ASSIGNMENTS,
                &[
                    Filter::eq("show_date_id", "42"),
                    Filter::eq("user_id", "8"),
                ],
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_member_is_noop_when_absent() {
        let (_, mut store) = test_store("remove");
        store.remove_member("40", "5").await.unwrap();
        assert!(store.assignments_for("40").iter().all(|a| a.user_id != "5"));
        // Removing again succeeds without touching anything.
        store.remove_member("40", "5").await.unwrap();

        let err = store.remove_member("999", "5").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Show date")));
    }

    #[tokio::test]
    async fn test_update_availability_gate_and_upsert() {
        let (backend, mut store) = test_store("availability");
        let member = user("5", Role::Member, Team::Samurai, false);
        let captain = user("2", Role::Captain, Team::Samurai, true);

        // Date 41 is in the past: members are gated, captains are not.
        let err = store
            .update_availability(&member, "5", "41", Status::Present)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Denied(_)));

        store
            .update_availability(&captain, "5", "41", Status::Present)
            .await
            .unwrap();
        store
            .update_availability(&captain, "5", "41", Status::Absent)
            .await
            .unwrap();

        let rows = backend
            .select(
                tables::SHOW_AVAILABILITY,
                &[
                    Filter::eq("user_id", "5"),
                    Filter::eq("show_date_id", "41"),
                ],
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.availability_for("5", "41"), Status::Absent);
    }

    #[tokio::test]
    async fn test_delete_show_cascade_removes_dates_and_dependents() {
        let (backend, mut store) = test_store("show-cascade");
        store.delete_show_cascade("30").await.unwrap();

        assert!(store.show_by_id("30").is_none());
        assert!(store.dates_for_show("30").is_empty());
        for table in [
            tables::SHOW_DATES,
            tables::SHOW_ASSIGNMENTS,
            tables::SHOW_AVAILABILITY,
        ] {
            let rows = backend.select(table, &[], None).await.unwrap();
            for row in rows {
                // Nothing referencing show 30's dates (40, 41) survives.
                let date_id = row
                    .get("show_date_id")
                    .or_else(|| row.get("id"))
                    .and_then(serde_json::Value::as_str)
                    .unwrap();
                assert!(date_id != "40" && date_id != "41");
            }
        }

        let err = store.delete_show_cascade("30").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Show")));
    }

    #[tokio::test]
    async fn test_delete_show_date_cascade() {
        let (backend, mut store) = test_store("date-cascade");
        store.availability(false).await.unwrap();
        store.assignments(false).await.unwrap();

        store.delete_show_date_cascade("40").await.unwrap();

        assert!(store.show_date_by_id("40").is_none());
        assert!(store.assignments_for("40").is_empty());
        assert_eq!(store.availability_for("5", "40"), Status::default());
        let rows = backend
            .select(
                tables::SHOW_AVAILABILITY,
                &[Filter::eq("show_date_id", "40")],
                None,
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
        // The parent show and its other date are untouched.
        assert!(store.show_by_id("30").is_some());
        assert!(store.show_date_by_id("41").is_some());
    }

    #[tokio::test]
    async fn test_create_show_date_requires_existing_show() {
        let (_, mut store) = test_store("create-date");
        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let err = store.create_show_date("999", date, "2").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Show")));

        let created = store.create_show_date("30", date, "2").await.unwrap();
        assert_eq!(created.max_members, DEFAULT_MAX_MEMBERS);
        assert_eq!(created.show_id, "30");
    }

    #[tokio::test]
    async fn test_availability_matrix_labels_columns_with_show_names() {
        let (_, mut store) = test_store("matrix");
        let roster = vec![
            user("2", Role::Captain, Team::Samurai, true),
            user("5", Role::Member, Team::Samurai, false),
            user("6", Role::Member, Team::Samurai, false),
        ];
        let matrix = store
            .availability_matrix(Team::Samurai, &roster)
            .await
            .unwrap();

        // Winter Performance has dates 41 (2024-12-15) and 40 (2025-02-15).
        assert_eq!(matrix.rows.len(), 3);
        assert_eq!(matrix.columns.len(), 2);
        assert_eq!(matrix.columns[0].event_id, "41");
        assert_eq!(matrix.columns[1].event_id, "40");
        assert!(matrix
            .columns
            .iter()
            .all(|c| c.label == "Winter Performance"));

        // User 5 answered present for date 40 and nothing for 41.
        assert_eq!(matrix.rows[1].user_id, "5");
        assert_eq!(matrix.rows[1].statuses[0], Status::default());
        assert_eq!(matrix.rows[1].statuses[1], Status::Present);
    }

    #[tokio::test]
    async fn test_update_show_date_moves_the_date() {
        let (_, mut store) = test_store("update-date");
        let new_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let updated = store.update_show_date("42", new_date).await.unwrap();
        assert_eq!(updated.date, new_date);
        assert_eq!(store.show_date_by_id("42").unwrap().date, new_date);

        let err = store
            .update_show_date("999", new_date)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Show date")));
    }
}
