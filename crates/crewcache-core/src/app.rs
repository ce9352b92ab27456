//! Composition root.
//!
//! [`App`] owns the configuration, the backend handle, and the three
//! stores, and wires them to a shared cache manager. All cross-store
//! operations live here: the joint bootstrap fetch, roster-fed matrix
//! construction, session creation with backfill, and the logout sweep that
//! invalidates every cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::api::{ApiClient, MemoryStore, RowStore};
use crate::cache::CacheManager;
use crate::config::Config;
use crate::models::{CoachingSession, Team};
use crate::store::{CoachingStore, Matrix, ShowStore, StoreError, StoreResult, UserStore};

/// Entity caches addressable through [`App::invalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEntity {
    Sessions,
    Attendance,
    Shows,
    ShowDates,
    Assignments,
    Availability,
    Rosters,
}

pub struct App {
    pub config: Config,
    pub users: UserStore,
    pub coaching: CoachingStore,
    pub shows: ShowStore,
}

impl App {
    /// Assemble the stores around an injected backend, restoring persisted
    /// mirrors and the auth snapshot.
    pub fn new(config: Config, backend: Arc<dyn RowStore>) -> Result<Self> {
        let cache = Arc::new(
            CacheManager::new(config.cache_dir()?).context("Failed to open cache directory")?,
        );
        let data_dir = config.data_dir()?;

        let mut users = UserStore::new(backend.clone(), cache.clone(), data_dir);
        let mut coaching = CoachingStore::new(backend.clone(), cache.clone());
        let mut shows = ShowStore::new(backend, cache);
        users.restore();
        coaching.restore();
        shows.restore();

        Ok(Self {
            config,
            users,
            coaching,
            shows,
        })
    }

    /// Connect to the hosted backend named by the configuration.
    pub fn connect(config: Config) -> Result<Self> {
        let backend = ApiClient::new(&config.backend_url, &config.api_key)
            .context("Failed to create backend client")?;
        Self::new(config, Arc::new(backend))
    }

    /// The demo application: seeded in-memory backend, isolated profile.
    pub fn demo() -> Result<Self> {
        Self::new(Config::demo(), Arc::new(MemoryStore::with_demo_data()))
    }

    /// Refresh every mirror, issuing the fetches together and awaiting them
    /// jointly. Entity types fail independently; partial population is
    /// accepted and logged by the stores.
    pub async fn bootstrap(&mut self) {
        info!("Refreshing all mirrors");
        futures::join!(self.coaching.refresh_all(), self.shows.refresh_all());
    }

    /// The team's attendance matrix, roster served from the roster cache.
    pub async fn attendance_matrix(&mut self, team: Team) -> StoreResult<Matrix> {
        let roster = self.users.roster(team, false).await?;
        self.coaching.attendance_matrix(team, &roster).await
    }

    /// The team's availability matrix, roster served from the roster cache.
    pub async fn availability_matrix(&mut self, team: Team) -> StoreResult<Matrix> {
        let roster = self.users.roster(team, false).await?;
        self.shows.availability_matrix(team, &roster).await
    }

    /// Create a coaching session as the signed-in user, backfilling a
    /// default-status record for each roster member.
    pub async fn create_session(
        &mut self,
        date: NaiveDate,
        team: Team,
        coach: &str,
    ) -> StoreResult<CoachingSession> {
        let creator = self
            .users
            .current_user()
            .cloned()
            .ok_or_else(|| StoreError::Denied("No user logged in".to_string()))?;
        let roster = self.users.roster(team, false).await?;
        self.coaching
            .create_session(date, team, coach, &creator.id, &roster)
            .await
    }

    /// Clear one entity cache: mirror rows, fetch stamp, and persisted file.
    pub fn invalidate(&mut self, entity: CacheEntity) {
        match entity {
            CacheEntity::Sessions => self.coaching.invalidate_sessions(),
            CacheEntity::Attendance => self.coaching.invalidate_attendance(),
            CacheEntity::Shows => self.shows.invalidate_shows(),
            CacheEntity::ShowDates => self.shows.invalidate_show_dates(),
            CacheEntity::Assignments => self.shows.invalidate_assignments(),
            CacheEntity::Availability => self.shows.invalidate_availability(),
            CacheEntity::Rosters => self.users.invalidate_rosters(),
        }
    }

    /// Clear every entity cache.
    pub fn invalidate_all(&mut self) {
        self.coaching.invalidate_all();
        self.shows.invalidate_all();
        self.users.invalidate_rosters();
    }

    /// Sign out and drop every cache, roster mirrors included.
    pub fn logout(&mut self) {
        self.users.logout();
        self.coaching.invalidate_all();
        self.shows.invalidate_all();
    }
}
