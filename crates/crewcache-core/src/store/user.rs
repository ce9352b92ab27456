//! Authentication and roster store.
//!
//! Owns the signed-in-user snapshot and the per-team roster mirrors. The
//! roster cache is separate from the event/status caches and short-lived;
//! membership changes are not reflected until it expires or is
//! force-refreshed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{row_into, rows_into, tables, to_row, Filter, RowStore};
use crate::auth::{password, AuthSession};
use crate::cache::{roster_ttl, CacheManager, CachedData, Mirror};
use crate::models::{NewUserRow, Role, Team, User, UserRow};

use super::{StoreError, StoreResult};

fn roster_cache_name(team: Team) -> String {
    format!("roster_{}", team.as_str().to_lowercase())
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

pub struct UserStore {
    backend: Arc<dyn RowStore>,
    cache: Arc<CacheManager>,
    auth: AuthSession,
    rosters: HashMap<Team, Mirror<User>>,
}

impl UserStore {
    pub fn new(backend: Arc<dyn RowStore>, cache: Arc<CacheManager>, data_dir: PathBuf) -> Self {
        let rosters = Team::ALL
            .iter()
            .map(|team| (*team, Mirror::new(roster_ttl())))
            .collect();
        Self {
            backend,
            cache,
            auth: AuthSession::new(data_dir),
            rosters,
        }
    }

    /// Restore the auth snapshot and persisted roster mirrors from disk.
    pub fn restore(&mut self) {
        match self.auth.load() {
            Ok(true) => info!("Restored signed-in user"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to load auth snapshot"),
        }

        for team in Team::ALL {
            match self.cache.load::<Vec<User>>(&roster_cache_name(team)) {
                Ok(Some(cached)) => {
                    if let Some(mirror) = self.rosters.get_mut(&team) {
                        mirror.restore(cached.data, cached.cached_at);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(team = %team, error = %e, "Failed to load roster cache"),
            }
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.auth.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn current_team(&self) -> Option<Team> {
        self.auth.user().and_then(|u| u.team)
    }

    /// Authenticate against the `users` table and persist the snapshot.
    pub async fn login(&mut self, email: &str, password_input: &str) -> StoreResult<User> {
        let rows = self
            .backend
            .select(tables::USERS, &[Filter::eq("email", email)], None)
            .await?;
        let row = rows_into::<UserRow>(rows)?
            .into_iter()
            .next()
            .ok_or(StoreError::InvalidCredentials)?;

        if !password::verify_password(password_input, &row.password_hash) {
            debug!(email, "Password mismatch");
            return Err(StoreError::InvalidCredentials);
        }

        let user = User::from(row);
        self.auth.update(user.clone());
        if let Err(e) = self.auth.save() {
            warn!(error = %e, "Failed to persist auth snapshot");
        }
        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    /// Create a member account and sign it in.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password_input: &str,
    ) -> StoreResult<User> {
        let problems = password::validate_password(password_input);
        if !problems.is_empty() {
            return Err(StoreError::Validation(problems.join("; ")));
        }

        let existing = self
            .backend
            .select(tables::USERS, &[Filter::eq("email", email)], None)
            .await?;
        if !existing.is_empty() {
            return Err(StoreError::Validation("Email already registered".to_string()));
        }

        let password_hash = password::hash_password(password_input)
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let payload = NewUserRow {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Member,
            team: None,
            is_captain: false,
            password_hash,
            created_at: Utc::now(),
        };
        let created = self.backend.insert(tables::USERS, to_row(&payload)?).await?;
        let user = User::from(row_into::<UserRow>(created)?);

        self.auth.update(user.clone());
        if let Err(e) = self.auth.save() {
            warn!(error = %e, "Failed to persist auth snapshot");
        }
        info!(user_id = %user.id, "Registered new member");
        Ok(user)
    }

    /// Update the signed-in user's own profile fields.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> StoreResult<User> {
        let current = self
            .auth
            .user()
            .cloned()
            .ok_or_else(|| StoreError::Denied("No user logged in".to_string()))?;

        let mut patch = serde_json::Map::new();
        if let Some(name) = update.name {
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(email) = update.email {
            patch.insert("email".to_string(), json!(email));
        }
        if patch.is_empty() {
            return Ok(current);
        }

        let row = self
            .backend
            .update(tables::USERS, &current.id, Value::Object(patch))
            .await?;
        let user = User::from(row_into::<UserRow>(row)?);

        self.auth.update(user.clone());
        if let Err(e) = self.auth.save() {
            warn!(error = %e, "Failed to persist auth snapshot");
        }
        Ok(user)
    }

    /// Move a user onto a team. Admins may assign anyone; captains only
    /// their own team.
    pub async fn assign_team(&mut self, user_id: &str, team: Team) -> StoreResult<()> {
        let caller = self
            .auth
            .user()
            .ok_or_else(|| StoreError::Denied("No user logged in".to_string()))?;
        let allowed =
            caller.is_admin() || (caller.is_team_captain() && caller.team == Some(team));
        if !allowed {
            return Err(StoreError::Denied("Unauthorized".to_string()));
        }

        self.backend
            .update(tables::USERS, user_id, json!({ "team": team }))
            .await?;
        // The roster mirror picks this up when its TTL lapses.
        Ok(())
    }

    /// Promote a user to captain of a team. Admin only.
    pub async fn assign_captain(&mut self, user_id: &str, team: Team) -> StoreResult<()> {
        let caller = self
            .auth
            .user()
            .ok_or_else(|| StoreError::Denied("No user logged in".to_string()))?;
        if !caller.is_admin() {
            return Err(StoreError::Denied(
                "Only admins can assign captain role".to_string(),
            ));
        }

        self.backend
            .update(
                tables::USERS,
                user_id,
                json!({ "role": Role::Captain, "team": team, "is_captain": true }),
            )
            .await?;
        Ok(())
    }

    /// The team roster, served from the short-lived roster cache.
    pub async fn roster(&mut self, team: Team, force: bool) -> StoreResult<Vec<User>> {
        let fresh = self
            .rosters
            .get(&team)
            .map(|mirror| mirror.is_fresh())
            .unwrap_or(false);
        if !force && fresh {
            debug!(team = %team, "Roster cache hit");
            return Ok(self.rosters[&team].rows().to_vec());
        }

        let rows = self
            .backend
            .select(tables::USERS, &[Filter::eq("team", team.as_str())], None)
            .await?;
        let users: Vec<User> = rows_into::<UserRow>(rows)?
            .into_iter()
            .map(User::from)
            .collect();

        if let Some(mirror) = self.rosters.get_mut(&team) {
            mirror.replace(users.clone());
            let snapshot = CachedData {
                data: users.clone(),
                cached_at: mirror.fetched_at().unwrap_or_else(Utc::now),
            };
            if let Err(e) = self.cache.save(&roster_cache_name(team), &snapshot) {
                warn!(team = %team, error = %e, "Failed to persist roster cache");
            }
        }
        Ok(users)
    }

    pub fn roster_is_fresh(&self, team: Team) -> bool {
        self.rosters
            .get(&team)
            .map(|mirror| mirror.is_fresh())
            .unwrap_or(false)
    }

    /// Clear every roster mirror and its persisted snapshot.
    pub fn invalidate_rosters(&mut self) {
        for team in Team::ALL {
            if let Some(mirror) = self.rosters.get_mut(&team) {
                mirror.invalidate();
            }
            if let Err(e) = self.cache.remove(&roster_cache_name(team)) {
                warn!(team = %team, error = %e, "Failed to remove roster cache");
            }
        }
    }

    /// Drop the signed-in user and all roster caches.
    pub fn logout(&mut self) {
        if let Err(e) = self.auth.clear() {
            warn!(error = %e, "Failed to clear auth snapshot");
        }
        self.invalidate_rosters();
        info!("Logged out");
    }
}
