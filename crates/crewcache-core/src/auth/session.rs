use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Auth snapshot file name in the data directory.
const AUTH_FILE: &str = "auth.json";

/// The authenticated-user snapshot persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub user: User,
    pub is_authenticated: bool,
    pub signed_in_at: DateTime<Utc>,
}

/// Durable authentication state: who is signed in, surviving restarts
/// until an explicit logout. No token is involved; the snapshot is the
/// client's own record of a verified login.
pub struct AuthSession {
    data_dir: PathBuf,
    pub data: Option<AuthSnapshot>,
}

impl AuthSession {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            data: None,
        }
    }

    /// Load the snapshot from disk. Returns true when a signed-in user was
    /// restored.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.auth_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read auth snapshot")?;
            let snapshot: AuthSnapshot =
                serde_json::from_str(&contents).context("Failed to parse auth snapshot")?;

            if snapshot.is_authenticated {
                self.data = Some(snapshot);
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.auth_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Drop the snapshot and its file.
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.auth_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Record a verified login.
    pub fn update(&mut self, user: User) {
        self.data = Some(AuthSnapshot {
            user,
            is_authenticated: true,
            signed_in_at: Utc::now(),
        });
    }

    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.as_ref().map(|d| d.is_authenticated).unwrap_or(false)
    }

    fn auth_path(&self) -> PathBuf {
        self.data_dir.join(AUTH_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Team};

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crewcache-auth-test-{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_user() -> User {
        User {
            id: "5".to_string(),
            name: "Samurai Member".to_string(),
            email: "member1@example.com".to_string(),
            role: Role::Member,
            team: Some(Team::Samurai),
            is_captain: false,
        }
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let dir = test_dir("reload");
        let mut session = AuthSession::new(dir.clone());
        session.update(sample_user());
        session.save().unwrap();

        let mut restored = AuthSession::new(dir);
        assert!(restored.load().unwrap());
        assert_eq!(restored.user().unwrap().id, "5");
        assert!(restored.is_authenticated());
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let dir = test_dir("clear");
        let mut session = AuthSession::new(dir.clone());
        session.update(sample_user());
        session.save().unwrap();
        session.clear().unwrap();

        assert!(!session.is_authenticated());
        let mut restored = AuthSession::new(dir);
        assert!(!restored.load().unwrap());
    }
}
