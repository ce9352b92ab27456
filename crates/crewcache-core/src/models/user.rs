use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access level stored in the `role` column of the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Captain,
    Member,
}

/// The three performance teams. Serialized capitalized, matching the
/// backend's `team` enum column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Samurai,
    Gladiator,
    Viking,
}

impl Team {
    pub const ALL: [Team; 3] = [Team::Samurai, Team::Gladiator, Team::Viking];

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Samurai => "Samurai",
            Team::Gladiator => "Gladiator",
            Team::Viking => "Viking",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "samurai" => Ok(Team::Samurai),
            "gladiator" => Ok(Team::Gladiator),
            "viking" => Ok(Team::Viking),
            other => Err(format!("Unknown team: {}", other)),
        }
    }
}

/// Full `users` row as returned by the backend.
///
/// Carries the password hash, so it never leaves this crate; everything
/// user-facing goes through [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team: Option<Team>,
    pub is_captain: bool,
    pub password_hash: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for `users`; the backend assigns the id.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewUserRow {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team: Option<Team>,
    pub is_captain: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A team member as the rest of the application sees them.
///
/// Admins have no team; everyone else belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team: Option<Team>,
    pub is_captain: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Captains are either users with the captain role or members carrying
    /// the `is_captain` flag.
    pub fn is_team_captain(&self) -> bool {
        self.role == Role::Captain || self.is_captain
    }

    /// Admin dashboard access: admins plus captains.
    pub fn can_access_admin(&self) -> bool {
        self.is_admin() || self.is_team_captain()
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            team: row.team,
            is_captain: row.is_captain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(role: Role, is_captain: bool) -> User {
        User {
            id: "1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            team: Some(Team::Samurai),
            is_captain,
        }
    }

    #[test]
    fn test_captain_by_role_or_flag() {
        assert!(member(Role::Captain, false).is_team_captain());
        assert!(member(Role::Member, true).is_team_captain());
        assert!(!member(Role::Member, false).is_team_captain());
    }

    #[test]
    fn test_admin_access() {
        assert!(member(Role::Admin, false).can_access_admin());
        assert!(member(Role::Captain, false).can_access_admin());
        assert!(!member(Role::Member, false).can_access_admin());
    }

    #[test]
    fn test_team_round_trips_through_serde() {
        let json = serde_json::to_string(&Team::Gladiator).unwrap();
        assert_eq!(json, "\"Gladiator\"");
        let team: Team = serde_json::from_str(&json).unwrap();
        assert_eq!(team, Team::Gladiator);
    }

    #[test]
    fn test_team_from_str_is_case_insensitive() {
        assert_eq!("viking".parse::<Team>().unwrap(), Team::Viking);
        assert!("pirates".parse::<Team>().is_err());
    }

    #[test]
    fn test_user_row_hides_hash_from_user() {
        let row = UserRow {
            id: "7".to_string(),
            name: "Gladiator Member".to_string(),
            email: "member3@example.com".to_string(),
            role: Role::Member,
            team: Some(Team::Gladiator),
            is_captain: false,
            password_hash: "$argon2id$...".to_string(),
            created_at: None,
        };
        let user = User::from(row);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
    }
}
