use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Status, Team};

/// `shows` row: a named production owned by one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: String,
    pub name: String,
    pub team: Team,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShow {
    pub name: String,
    pub team: Team,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// `show_dates` row: one performance date of a show, with a cap on how many
/// members can be assigned to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDate {
    pub id: String,
    pub show_id: String,
    pub date: NaiveDate,
    pub max_members: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShowDate {
    pub show_id: String,
    pub date: NaiveDate,
    pub max_members: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// `show_assignments` row: a member booked to perform on a show date.
/// Bounded by the show date's `max_members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowAssignment {
    pub id: String,
    pub show_date_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShowAssignment {
    pub show_date_id: String,
    pub user_id: String,
}

/// `show_availability` row. Same shape and rules as attendance records,
/// keyed by show date instead of session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowAvailability {
    pub id: String,
    pub user_id: String,
    pub show_date_id: String,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShowAvailability {
    pub user_id: String,
    pub show_date_id: String,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}
