use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Status, Team};

/// `coaching_sessions` row: one practice on one date for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingSession {
    pub id: String,
    pub date: NaiveDate,
    pub team: Team,
    pub coach: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `coaching_sessions`; the backend assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewCoachingSession {
    pub date: NaiveDate,
    pub team: Team,
    pub coach: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// `attendance_records` row. At most one exists per (user, session) pair;
/// a missing row means [`Status::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `attendance_records`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAttendanceRecord {
    pub user_id: String,
    pub session_id: String,
    pub status: Status,
    pub updated_at: DateTime<Utc>,
}
