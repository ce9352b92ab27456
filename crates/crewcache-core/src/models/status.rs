use serde::{Deserialize, Serialize};

/// Attendance/availability answer for one (member, event) pair.
///
/// Stored lowercase in the `status` columns of `attendance_records` and
/// `show_availability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Absent,
    Present,
    Undecided,
}

impl Default for Status {
    /// The status assumed when no record exists for a (member, event) pair.
    /// Matrix cells and session-creation backfill both use this.
    fn default() -> Self {
        Status::Undecided
    }
}

impl Status {
    /// Single-character marker for compact table output.
    pub fn symbol(&self) -> char {
        match self {
            Status::Absent => 'A',
            Status::Present => 'P',
            Status::Undecided => '?',
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Absent => write!(f, "Absent"),
            Status::Present => write!(f, "Present"),
            Status::Undecided => write!(f, "Undecided"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Present).unwrap(), "\"present\"");
        assert_eq!(serde_json::to_string(&Status::Absent).unwrap(), "\"absent\"");
    }

    #[test]
    fn test_status_deserializes_from_backend_value() {
        let status: Status = serde_json::from_str("\"undecided\"").unwrap();
        assert_eq!(status, Status::Undecided);
    }

    #[test]
    fn test_default_status_is_undecided() {
        assert_eq!(Status::default(), Status::Undecided);
    }
}
