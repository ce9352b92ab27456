//! Dense attendance/availability matrix construction.
//!
//! The pure join of roster x events x status records. Callers supply the
//! event columns and a status lookup; this module owns the shape rules:
//! one row per roster member of the team, one column per event sorted by
//! date, and a default status wherever no record exists.

use chrono::NaiveDate;

use crate::models::{Status, Team, User};

/// One column of the matrix: an event the roster answers for. The label is
/// the coach name for coaching sessions and the show name for show dates.
#[derive(Debug, Clone, PartialEq)]
pub struct EventColumn {
    pub event_id: String,
    pub date: NaiveDate,
    pub label: String,
}

/// One roster member's statuses, in the same order as the column list.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub user_id: String,
    pub user_name: String,
    pub statuses: Vec<Status>,
}

/// The dense grid for one team.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub team: Team,
    pub columns: Vec<EventColumn>,
    pub rows: Vec<MatrixRow>,
}

impl Matrix {
    /// Status at (row, column) by position.
    pub fn status_at(&self, row: usize, column: usize) -> Option<Status> {
        self.rows.get(row).and_then(|r| r.statuses.get(column)).copied()
    }
}

/// Build the dense matrix for `team`.
///
/// The roster is filtered to members of the team; columns are sorted by
/// date (event id breaks ties so the order is stable); `status_for`
/// resolves a (user id, event id) pair to a recorded status, and missing
/// records become [`Status::default`].
pub fn build_matrix<F>(
    team: Team,
    roster: &[User],
    mut columns: Vec<EventColumn>,
    status_for: F,
) -> Matrix
where
    F: Fn(&str, &str) -> Option<Status>,
{
    columns.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.event_id.cmp(&b.event_id)));

    let rows = roster
        .iter()
        .filter(|member| member.team == Some(team))
        .map(|member| MatrixRow {
            user_id: member.id.clone(),
            user_name: member.name.clone(),
            statuses: columns
                .iter()
                .map(|column| {
                    status_for(&member.id, &column.event_id).unwrap_or_default()
                })
                .collect(),
        })
        .collect();

    Matrix {
        team,
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn member(id: &str, name: &str, team: Team) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            role: Role::Member,
            team: Some(team),
            is_captain: false,
        }
    }

    fn column(id: &str, date: &str) -> EventColumn {
        EventColumn {
            event_id: id.to_string(),
            date: date.parse().unwrap(),
            label: format!("Event {}", id),
        }
    }

    #[test]
    fn test_one_row_per_team_member_one_column_per_event() {
        let roster = vec![
            member("5", "Samurai Member", Team::Samurai),
            member("6", "Samurai Member 2", Team::Samurai),
            member("7", "Gladiator Member", Team::Gladiator),
        ];
        let columns = vec![column("1", "2025-01-15"), column("2", "2025-01-20")];

        let matrix = build_matrix(Team::Samurai, &roster, columns, |_, _| None);

        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.columns.len(), 2);
        for row in &matrix.rows {
            assert_eq!(row.statuses.len(), 2);
        }
    }

    #[test]
    fn test_columns_sorted_by_date() {
        let roster = vec![member("5", "Samurai Member", Team::Samurai)];
        let columns = vec![
            column("3", "2025-03-01"),
            column("1", "2025-01-15"),
            column("2", "2025-02-05"),
        ];

        let matrix = build_matrix(Team::Samurai, &roster, columns, |_, _| None);

        let ids: Vec<&str> = matrix.columns.iter().map(|c| c.event_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_missing_records_take_default_status() {
        let roster = vec![member("5", "Samurai Member", Team::Samurai)];
        let columns = vec![column("1", "2025-01-15"), column("2", "2025-01-20")];

        let matrix = build_matrix(Team::Samurai, &roster, columns, |user_id, event_id| {
            (user_id == "5" && event_id == "1").then_some(Status::Present)
        });

        assert_eq!(matrix.status_at(0, 0), Some(Status::Present));
        assert_eq!(matrix.status_at(0, 1), Some(Status::default()));
    }

    #[test]
    fn test_empty_roster_gives_empty_matrix() {
        let roster = vec![member("7", "Gladiator Member", Team::Gladiator)];
        let matrix = build_matrix(Team::Viking, &roster, vec![column("1", "2025-01-15")], |_, _| None);
        assert!(matrix.rows.is_empty());
        assert_eq!(matrix.columns.len(), 1);
    }
}
