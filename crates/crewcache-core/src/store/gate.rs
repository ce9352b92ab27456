//! Admission check for status updates.
//!
//! The one conditional authorization rule beyond the route guards: once an
//! event's date has passed, only captains and admins may still change
//! status records for it. The comparison is date-only; an event today stays
//! editable until midnight regardless of time.

use chrono::NaiveDate;

use crate::models::User;

use super::{StoreError, StoreResult};

/// Fixed denial message for the past-event rule.
pub const PAST_EVENT_DENIED: &str = "Past events can only be updated by captains or admins";

/// Check whether `caller` may change a status record for an event on
/// `event_date`, given today's date.
pub fn check_status_update(
    event_date: NaiveDate,
    today: NaiveDate,
    caller: &User,
) -> StoreResult<()> {
    if event_date < today && !caller.can_access_admin() {
        return Err(StoreError::Denied(PAST_EVENT_DENIED.to_string()));
    }
    Ok(())
}
