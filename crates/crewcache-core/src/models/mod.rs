//! Data models for the backend tables.
//!
//! One type per row shape:
//!
//! - `User` / `Role` / `Team`: the `users` table and its enums
//! - `CoachingSession`, `AttendanceRecord`: practices and who attends them
//! - `Show`, `ShowDate`, `ShowAssignment`, `ShowAvailability`: productions,
//!   their performance dates, and who is booked/available
//! - `Status`: the shared absent/present/undecided answer
//!
//! `New*` structs are the insert payloads; ids and creation stamps come back
//! from the backend.

pub mod coaching;
pub mod show;
pub mod status;
pub mod user;

pub use coaching::{AttendanceRecord, CoachingSession, NewAttendanceRecord, NewCoachingSession};
pub use show::{
    NewShow, NewShowAssignment, NewShowAvailability, NewShowDate, Show, ShowAssignment,
    ShowAvailability, ShowDate,
};
pub use status::Status;
pub use user::{Role, Team, User};

pub(crate) use user::{NewUserRow, UserRow};
