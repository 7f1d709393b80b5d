//! Error types used throughout the application
//!
//! Every recoverable validation failure has its own variant so callers can
//! correct their input without parsing message strings. Infrastructure
//! failures collapse into the generic variants at the bottom.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Carelog
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum CarelogError {
    /// A clock-time literal did not match the strict `HH:MM:SS` pattern.
    #[error("{0} must be in HH:MM:SS format")]
    InvalidTimeFormat(String),

    /// A date literal was neither `YYYY-MM-DD` nor an absolute instant.
    #[error("The date you entered is invalid. Please check the format and try again.")]
    InvalidDate(String),

    /// A latitude/longitude pair was outside the valid range.
    #[error("Latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinate,

    /// Schedule window ordering violation.
    #[error("End time must be after start time")]
    EndBeforeStart,

    /// The caregiver already has an overlapping schedule on that day.
    #[error("Caregiver is not available at the selected time")]
    CaregiverUnavailable,

    /// A referenced entity does not exist.
    #[error("We couldn't find the {0} you're looking for.")]
    NotFound(String),

    /// A referenced user does not hold the required role.
    #[error("User is not assigned the {expected} role.")]
    RoleMismatch {
        /// Role the operation required.
        expected: String,
    },

    /// Caregiver and client must be two different users.
    #[error("This request seems to be invalid. Please check and try again.")]
    SameUser,

    #[error("Visit already started.")]
    VisitAlreadyStarted,

    #[error("Visit already ended.")]
    VisitAlreadyEnded,

    #[error("Cannot cancel a completed visit.")]
    CannotCancelCompleted,

    #[error("Visit has not been started yet.")]
    VisitNotStarted,

    /// Start attempted before the allowed early-start margin.
    #[error("Cannot start visit more than {buffer_minutes} minutes before scheduled time")]
    VisitTooEarly {
        /// Allowed early-start margin that was violated.
        buffer_minutes: i64,
    },

    /// Start attempted after the scheduled end.
    #[error("Cannot start visit after scheduled end time")]
    VisitTooLate,

    /// End attempted before the minimum visit duration elapsed.
    #[error("Visit must last at least {minimum_minutes} minutes")]
    VisitTooShort {
        /// Required minimum duration in minutes.
        minimum_minutes: i64,
    },

    /// Actor's reported position is outside the geofence.
    #[error("You're {distance_meters} meters away from the location you're looking for.")]
    TooFar {
        /// Measured great-circle distance in meters.
        distance_meters: u32,
    },

    /// A visit cannot end while tasks are neither completed nor excused.
    #[error("{outstanding} task(s) must be completed or given a reason first")]
    IncompleteTasks {
        /// Number of tasks still blocking the end of the visit.
        outstanding: usize,
    },

    /// Incomplete tasks must carry an explanation.
    #[error("Reason required for incomplete tasks")]
    ReasonRequired,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Oops! Something went wrong on our end. Please try again later.")]
    Internal(String),
}

impl CarelogError {
    /// Whether this error is an unexpected infrastructure failure rather
    /// than a recoverable validation outcome.
    ///
    /// Unexpected failures are reported to the operator notifier and
    /// surfaced to callers as a generic internal error.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Network(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

/// Result type alias for Carelog operations
pub type Result<T> = std::result::Result<T, CarelogError>;
