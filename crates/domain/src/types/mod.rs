//! Domain types and models

pub mod schedule;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::errors::{CarelogError, Result};

// Re-export entity types for convenience
pub use schedule::{
    DayStats, Schedule, ScheduleBundle, ScheduleDetail, ScheduleDraft, ScheduleFilter,
    ScheduleListPage, SchedulePatch, ScheduleSummary, Task, TaskDraft, TaskReplacement,
    TimeWindow, VisitLog, VisitWindow,
};
pub use user::{User, UserRole};

/// A validated latitude/longitude pair.
///
/// Latitude is constrained to [-90, 90] and longitude to [-180, 180];
/// construction is the only place the ranges are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CarelogError::InvalidCoordinate);
        }
        Ok(Self { lat, lng })
    }
}

/// Category of care delivered during a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    PersonalCare,
    Companionship,
    MedicationSupport,
    Housekeeping,
    Transportation,
}

impl ServiceKind {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonalCare => "PERSONAL_CARE",
            Self::Companionship => "COMPANIONSHIP",
            Self::MedicationSupport => "MEDICATION_SUPPORT",
            Self::Housekeeping => "HOUSEKEEPING",
            Self::Transportation => "TRANSPORTATION",
        }
    }

    /// All service kinds, in demo-seeding rotation order.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::PersonalCare,
            Self::Companionship,
            Self::MedicationSupport,
            Self::Housekeeping,
            Self::Transportation,
        ]
    }

    /// Parse a stored identifier back into a service kind.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "PERSONAL_CARE" => Ok(Self::PersonalCare),
            "COMPANIONSHIP" => Ok(Self::Companionship),
            "MEDICATION_SUPPORT" => Ok(Self::MedicationSupport),
            "HOUSEKEEPING" => Ok(Self::Housekeeping),
            "TRANSPORTATION" => Ok(Self::Transportation),
            other => Err(CarelogError::Database(format!(
                "unknown service kind: {other}"
            ))),
        }
    }
}

/// Lifecycle label derived from a schedule's window and visit record.
///
/// Never persisted; recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    Upcoming,
    Started,
    InProgress,
    Missed,
    Completed,
}

impl ScheduleStatus {
    /// Fixed priority used when sorting schedule lists.
    ///
    /// `started(1) < upcoming(2) < missed(3) < in-progress(4) < completed(5)`
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Started => 1,
            Self::Upcoming => 2,
            Self::Missed => 3,
            Self::InProgress => 4,
            Self::Completed => 5,
        }
    }
}
