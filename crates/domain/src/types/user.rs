//! User entity and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{CarelogError, Result};

/// Role a user plays in a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Caregiver,
    Client,
}

impl UserRole {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caregiver => "CAREGIVER",
            Self::Client => "CLIENT",
        }
    }

    /// Human-readable label used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Caregiver => "caregiver",
            Self::Client => "client",
        }
    }

    /// Parse a stored identifier back into a role.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "CAREGIVER" => Ok(Self::Caregiver),
            "CLIENT" => Ok(Self::Client),
            other => Err(CarelogError::Database(format!("unknown user role: {other}"))),
        }
    }
}

/// A person participating in schedules, on either side of the visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}
