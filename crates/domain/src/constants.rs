//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

/// Minutes before the scheduled start inside which a visit may begin.
pub const VISIT_START_BUFFER_MINUTES: i64 = 15;

/// Minimum number of minutes a visit must last before it may end.
pub const MIN_VISIT_DURATION_MINUTES: i64 = 5;

/// Maximum distance in meters between the actor and the schedule location
/// for a visit action to count as on-site.
pub const GEOFENCE_RADIUS_METERS: f64 = 100.0;

/// Mean Earth radius in meters, used by the great-circle distance check.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// Operator notification configuration
pub const NOTIFY_TIMEOUT_SECS: u64 = 5;

// Demo data generation
pub const DEMO_SCHEDULE_COUNT: usize = 5;
pub const DEMO_SCHEDULE_DURATION_MINUTES: i64 = 60;
