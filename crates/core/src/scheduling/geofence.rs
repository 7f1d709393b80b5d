//! Geofence proximity checks
//!
//! Visit start/end actions must happen near the schedule's target location.
//! Distance is great-circle (haversine); the check fails closed when the
//! schedule has no recorded coordinate.

use carelog_domain::constants::{EARTH_RADIUS_METERS, GEOFENCE_RADIUS_METERS};
use carelog_domain::{CarelogError, GeoPoint, Result};

/// Great-circle distance between two points, in meters.
#[must_use]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Verify the actor is within the geofence of the schedule's location.
///
/// Returns the measured distance in whole meters on success. A schedule
/// without a recorded coordinate rejects the action rather than waving it
/// through.
pub fn check_proximity(schedule_location: Option<GeoPoint>, actor: GeoPoint) -> Result<u32> {
    let Some(target) = schedule_location else {
        return Err(CarelogError::NotFound("schedule location".to_owned()));
    };

    let distance = distance_meters(target, actor);
    // Saturating cast keeps antipodal nonsense representable.
    let rounded = if distance >= f64::from(u32::MAX) { u32::MAX } else { distance.round() as u32 };

    if distance > GEOFENCE_RADIUS_METERS {
        return Err(CarelogError::TooFar { distance_meters: rounded });
    }

    Ok(rounded)
}
