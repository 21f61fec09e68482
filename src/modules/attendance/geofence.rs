//! Great-circle distance and the school geofence gate used by staff check-in.

use crate::modules::schools::model::School;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in metres between two WGS84 points given in degrees.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    /// `None` when the school has no coordinates on record.
    pub distance_m: Option<f64>,
    pub radius_m: f64,
    pub allowed: bool,
}

impl GeofenceCheck {
    /// Only a school with both coordinates has a fence to check against.
    pub fn school_has_location(&self) -> bool {
        self.distance_m.is_some()
    }
}

/// Decides whether a position is inside the school's fence. The boundary
/// itself counts as inside. Schools without coordinates accept anywhere.
pub fn check(school: &School, latitude: f64, longitude: f64) -> GeofenceCheck {
    let radius_m = school.geofence_radius_m;
    match (school.latitude, school.longitude) {
        (Some(lat), Some(lon)) => {
            let distance = haversine_distance_m(lat, lon, latitude, longitude);
            GeofenceCheck {
                distance_m: Some(distance),
                radius_m,
                allowed: distance <= radius_m,
            }
        }
        _ => GeofenceCheck {
            distance_m: None,
            radius_m,
            allowed: true,
        },
    }
}
