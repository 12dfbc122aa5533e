use chrono::{DateTime, Utc};

use crate::propagate::EARTH_RADIUS_KM;

const AU_KM: f64 = 149_597_870.7;
const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Low-precision (about 0.01 deg) geocentric sun position in km, mean equator of date.
pub fn sun_position_km(at: DateTime<Utc>) -> [f64; 3] {
    let jd = at.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD;
    let n = jd - J2000_JD;

    let mean_longitude = (280.460 + 0.985_647_4 * n).to_radians();
    let mean_anomaly = (357.528 + 0.985_600_3 * n).to_radians();
    let ecliptic_longitude = mean_longitude
        + 1.915_f64.to_radians() * mean_anomaly.sin()
        + 0.020_f64.to_radians() * (2.0 * mean_anomaly).sin();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();
    let distance_km = AU_KM
        * (1.000_14 - 0.016_71 * mean_anomaly.cos() - 0.000_14 * (2.0 * mean_anomaly).cos());

    [
        distance_km * ecliptic_longitude.cos(),
        distance_km * obliquity.cos() * ecliptic_longitude.sin(),
        distance_km * obliquity.sin() * ecliptic_longitude.sin(),
    ]
}

/// Cylindrical earth-shadow test for an inertial position.
pub fn is_eclipsed(position_km: [f64; 3], at: DateTime<Utc>) -> bool {
    let sun = sun_position_km(at);
    let sun_distance = (sun[0] * sun[0] + sun[1] * sun[1] + sun[2] * sun[2]).sqrt();
    let sun_dir = [
        sun[0] / sun_distance,
        sun[1] / sun_distance,
        sun[2] / sun_distance,
    ];

    let along = position_km[0] * sun_dir[0] + position_km[1] * sun_dir[1] + position_km[2] * sun_dir[2];
    if along >= 0.0 {
        return false;
    }

    let perpendicular = [
        position_km[0] - along * sun_dir[0],
        position_km[1] - along * sun_dir[1],
        position_km[2] - along * sun_dir[2],
    ];
    let offset = (perpendicular[0] * perpendicular[0]
        + perpendicular[1] * perpendicular[1]
        + perpendicular[2] * perpendicular[2])
        .sqrt();
    offset < EARTH_RADIUS_KM
}
