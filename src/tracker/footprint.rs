use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::elements::OrbitalElementRecord;
use crate::frames::{normalize_longitude_deg, to_geodetic};
use crate::propagate::{propagate, PropagationError};

/// Spherical earth used for the horizon geometry of the footprint.
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0088;

pub const DEFAULT_FOOTPRINT_RESOLUTION_DEG: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GroundPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Earth-central half-angle (radians) of the region that sees a satellite at `altitude_km`
/// above the horizon.
pub fn footprint_half_angle(altitude_km: f64) -> f64 {
    let altitude_km = altitude_km.max(0.0);
    (MEAN_EARTH_RADIUS_KM / (MEAN_EARTH_RADIUS_KM + altitude_km)).acos()
}

/// Visibility circle around the sub-satellite point at `at`, one point every
/// `resolution_deg` of bearing starting due north. The circle depends only on the
/// satellite, so no station is taken.
pub fn get_footprint(
    record: &OrbitalElementRecord,
    at: DateTime<Utc>,
    resolution_deg: f64,
) -> Result<Vec<GroundPoint>, PropagationError> {
    let state = propagate(record, at)?;
    let ground = to_geodetic(&state);
    let center = GroundPoint {
        latitude_deg: ground.latitude_deg,
        longitude_deg: ground.longitude_deg,
    };
    Ok(range_ring(
        center,
        footprint_half_angle(ground.altitude_km),
        resolution_deg,
    ))
}

/// Points at angular distance `half_angle_rad` from `center` for evenly spaced bearings.
pub fn range_ring(center: GroundPoint, half_angle_rad: f64, resolution_deg: f64) -> Vec<GroundPoint> {
    let resolution_deg = if resolution_deg.is_finite() && resolution_deg > 0.0 {
        resolution_deg.min(360.0)
    } else {
        DEFAULT_FOOTPRINT_RESOLUTION_DEG
    };
    let count = (360.0 / resolution_deg).round().max(1.0) as usize;

    let lat1 = center.latitude_deg.to_radians();
    let lon1 = center.longitude_deg.to_radians();
    let (sin_d, cos_d) = half_angle_rad.sin_cos();

    (0..count)
        .map(|i| {
            let bearing = (i as f64 * 360.0 / count as f64).to_radians();
            let sin_lat2 = lat1.sin() * cos_d + lat1.cos() * sin_d * bearing.cos();
            let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
            let lon2 = lon1
                + (bearing.sin() * sin_d * lat1.cos()).atan2(cos_d - lat1.sin() * sin_lat2);
            GroundPoint {
                latitude_deg: lat2.to_degrees(),
                longitude_deg: normalize_longitude_deg(lon2.to_degrees()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementFields;
    use crate::frames::StationPosition;
    use crate::tracker::get_position;
    use chrono::{Duration, TimeZone};

    fn central_angle(a: &GroundPoint, b: &GroundPoint) -> f64 {
        let (la1, la2) = (a.latitude_deg.to_radians(), b.latitude_deg.to_radians());
        let dlon = (b.longitude_deg - a.longitude_deg).to_radians();
        (la1.sin() * la2.sin() + la1.cos() * la2.cos() * dlon.cos())
            .clamp(-1.0, 1.0)
            .acos()
    }

    #[test]
    fn half_angle_grows_with_altitude() {
        assert_eq!(footprint_half_angle(0.0), 0.0);
        let leo = footprint_half_angle(400.0).to_degrees();
        assert!((leo - 19.8).abs() < 0.2, "{leo}");
        let geo = footprint_half_angle(35_786.0).to_degrees();
        assert!((geo - 81.3).abs() < 0.2, "{geo}");
    }

    #[test]
    fn ring_is_equidistant_from_center() {
        let center = GroundPoint {
            latitude_deg: 40.0,
            longitude_deg: 175.0,
        };
        let half_angle = footprint_half_angle(800.0);
        let ring = range_ring(center, half_angle, 1.0);
        assert_eq!(ring.len(), 360);
        for p in &ring {
            assert!((central_angle(&center, p) - half_angle).abs() < 1e-9);
            assert!((-180.0..180.0).contains(&p.longitude_deg));
        }
        // bearing 0 is due north
        assert!((ring[0].latitude_deg - (40.0 + half_angle.to_degrees())).abs() < 1e-9);
        assert_eq!(range_ring(center, half_angle, 10.0).len(), 36);
        assert_eq!(range_ring(center, half_angle, -3.0).len(), 360);
    }

    fn iss() -> OrbitalElementRecord {
        ElementFields {
            norad_id: 25544,
            name: "ISS (ZARYA)".into(),
            epoch: Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 1).unwrap(),
            mean_motion: 15.49507896,
            eccentricity: 0.0001413,
            inclination_deg: 51.6461,
            right_ascension_deg: 221.2784,
            argument_of_perigee_deg: 89.1723,
            mean_anomaly_deg: 280.4612,
            drag_term: -0.000031515,
            revolution_number: 23600,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn footprint_follows_satellite() {
        let record = iss();
        let points = get_footprint(&record, record.epoch(), 1.0).unwrap();
        assert_eq!(points.len(), 360);
        let spread = points
            .iter()
            .map(|p| p.latitude_deg)
            .fold(f64::NEG_INFINITY, f64::max)
            - points
                .iter()
                .map(|p| p.latitude_deg)
                .fold(f64::INFINITY, f64::min);
        // about 2 x 20 degrees for the ISS
        assert!((35.0..45.0).contains(&spread), "{spread}");
    }

    #[test]
    fn footprint_is_centered_on_the_observed_sub_point() {
        let record = iss();
        let at = record.epoch() + Duration::minutes(20);
        let ring = get_footprint(&record, at, 5.0).unwrap();
        for station in [
            StationPosition::default(),
            StationPosition::new(-33.9, 151.2, 40.0).unwrap(),
        ] {
            let observed = get_position(&record, &station, at).unwrap();
            let center = GroundPoint {
                latitude_deg: observed.latitude_deg,
                longitude_deg: observed.longitude_deg,
            };
            let half_angle = footprint_half_angle(observed.altitude_km);
            for p in &ring {
                assert!((central_angle(&center, p) - half_angle).abs() < 1e-9);
            }
        }
    }
}
