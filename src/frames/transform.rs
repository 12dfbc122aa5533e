//! Inertial (TEME) to earth-fixed, geodetic and topocentric conversions.
//!
//! Vectors are plain `[f64; 3]` in km or km/s.

use chrono::{DateTime, Utc};

use crate::frames::{is_eclipsed, SatPos, StationPosition};
use crate::propagate::PropagationState;

// WGS-84
pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_E2: f64 = 0.006_694_379_990_14;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

const GEODETIC_TOLERANCE_RAD: f64 = 1e-12;
const GEODETIC_MAX_ITERATIONS: usize = 10;

/// Sub-satellite (or any earth-fixed) point in geodetic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Azimuth/elevation/range of a satellite from a station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
}

/// Greenwich mean sidereal time in radians.
pub fn gmst_rad(at: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()))
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_longitude_deg(longitude_deg: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude_deg) {
        return longitude_deg;
    }
    let wrapped = (longitude_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn ecef_to_teme_position(pos_ecef: [f64; 3], gmst: f64) -> [f64; 3] {
    teme_to_ecef_position(pos_ecef, -gmst)
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    let rotation = [
        -EARTH_ROTATION_RAD_S * pos[1],
        EARTH_ROTATION_RAD_S * pos[0],
        0.0,
    ];
    [
        rotated[0] - rotation[0],
        rotated[1] - rotation[1],
        rotated[2] - rotation[2],
    ]
}

pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> [f64; 3] {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    [
        (n + altitude_km) * cos_lat * lon.cos(),
        (n + altitude_km) * cos_lat * lon.sin(),
        (n * (1.0 - WGS84_E2) + altitude_km) * sin_lat,
    ]
}

/// Iterative ECEF to geodetic conversion on the WGS-84 ellipsoid.
pub fn ecef_to_geodetic(pos_ecef: [f64; 3]) -> Geodetic {
    let [x, y, z] = pos_ecef;
    let r_equatorial = (x * x + y * y).sqrt();
    let longitude = y.atan2(x);

    let mut latitude = z.atan2(r_equatorial * (1.0 - WGS84_E2));
    let mut n = WGS84_A_KM;
    for _ in 0..GEODETIC_MAX_ITERATIONS {
        let sin_lat = latitude.sin();
        n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let next = (z + n * WGS84_E2 * sin_lat).atan2(r_equatorial);
        let converged = (next - latitude).abs() < GEODETIC_TOLERANCE_RAD;
        latitude = next;
        if converged {
            break;
        }
    }

    let sin_lat = latitude.sin();
    n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let cos_lat = latitude.cos();
    // near the poles the horizontal projection is ill-conditioned
    let altitude_km = if cos_lat.abs() > 1e-3 {
        r_equatorial / cos_lat - n
    } else {
        z / sin_lat - n * (1.0 - WGS84_E2)
    };

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: normalize_longitude_deg(longitude.to_degrees()),
        altitude_km,
    }
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Sub-satellite point and altitude of a propagated state.
pub fn to_geodetic(state: &PropagationState) -> Geodetic {
    ecef_to_geodetic(teme_to_ecef_position(state.position_km, gmst_rad(state.at)))
}

/// Inverse of [`to_geodetic`]: the TEME position of an earth-fixed point at `at`.
pub fn geodetic_to_teme(geodetic: &Geodetic, at: DateTime<Utc>) -> [f64; 3] {
    let ecef = geodetic_to_ecef(
        geodetic.latitude_deg,
        geodetic.longitude_deg,
        geodetic.altitude_km,
    );
    ecef_to_teme_position(ecef, gmst_rad(at))
}

/// Azimuth, elevation, slant range and range rate through the station's local horizon frame.
pub fn look_angles(state: &PropagationState, station: &StationPosition) -> LookAngles {
    let gmst = gmst_rad(state.at);
    let sat_ecef = teme_to_ecef_position(state.position_km, gmst);
    let sat_vel_ecef = teme_to_ecef_velocity(state.position_km, state.velocity_km_s, gmst);

    look_angles_ecef(sat_ecef, sat_vel_ecef, station)
}

fn look_angles_ecef(
    sat_ecef: [f64; 3],
    sat_vel_ecef: [f64; 3],
    station: &StationPosition,
) -> LookAngles {
    let sta_ecef = station.position_ecef_km();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        90.0
    };

    // the station is at rest in the earth-fixed frame
    let range_rate_km_s = if range_km > 0.0 {
        (sat_vel_ecef[0] * dr[0] + sat_vel_ecef[1] * dr[1] + sat_vel_ecef[2] * dr[2]) / range_km
    } else {
        0.0
    };

    LookAngles {
        azimuth_deg,
        elevation_deg,
        range_km,
        range_rate_km_s,
    }
}

/// Full observation of a propagated state from `station`.
pub fn to_topocentric(state: &PropagationState, station: &StationPosition) -> SatPos {
    let gmst = gmst_rad(state.at);
    let sat_ecef = teme_to_ecef_position(state.position_km, gmst);
    let sat_vel_ecef = teme_to_ecef_velocity(state.position_km, state.velocity_km_s, gmst);

    let look = look_angles_ecef(sat_ecef, sat_vel_ecef, station);
    let ground = ecef_to_geodetic(sat_ecef);

    SatPos {
        at: state.at,
        latitude_deg: ground.latitude_deg,
        longitude_deg: ground.longitude_deg,
        altitude_km: ground.altitude_km,
        range_km: look.range_km,
        range_rate_km_s: look.range_rate_km_s,
        azimuth_deg: look.azimuth_deg,
        elevation_deg: look.elevation_deg,
        eclipsed: is_eclipsed(state.position_km, state.at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn wraps_longitudes() {
        assert_eq!(normalize_longitude_deg(0.0), 0.0);
        assert_eq!(normalize_longitude_deg(180.0), -180.0);
        assert_eq!(normalize_longitude_deg(-180.0), -180.0);
        assert!(close(normalize_longitude_deg(359.0), -1.0, 1e-9));
        assert!(close(normalize_longitude_deg(-190.0), 170.0, 1e-9));
        assert!(close(normalize_longitude_deg(725.0), 5.0, 1e-9));
    }

    #[test]
    fn in_range_longitudes_are_untouched() {
        for lon in [13.4, -0.1, 151.2, -179.999_999, 179.999_999, 11.575] {
            assert_eq!(normalize_longitude_deg(lon), lon);
        }
    }

    #[test]
    fn geodetic_ecef_round_trip() {
        for &(lat, lon, alt) in &[
            (0.0, 0.0, 0.0),
            (51.6, -0.1, 420.0),
            (-33.9, 151.2, 0.05),
            (89.99, 45.0, 800.0),
            (-72.0, -179.5, 35_786.0),
        ] {
            let geo = ecef_to_geodetic(geodetic_to_ecef(lat, lon, alt));
            assert!(close(geo.latitude_deg, lat, 1e-8), "{lat} -> {}", geo.latitude_deg);
            assert!(close(geo.longitude_deg, lon, 1e-8), "{lon} -> {}", geo.longitude_deg);
            assert!(close(geo.altitude_km, alt, 1e-6), "{alt} -> {}", geo.altitude_km);
        }
    }

    #[test]
    fn teme_rotation_round_trip() {
        let p = [4000.0, -5000.0, 3000.0];
        let gmst = 1.234;
        let back = ecef_to_teme_position(teme_to_ecef_position(p, gmst), gmst);
        for i in 0..3 {
            assert!(close(back[i], p[i], 1e-9));
        }
    }

    #[test]
    fn satellite_straight_up_is_at_zenith() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let station = StationPosition::new(45.0, 7.0, 300.0).unwrap();
        let overhead = Geodetic {
            latitude_deg: 45.0,
            longitude_deg: 7.0,
            altitude_km: 500.3,
        };
        let state = PropagationState {
            at,
            position_km: geodetic_to_teme(&overhead, at),
            velocity_km_s: [0.0, 0.0, 0.0],
        };

        let look = look_angles(&state, &station);
        assert!(close(look.elevation_deg, 90.0, 1e-4), "{}", look.elevation_deg);
        assert!(close(look.range_km, 500.0, 1e-6), "{}", look.range_km);

        let pos = to_topocentric(&state, &station);
        assert!(close(pos.latitude_deg, 45.0, 1e-8));
        assert!(close(pos.longitude_deg, 7.0, 1e-8));
        assert!(close(pos.altitude_km, 500.3, 1e-6));
    }

    #[test]
    fn azimuth_points_north_and_east() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let station = StationPosition::default();
        let north = Geodetic {
            latitude_deg: 5.0,
            longitude_deg: 0.0,
            altitude_km: 800.0,
        };
        let east = Geodetic {
            latitude_deg: 0.0,
            longitude_deg: 5.0,
            altitude_km: 800.0,
        };
        for (target, azimuth) in [(north, 0.0), (east, 90.0)] {
            let state = PropagationState {
                at,
                position_km: geodetic_to_teme(&target, at),
                velocity_km_s: [0.0, 0.0, 0.0],
            };
            let look = look_angles(&state, &station);
            let diff = (look.azimuth_deg - azimuth + 180.0).rem_euclid(360.0) - 180.0;
            assert!(diff.abs() < 1e-6, "{} vs {azimuth}", look.azimuth_deg);
            assert!(look.elevation_deg > 0.0);
        }
    }

    #[test]
    fn gmst_advances_one_turn_per_sidereal_day() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::milliseconds(86_164_091);
        let diff = (gmst_rad(t1) - gmst_rad(t0)).rem_euclid(std::f64::consts::TAU);
        assert!(diff < 1e-4 || std::f64::consts::TAU - diff < 1e-4, "{diff}");
    }
}
