use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::frames::{geodetic_to_ecef, normalize_longitude_deg};

/// Geodetic position of the observing ground station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StationPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Default for StationPosition {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        }
    }
}

impl StationPosition {
    /// `None` when latitude is outside [-90, 90] or any value is not finite.
    /// Longitude is normalized to [-180, 180).
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Option<Self> {
        if !(latitude_deg.is_finite() && longitude_deg.is_finite() && altitude_m.is_finite()) {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return None;
        }
        Some(Self {
            latitude_deg,
            longitude_deg: normalize_longitude_deg(longitude_deg),
            altitude_m,
        })
    }

    /// Parse `"lat, lon"` in decimal degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Self::new(lat, lon, altitude_m.unwrap_or(0.0))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        geodetic_to_ecef(self.latitude_deg, self.longitude_deg, self.altitude_m / 1000.0)
    }
}
