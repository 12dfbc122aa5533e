use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// One observation of a satellite from a ground station.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SatPos {
    pub at: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub eclipsed: bool,
}
