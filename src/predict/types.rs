use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::PredictError;

/// A predicted satellite pass
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Pass {
    pub norad_id: u32,
    pub satellite: String,
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    /// Time of maximum elevation
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub tca_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
    pub duration_seconds: f64,
    /// Already above the threshold when the search window opened
    pub partial_start: bool,
    /// Still above the threshold when the search window closed
    pub partial_end: bool,
    pub deep_space: bool,
    pub orbit_number: Option<u64>,
}

impl Pass {
    pub fn duration(&self) -> Duration {
        self.los - self.aos
    }

    pub fn is_partial(&self) -> bool {
        self.partial_start || self.partial_end
    }

    /// Elapsed fraction of the pass at `now`, clamped to [0, 1].
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let total = self.duration().num_milliseconds();
        if total <= 0 {
            return if now >= self.los { 1.0 } else { 0.0 };
        }
        let elapsed = (now - self.aos).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Restrict a batch to records tagged with at least one allowed mode.
///
/// Tags come from outside the engine (transmitter data, the catalog file); records without
/// tags never pass a mode filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeFilter {
    allowed: BTreeSet<String>,
    tags: HashMap<u32, BTreeSet<String>>,
}

impl ModeFilter {
    pub fn new<I, S>(allowed: I, tags: HashMap<u32, BTreeSet<String>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|(id, modes)| (id, modes.iter().map(|m| normalize_mode(m)).collect()))
            .collect();
        Self {
            allowed: allowed
                .into_iter()
                .map(|m| normalize_mode(m.as_ref()))
                .collect(),
            tags,
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    pub fn permits(&self, norad_id: u32) -> bool {
        self.tags
            .get(&norad_id)
            .is_some_and(|modes| !modes.is_disjoint(&self.allowed))
    }
}

fn normalize_mode(mode: &str) -> String {
    mode.trim().to_ascii_uppercase()
}

/// Parameters of one batch pass search.
#[derive(Debug, Clone, PartialEq)]
pub struct PassQuery {
    pub reference_time: DateTime<Utc>,
    pub horizon_hours: u32,
    pub min_elevation_deg: f64,
    pub modes: Option<ModeFilter>,
}

impl PassQuery {
    pub fn new(reference_time: DateTime<Utc>, horizon_hours: u32, min_elevation_deg: f64) -> Self {
        Self {
            reference_time,
            horizon_hours,
            min_elevation_deg,
            modes: None,
        }
    }

    pub fn with_modes(mut self, modes: ModeFilter) -> Self {
        self.modes = Some(modes);
        self
    }

    pub fn window_end(&self) -> Result<DateTime<Utc>, PredictError> {
        horizon_end(self.reference_time, self.horizon_hours)
    }
}

/// `from` plus `horizon_hours`, or an error past the last representable instant.
pub fn horizon_end(
    from: DateTime<Utc>,
    horizon_hours: u32,
) -> Result<DateTime<Utc>, PredictError> {
    from.checked_add_signed(Duration::hours(i64::from(horizon_hours)))
        .ok_or(PredictError::HorizonOutOfRange(horizon_hours))
}

/// Ordered passes of a batch plus the records whose search failed.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub passes: Vec<Pass>,
    pub failures: Vec<PredictError>,
}
