use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::elements::OrbitalElementRecord;
use crate::frames::to_geodetic;
use crate::propagate::{propagate, PropagationError};

/// Sub-satellite point of a ground track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TrackPoint {
    pub at: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Rendering parameter for cutting polylines at the ±180° meridian.
///
/// A crossing is a longitude sign flip where both longitudes exceed `threshold_deg` in
/// magnitude. 170° suits common LEO inclinations and altitudes; sparse sampling or
/// unusual geometries may need a lower value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AntimeridianSplit {
    pub threshold_deg: f64,
}

impl Default for AntimeridianSplit {
    fn default() -> Self {
        Self {
            threshold_deg: 170.0,
        }
    }
}

impl AntimeridianSplit {
    pub fn crosses(&self, from_lon_deg: f64, to_lon_deg: f64) -> bool {
        from_lon_deg.signum() != to_lon_deg.signum()
            && from_lon_deg.abs() > self.threshold_deg
            && to_lon_deg.abs() > self.threshold_deg
    }
}

/// Sub-satellite points of one record between two instants at a fixed step.
///
/// Nothing is computed until iterated; [`GroundTrack::iter`] can be called any number of
/// times and always restarts at `start`.
#[derive(Debug, Clone, Copy)]
pub struct GroundTrack<'a> {
    record: &'a OrbitalElementRecord,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
}

/// Ground track of `record` from `start` to `end` (inclusive) every `step`.
/// A non-positive step yields an empty track. Sub-satellite points do not depend on the
/// observer, so no station is taken.
pub fn get_track(
    record: &OrbitalElementRecord,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> GroundTrack<'_> {
    GroundTrack {
        record,
        start,
        end,
        step,
    }
}

impl<'a> GroundTrack<'a> {
    pub fn iter(&self) -> TrackIter<'a> {
        TrackIter {
            record: self.record,
            next: (self.step > Duration::zero()).then_some(self.start),
            end: self.end,
            step: self.step,
        }
    }

    /// Collect the track into polylines cut at the antimeridian.
    pub fn segments(
        &self,
        split: &AntimeridianSplit,
    ) -> Result<Vec<Vec<TrackPoint>>, PropagationError> {
        let points = self.iter().collect::<Result<Vec<_>, _>>()?;
        Ok(split_antimeridian(points, split))
    }
}

impl<'a> IntoIterator for &GroundTrack<'a> {
    type Item = Result<TrackPoint, PropagationError>;
    type IntoIter = TrackIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct TrackIter<'a> {
    record: &'a OrbitalElementRecord,
    next: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Iterator for TrackIter<'_> {
    type Item = Result<TrackPoint, PropagationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next.filter(|at| *at <= self.end)?;
        let point = propagate(self.record, at).map(|state| {
            let ground = to_geodetic(&state);
            TrackPoint {
                at,
                latitude_deg: ground.latitude_deg,
                longitude_deg: ground.longitude_deg,
                altitude_km: ground.altitude_km,
            }
        });
        // stop after the first failure or at the end of representable time
        self.next = point
            .is_ok()
            .then(|| at.checked_add_signed(self.step))
            .flatten();
        Some(point)
    }
}

/// Cut a time-ordered track into polylines at antimeridian crossings, inserting synthetic
/// points at exactly +180°/-180° with linearly interpolated latitude, altitude and time.
pub fn split_antimeridian(
    points: impl IntoIterator<Item = TrackPoint>,
    split: &AntimeridianSplit,
) -> Vec<Vec<TrackPoint>> {
    let mut segments = Vec::new();
    let mut current: Vec<TrackPoint> = Vec::new();

    for point in points {
        if let Some(prev) = current.last().copied() {
            if split.crosses(prev.longitude_deg, point.longitude_deg) {
                let (leaving, entering) = boundary_points(&prev, &point);
                current.push(leaving);
                segments.push(std::mem::take(&mut current));
                current.push(entering);
            }
        }
        current.push(point);
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn boundary_points(prev: &TrackPoint, next: &TrackPoint) -> (TrackPoint, TrackPoint) {
    let edge = 180.0_f64.copysign(prev.longitude_deg);
    let unwrapped = next.longitude_deg + 360.0_f64.copysign(prev.longitude_deg);
    let span = unwrapped - prev.longitude_deg;
    let f = if span.abs() > f64::EPSILON {
        ((edge - prev.longitude_deg) / span).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let dt_ms = (next.at - prev.at).num_milliseconds() as f64;
    let at = prev.at + Duration::milliseconds((dt_ms * f).round() as i64);
    let latitude_deg = prev.latitude_deg + f * (next.latitude_deg - prev.latitude_deg);
    let altitude_km = prev.altitude_km + f * (next.altitude_km - prev.altitude_km);

    let leaving = TrackPoint {
        at,
        latitude_deg,
        longitude_deg: edge,
        altitude_km,
    };
    let entering = TrackPoint {
        longitude_deg: -edge,
        ..leaving
    };
    (leaving, entering)
}
