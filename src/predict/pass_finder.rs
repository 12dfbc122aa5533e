use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

use crate::elements::OrbitalElementRecord;
use crate::frames::{look_angles, LookAngles, StationPosition};
use crate::predict::{horizon_end, Pass, PredictError};
use crate::propagate::propagate;

pub const DEFAULT_COARSE_STEP_SECONDS: i64 = 60;
pub const DEFAULT_TOLERANCE_MILLISECONDS: i64 = 100;

const INV_GOLDEN_RATIO: f64 = 0.618_033_988_749_895;

// revolutions per day
const GEOSYNCHRONOUS_MEAN_MOTION: std::ops::RangeInclusive<f64> = 0.9..=1.1;

/// Visibility window search for one record.
///
/// A coarse scan brackets crossings of the elevation threshold, bisection refines AOS and
/// LOS to `tolerance`, and a golden-section search around the highest coarse sample finds
/// the culmination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassFinder {
    pub coarse_step: Duration,
    pub tolerance: Duration,
}

impl Default for PassFinder {
    fn default() -> Self {
        Self {
            coarse_step: Duration::seconds(DEFAULT_COARSE_STEP_SECONDS),
            tolerance: Duration::milliseconds(DEFAULT_TOLERANCE_MILLISECONDS),
        }
    }
}

/// Passes of `record` over `station` in `[from, from + horizon_hours]` with default settings.
pub fn find_passes(
    record: &OrbitalElementRecord,
    station: &StationPosition,
    from: DateTime<Utc>,
    horizon_hours: u32,
    min_elevation_deg: f64,
) -> Result<Vec<Pass>, PredictError> {
    PassFinder::default().find_passes(record, station, from, horizon_hours, min_elevation_deg)
}

#[derive(Debug, Clone, Copy)]
struct OpenPass {
    aos: DateTime<Utc>,
    partial_start: bool,
    peak: DateTime<Utc>,
    peak_elevation_deg: f64,
}

impl PassFinder {
    pub fn find_passes(
        &self,
        record: &OrbitalElementRecord,
        station: &StationPosition,
        from: DateTime<Utc>,
        horizon_hours: u32,
        min_elevation_deg: f64,
    ) -> Result<Vec<Pass>, PredictError> {
        self.find_passes_until_cancelled(
            record,
            station,
            from,
            horizon_hours,
            min_elevation_deg,
            &CancellationToken::new(),
        )
    }

    /// Like [`PassFinder::find_passes`], checking `cancel` before every coarse sample.
    pub fn find_passes_until_cancelled(
        &self,
        record: &OrbitalElementRecord,
        station: &StationPosition,
        from: DateTime<Utc>,
        horizon_hours: u32,
        min_elevation_deg: f64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Pass>, PredictError> {
        let end = horizon_end(from, horizon_hours)?;
        let mut passes = Vec::new();
        if end <= from || self.coarse_step <= Duration::zero() {
            return Ok(passes);
        }

        let search = Search {
            record,
            station,
            min_elevation_deg,
            tolerance: self.tolerance.max(Duration::milliseconds(1)),
            coarse_step: self.coarse_step,
        };

        let mut open: Option<OpenPass> = None;
        let mut prev = from;
        let mut cursor = from;
        loop {
            if cancel.is_cancelled() {
                return Err(PredictError::Cancelled);
            }

            let elevation = search.look(cursor)?.elevation_deg;
            let above = elevation >= min_elevation_deg;

            match open {
                None if above => {
                    let (aos, partial_start) = if cursor == from {
                        (from, true)
                    } else {
                        (search.rising_edge(prev, cursor)?, false)
                    };
                    open = Some(OpenPass {
                        aos,
                        partial_start,
                        peak: cursor,
                        peak_elevation_deg: elevation,
                    });
                }
                Some(ref mut pass) if above => {
                    if elevation > pass.peak_elevation_deg {
                        pass.peak = cursor;
                        pass.peak_elevation_deg = elevation;
                    }
                }
                Some(pass) => {
                    open = None;
                    let los = search.setting_edge(prev, cursor)?;
                    passes.push(search.finish(pass, los, false)?);
                }
                None => {}
            }

            if cursor >= end {
                break;
            }
            prev = cursor;
            cursor = cursor
                .checked_add_signed(self.coarse_step)
                .map_or(end, |next| next.min(end));
        }

        match open {
            Some(pass) if !pass.partial_start => passes.push(search.finish(pass, end, true)?),
            // above the threshold for the whole window: only a culmination inside it is a pass
            Some(pass) if pass.peak > from && pass.peak < end && !is_geosynchronous(record) => {
                passes.push(search.finish(pass, end, true)?);
            }
            _ => {}
        }

        log::debug!(
            "{} pass(es) for NORAD {} between {} and {}",
            passes.len(),
            record.norad_id(),
            from,
            end
        );
        Ok(passes)
    }
}

fn is_geosynchronous(record: &OrbitalElementRecord) -> bool {
    GEOSYNCHRONOUS_MEAN_MOTION.contains(&record.mean_motion())
}

struct Search<'a> {
    record: &'a OrbitalElementRecord,
    station: &'a StationPosition,
    min_elevation_deg: f64,
    tolerance: Duration,
    coarse_step: Duration,
}

impl Search<'_> {
    fn look(&self, at: DateTime<Utc>) -> Result<LookAngles, PredictError> {
        let state = propagate(self.record, at).map_err(|source| PredictError::Propagation {
            norad_id: self.record.norad_id(),
            source,
        })?;
        Ok(look_angles(&state, self.station))
    }

    fn is_above(&self, at: DateTime<Utc>) -> Result<bool, PredictError> {
        Ok(self.look(at)?.elevation_deg >= self.min_elevation_deg)
    }

    /// First instant above the threshold, `below` < `above`.
    fn rising_edge(
        &self,
        mut below: DateTime<Utc>,
        mut above: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, PredictError> {
        while above - below > self.tolerance {
            let mid = below + (above - below) / 2;
            if self.is_above(mid)? {
                above = mid;
            } else {
                below = mid;
            }
        }
        Ok(above)
    }

    /// Last instant above the threshold, `above` < `below`.
    fn setting_edge(
        &self,
        mut above: DateTime<Utc>,
        mut below: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, PredictError> {
        while below - above > self.tolerance {
            let mid = above + (below - above) / 2;
            if self.is_above(mid)? {
                above = mid;
            } else {
                below = mid;
            }
        }
        Ok(above)
    }

    /// Golden-section search for the elevation maximum in `[lo, hi]`.
    fn culmination(
        &self,
        lo: DateTime<Utc>,
        hi: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, LookAngles), PredictError> {
        let at = |offset_ms: f64| lo + Duration::milliseconds(offset_ms.round() as i64);
        let tolerance_ms = self.tolerance.num_milliseconds() as f64;

        let mut a = 0.0;
        let mut b = (hi - lo).num_milliseconds() as f64;
        let mut c = b - INV_GOLDEN_RATIO * (b - a);
        let mut d = a + INV_GOLDEN_RATIO * (b - a);
        let mut fc = self.look(at(c))?.elevation_deg;
        let mut fd = self.look(at(d))?.elevation_deg;

        while b - a > tolerance_ms {
            if fc > fd {
                b = d;
                d = c;
                fd = fc;
                c = b - INV_GOLDEN_RATIO * (b - a);
                fc = self.look(at(c))?.elevation_deg;
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + INV_GOLDEN_RATIO * (b - a);
                fd = self.look(at(d))?.elevation_deg;
            }
        }

        let tca = at((a + b) / 2.0);
        Ok((tca, self.look(tca)?))
    }

    fn finish(
        &self,
        pass: OpenPass,
        los: DateTime<Utc>,
        partial_end: bool,
    ) -> Result<Pass, PredictError> {
        let lo = pass
            .peak
            .checked_sub_signed(self.coarse_step)
            .map_or(pass.aos, |lo| lo.max(pass.aos));
        let hi = pass
            .peak
            .checked_add_signed(self.coarse_step)
            .map_or(los, |hi| hi.min(los));
        let (mut tca, mut tca_look) = self.culmination(lo, hi)?;
        if tca_look.elevation_deg < pass.peak_elevation_deg {
            tca = pass.peak;
            tca_look = self.look(tca)?;
        }

        let aos_look = self.look(pass.aos)?;
        let los_look = self.look(los)?;

        Ok(Pass {
            norad_id: self.record.norad_id(),
            satellite: self.record.name().to_string(),
            aos: pass.aos,
            los,
            tca,
            max_elevation_deg: tca_look.elevation_deg,
            aos_azimuth_deg: aos_look.azimuth_deg,
            tca_azimuth_deg: tca_look.azimuth_deg,
            los_azimuth_deg: los_look.azimuth_deg,
            duration_seconds: (los - pass.aos).num_milliseconds() as f64 / 1000.0,
            partial_start: pass.partial_start,
            partial_end,
            deep_space: self.record.is_deep_space(),
            orbit_number: self.record.orbit_number_at(pass.aos),
        })
    }
}
