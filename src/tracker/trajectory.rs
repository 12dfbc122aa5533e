use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::elements::OrbitalElementRecord;
use crate::frames::{to_topocentric, SatPos, StationPosition};
use crate::predict::Pass;
use crate::propagate::{propagate, PropagationError};

pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Link {
    Uplink,
    Downlink,
}

/// Single observation of `record` from `station` at `at`.
pub fn get_position(
    record: &OrbitalElementRecord,
    station: &StationPosition,
    at: DateTime<Utc>,
) -> Result<SatPos, PropagationError> {
    let state = propagate(record, at)?;
    Ok(to_topocentric(&state, station))
}

/// Observations from `start` to `end` inclusive, one every `step`.
pub fn build_trajectory(
    record: &OrbitalElementRecord,
    station: &StationPosition,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<Vec<SatPos>, PropagationError> {
    let mut points = Vec::new();
    if step <= Duration::zero() {
        return Ok(points);
    }

    let mut cursor = Some(start);
    while let Some(at) = cursor.filter(|at| *at <= end) {
        points.push(get_position(record, station, at)?);
        cursor = at.checked_add_signed(step);
    }
    // always close on the end instant so the path reaches LOS
    if points.last().is_some_and(|p| p.at < end) {
        points.push(get_position(record, station, end)?);
    }

    Ok(points)
}

/// Azimuth/elevation path across one pass, for a polar plot.
pub fn pass_path(
    record: &OrbitalElementRecord,
    station: &StationPosition,
    pass: &Pass,
    step: Duration,
) -> Result<Vec<SatPos>, PropagationError> {
    build_trajectory(record, station, pass.aos, pass.los, step)
}

/// Frequency to tune for a transmitter at `frequency_hz` given the satellite's range rate.
///
/// Downlink: the frequency heard on the ground. Uplink: the frequency to transmit so the
/// satellite receives `frequency_hz`.
pub fn doppler_shift(frequency_hz: f64, range_rate_km_s: f64, link: Link) -> f64 {
    match link {
        Link::Downlink => frequency_hz * (1.0 - range_rate_km_s / SPEED_OF_LIGHT_KM_S),
        Link::Uplink => frequency_hz * (1.0 + range_rate_km_s / SPEED_OF_LIGHT_KM_S),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementFields;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn record() -> OrbitalElementRecord {
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
    fn position_is_idempotent() {
        let record = record();
        let station = StationPosition::new(48.1, 11.6, 520.0).unwrap();
        let at = record.epoch() + Duration::minutes(17);
        let first = get_position(&record, &station, at).unwrap();
        let second = get_position(&record, &station, at).unwrap();
        assert_eq!(first, second);
        assert!((-90.0..=90.0).contains(&first.elevation_deg));
        assert!((0.0..360.0).contains(&first.azimuth_deg));
        assert!((-180.0..180.0).contains(&first.longitude_deg));
    }

    #[test]
    fn trajectory_is_inclusive_of_end() {
        let record = record();
        let station = StationPosition::default();
        let start = record.epoch();
        let end = start + Duration::seconds(95);
        let points = build_trajectory(&record, &station, start, end, Duration::seconds(30)).unwrap();
        let times: Vec<_> = points.iter().map(|p| (p.at - start).num_seconds()).collect();
        assert_eq!(times, vec![0, 30, 60, 90, 95]);

        assert!(build_trajectory(&record, &station, start, end, Duration::zero())
            .unwrap()
            .is_empty());

        let huge = Duration::milliseconds(10_000_000_000_000_000);
        let points = build_trajectory(&record, &station, start, end, huge).unwrap();
        let times: Vec<_> = points.iter().map(|p| (p.at - start).num_seconds()).collect();
        assert_eq!(times, vec![0, 95]);
    }

    #[test]
    fn doppler_sign_follows_range_rate() {
        let f = 145_800_000.0;
        // approaching satellite: negative range rate, heard higher
        assert!(doppler_shift(f, -7.0, Link::Downlink) > f);
        assert!(doppler_shift(f, -7.0, Link::Uplink) < f);
        assert!(doppler_shift(f, 7.0, Link::Downlink) < f);
        let shift = doppler_shift(f, -7.0, Link::Downlink) - f;
        assert!((shift - 3404.3).abs() < 1.0, "{shift}");

        assert_eq!(Link::from_str("uplink").unwrap(), Link::Uplink);
        assert_eq!(Link::Downlink.to_string(), "downlink");
    }
}
