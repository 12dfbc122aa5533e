use chrono::{Duration, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use satpass::catalog::Catalog;
use satpass::config::Config;
use satpass::elements::{ElementFields, OrbitalElementRecord};
use satpass::frames::{geodetic_to_teme, normalize_longitude_deg, to_geodetic};
use satpass::predict::{PassAggregator, PassQuery};
use satpass::propagate::{propagate, EARTH_RADIUS_KM};

const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

const CONFIG: &str = r#"
station:
  name: Garching
  coordinates: "48.265, 11.671"
  altitude_m: 480
predict:
  horizon_hours: 24
  min_elevation_deg: 10
satellites:
  - tle: |
      ISS (ZARYA)
      1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
      2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
    modes: [FM]
  - elements:
      OBJECT_NAME: SUNSYNC
      NORAD_CAT_ID: 90001
      EPOCH: "2020-07-12T12:00:00.000"
      MEAN_MOTION: 14.8
      ECCENTRICITY: 0.001
      INCLINATION: 98.2
      RA_OF_ASC_NODE: 200.0
      ARG_OF_PERICENTER: 90.0
      MEAN_ANOMALY: 270.0
      BSTAR: 0.00002
    modes: [CW]
"#;

fn iss() -> OrbitalElementRecord {
    OrbitalElementRecord::from_tle(ISS_TLE).unwrap()
}

fn deep_space(mean_motion: f64, eccentricity: f64, inclination_deg: f64) -> OrbitalElementRecord {
    ElementFields {
        norad_id: 40000,
        name: "DEEP".into(),
        epoch: Utc.with_ymd_and_hms(2020, 7, 12, 0, 0, 0).unwrap(),
        mean_motion,
        eccentricity,
        inclination_deg,
        right_ascension_deg: 40.0,
        argument_of_perigee_deg: 270.0,
        mean_anomaly_deg: 10.0,
        drag_term: 0.0,
        revolution_number: 0,
    }
    .build()
    .unwrap()
}

#[test]
fn iss_ground_track_shifts_west_each_revolution() {
    let record = iss();
    let start = record.epoch();
    let period = Duration::milliseconds((record.period_minutes() * 60_000.0) as i64);

    let before = to_geodetic(&propagate(&record, start).unwrap());
    let after = to_geodetic(&propagate(&record, start + period).unwrap());

    let shift = normalize_longitude_deg(after.longitude_deg - before.longitude_deg);
    assert!((-27.0..-20.0).contains(&shift), "shift {shift}");
    assert!((after.latitude_deg - before.latitude_deg).abs() < 1.0);
}

#[test]
fn geodetic_round_trip_within_a_kilometre() {
    let record = iss();
    for minutes in [0, 13, 47, 90, 600, 1440] {
        let at = record.epoch() + Duration::minutes(minutes);
        let state = propagate(&record, at).unwrap();
        let back = geodetic_to_teme(&to_geodetic(&state), at);
        let error = (0..3)
            .map(|i| (back[i] - state.position_km[i]).powi(2))
            .sum::<f64>()
            .sqrt();
        assert!(error < 1.0, "{error} km at +{minutes} min");
    }
}

#[test]
fn propagated_radius_stays_in_band() {
    let records = [
        iss(),
        deep_space(1.00273791, 0.0002, 0.05),
        deep_space(2.00613, 0.74, 63.4),
    ];
    for record in &records {
        for hours in [0, 5, 17, 48, 120] {
            let state = propagate(record, record.epoch() + Duration::hours(hours)).unwrap();
            let altitude = state.radius_km() - EARTH_RADIUS_KM;
            assert!(
                (150.0..50_000.0).contains(&altitude),
                "NORAD {} altitude {altitude} at +{hours} h",
                record.norad_id()
            );
        }
    }
}

#[tokio::test]
async fn config_to_ordered_passes() {
    let config = Config::from_yaml(CONFIG).unwrap();
    let station = config.station.position().unwrap();
    let catalog = Catalog::from_entries(&config.satellites);
    assert_eq!(catalog.len(), 2);
    assert!(catalog.rejected().is_empty());

    let reference = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();
    let query = PassQuery::new(
        reference,
        config.predict.horizon_hours,
        config.predict.min_elevation_deg,
    );
    let aggregator = PassAggregator::new(config.predict.pass_finder());
    let report = aggregator
        .compute_passes(catalog.records(), station, &query, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    assert!(report.passes.iter().any(|p| p.norad_id == 25544));
    assert!(report.passes.iter().any(|p| p.norad_id == 90001));
    let window_end = query.window_end().unwrap();
    for pass in &report.passes {
        assert!(pass.max_elevation_deg > 10.0);
        assert!(pass.los >= reference && pass.aos <= window_end);
        assert!(pass.aos <= pass.tca && pass.tca <= pass.los);
    }
    for pair in report.passes.windows(2) {
        assert!((pair[0].aos, pair[0].norad_id) <= (pair[1].aos, pair[1].norad_id));
    }

    let fm_only = query.clone().with_modes(catalog.mode_filter(["FM"]));
    let report = aggregator
        .compute_passes(catalog.records(), station, &fm_only, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.passes.iter().all(|p| p.norad_id == 25544));
}
