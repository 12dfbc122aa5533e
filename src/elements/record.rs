use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sgp4::{Constants, Elements, Orbit};
use std::f64::consts::PI;

use crate::elements::InvalidElements;

/// Objects with an orbital period at or above this many minutes use deep-space (SDP4) theory.
pub const DEEP_SPACE_PERIOD_MINUTES: f64 = 225.0;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Raw mean elements as handed over by an ingestion layer.
///
/// Field names follow the crate's snake_case convention but the OMM keywords
/// (`NORAD_CAT_ID`, `MEAN_MOTION`, `RA_OF_ASC_NODE`, ...) are accepted as aliases so an
/// OMM/JSON record deserializes straight into this builder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ElementFields {
    #[serde(alias = "NORAD_CAT_ID")]
    pub norad_id: u32,
    #[serde(alias = "OBJECT_NAME", default)]
    pub name: String,
    #[serde(alias = "EPOCH", deserialize_with = "deserialize_epoch")]
    pub epoch: DateTime<Utc>,
    /// revolutions per day
    #[serde(alias = "MEAN_MOTION")]
    pub mean_motion: f64,
    #[serde(alias = "ECCENTRICITY")]
    pub eccentricity: f64,
    #[serde(alias = "INCLINATION")]
    pub inclination_deg: f64,
    #[serde(alias = "RA_OF_ASC_NODE")]
    pub right_ascension_deg: f64,
    #[serde(alias = "ARG_OF_PERICENTER")]
    pub argument_of_perigee_deg: f64,
    #[serde(alias = "MEAN_ANOMALY")]
    pub mean_anomaly_deg: f64,
    /// B*, 1/earth radii
    #[serde(alias = "BSTAR", default)]
    pub drag_term: f64,
    #[serde(alias = "REV_AT_EPOCH", default)]
    pub revolution_number: u64,
}

impl ElementFields {
    pub fn build(self) -> Result<OrbitalElementRecord, InvalidElements> {
        OrbitalElementRecord::new(self)
    }
}

/// A validated mean-element set for one object at its reference epoch.
///
/// Immutable once built. The SGP4/SDP4 model constants are initialised here, so every
/// later propagation of the record is a pure function of the target instant.
#[derive(Debug, Clone, Serialize)]
pub struct OrbitalElementRecord {
    norad_id: u32,
    name: String,
    epoch: DateTime<Utc>,
    mean_motion: f64,
    eccentricity: f64,
    inclination_deg: f64,
    right_ascension_deg: f64,
    argument_of_perigee_deg: f64,
    mean_anomaly_deg: f64,
    drag_term: f64,
    revolution_number: u64,
    period_minutes: f64,
    deep_space: bool,
    #[serde(skip)]
    constants: Constants,
}

impl OrbitalElementRecord {
    pub fn new(fields: ElementFields) -> Result<Self, InvalidElements> {
        validate(&fields)?;

        let constants = model_constants(&fields)?;
        let period_minutes = MINUTES_PER_DAY / fields.mean_motion;
        let name = if fields.name.trim().is_empty() {
            format!("NORAD {}", fields.norad_id)
        } else {
            fields.name.trim().to_string()
        };

        Ok(Self {
            norad_id: fields.norad_id,
            name,
            epoch: fields.epoch,
            mean_motion: fields.mean_motion,
            eccentricity: fields.eccentricity,
            inclination_deg: fields.inclination_deg,
            right_ascension_deg: fields.right_ascension_deg,
            argument_of_perigee_deg: fields.argument_of_perigee_deg,
            mean_anomaly_deg: fields.mean_anomaly_deg,
            drag_term: fields.drag_term,
            revolution_number: fields.revolution_number,
            period_minutes,
            deep_space: period_minutes >= DEEP_SPACE_PERIOD_MINUTES,
            constants,
        })
    }

    /// Build a record from an element set already parsed by the `sgp4` crate.
    pub fn from_elements(elements: &Elements) -> Result<Self, InvalidElements> {
        let norad_id = u32::try_from(elements.norad_id)
            .map_err(|_| InvalidElements::Tle(format!("catalog number {}", elements.norad_id)))?;

        Self::new(ElementFields {
            norad_id,
            name: elements.object_name.clone().unwrap_or_default(),
            epoch: DateTime::from_naive_utc_and_offset(elements.datetime, Utc),
            mean_motion: elements.mean_motion,
            eccentricity: elements.eccentricity,
            inclination_deg: elements.inclination,
            right_ascension_deg: elements.right_ascension,
            argument_of_perigee_deg: elements.argument_of_perigee,
            mean_anomaly_deg: elements.mean_anomaly,
            drag_term: elements.drag_term,
            revolution_number: elements.revolution_number,
        })
    }

    /// Parse a two- or three-line element set (the optional first line is the object name).
    pub fn from_tle(tle: &str) -> Result<Self, InvalidElements> {
        let (name, line1, line2) = parse_tle_lines(tle)?;
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| InvalidElements::Tle(e.to_string()))?;
        Self::from_elements(&elements)
    }

    pub fn norad_id(&self) -> u32 {
        self.norad_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn inclination_deg(&self) -> f64 {
        self.inclination_deg
    }

    pub fn right_ascension_deg(&self) -> f64 {
        self.right_ascension_deg
    }

    pub fn argument_of_perigee_deg(&self) -> f64 {
        self.argument_of_perigee_deg
    }

    pub fn mean_anomaly_deg(&self) -> f64 {
        self.mean_anomaly_deg
    }

    pub fn drag_term(&self) -> f64 {
        self.drag_term
    }

    pub fn revolution_number(&self) -> u64 {
        self.revolution_number
    }

    pub fn period_minutes(&self) -> f64 {
        self.period_minutes
    }

    pub fn is_deep_space(&self) -> bool {
        self.deep_space
    }

    pub(crate) fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Signed minutes between the epoch and `at`, millisecond resolution.
    pub fn minutes_since_epoch(&self, at: DateTime<Utc>) -> f64 {
        (at - self.epoch).num_milliseconds() as f64 / 60_000.0
    }

    /// Revolution count at `at`, extrapolated from the epoch with the mean period.
    /// `None` before the first ascending node.
    pub fn orbit_number_at(&self, at: DateTime<Utc>) -> Option<u64> {
        let phase = (self.argument_of_perigee_deg + self.mean_anomaly_deg).rem_euclid(360.0) / 360.0;
        let revs =
            self.revolution_number as f64 + phase + self.minutes_since_epoch(at) / self.period_minutes;
        (revs >= 0.0).then(|| revs.floor() as u64)
    }
}

fn validate(fields: &ElementFields) -> Result<(), InvalidElements> {
    let finite = [
        ("mean motion", fields.mean_motion),
        ("eccentricity", fields.eccentricity),
        ("inclination", fields.inclination_deg),
        ("right ascension", fields.right_ascension_deg),
        ("argument of perigee", fields.argument_of_perigee_deg),
        ("mean anomaly", fields.mean_anomaly_deg),
        ("drag term", fields.drag_term),
    ];
    if let Some(&(name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
        return Err(InvalidElements::NotFinite(name));
    }

    if !(0.0..1.0).contains(&fields.eccentricity) {
        return Err(InvalidElements::Eccentricity(fields.eccentricity));
    }
    if fields.mean_motion <= 0.0 {
        return Err(InvalidElements::MeanMotion(fields.mean_motion));
    }
    if !(0.0..=180.0).contains(&fields.inclination_deg) {
        return Err(InvalidElements::Inclination(fields.inclination_deg));
    }
    Ok(())
}

fn model_constants(fields: &ElementFields) -> Result<Constants, InvalidElements> {
    let orbit_0 = Orbit::from_kozai_elements(
        &sgp4::WGS84,
        fields.inclination_deg.to_radians(),
        fields.right_ascension_deg.to_radians(),
        fields.eccentricity,
        fields.argument_of_perigee_deg.to_radians(),
        fields.mean_anomaly_deg.to_radians(),
        // rev/day -> rad/min
        fields.mean_motion * (PI / 720.0),
    )
    .map_err(|e| InvalidElements::Model(e.to_string()))?;

    Constants::new(
        sgp4::WGS84,
        sgp4::iau_epoch_to_sidereal_time,
        sgp4::julian_years_since_j2000(&fields.epoch.naive_utc()),
        fields.drag_term,
        orbit_0,
    )
    .map_err(|e| InvalidElements::Model(e.to_string()))
}

pub(crate) fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), InvalidElements> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.as_slice() {
        [line1, line2] => Ok((None, line1.clone(), line2.clone())),
        [name, line1, line2] => Ok((Some(name.clone()), line1.clone(), line2.clone())),
        _ => Err(InvalidElements::Tle(format!(
            "expected 2 or 3 lines, got {}",
            lines.len()
        ))),
    }
}

/// OMM epochs are usually written without a zone designator; they are UTC.
fn deserialize_epoch<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    fn fields() -> ElementFields {
        ElementFields {
            norad_id: 25544,
            name: "ISS (ZARYA)".into(),
            epoch: Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 1).unwrap(),
            mean_motion: 15.495,
            eccentricity: 0.0001413,
            inclination_deg: 51.6461,
            right_ascension_deg: 221.2784,
            argument_of_perigee_deg: 89.1723,
            mean_anomaly_deg: 280.4612,
            drag_term: -0.000031515,
            revolution_number: 23600,
        }
    }

    #[test]
    fn derives_period_and_regime() {
        let record = fields().build().unwrap();
        assert!((record.period_minutes() - 1440.0 / 15.495).abs() < 1e-9);
        assert!(!record.is_deep_space());

        let geo = ElementFields {
            mean_motion: 1.0027,
            ..fields()
        }
        .build()
        .unwrap();
        assert!(geo.is_deep_space());
    }

    #[test]
    fn deep_space_boundary_is_inclusive() {
        let record = ElementFields {
            mean_motion: 1440.0 / DEEP_SPACE_PERIOD_MINUTES,
            ..fields()
        }
        .build()
        .unwrap();
        assert!(record.is_deep_space());
    }

    #[test]
    fn rejects_out_of_range_elements() {
        let err = ElementFields {
            eccentricity: 1.0,
            ..fields()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, InvalidElements::Eccentricity(1.0));

        let err = ElementFields {
            eccentricity: -0.1,
            ..fields()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, InvalidElements::Eccentricity(-0.1));

        let err = ElementFields {
            mean_motion: 0.0,
            ..fields()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, InvalidElements::MeanMotion(0.0));

        let err = ElementFields {
            inclination_deg: 181.0,
            ..fields()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, InvalidElements::Inclination(181.0));

        let err = ElementFields {
            drag_term: f64::NAN,
            ..fields()
        }
        .build()
        .unwrap_err();
        assert_eq!(err, InvalidElements::NotFinite("drag term"));
    }

    #[test]
    fn parses_three_line_tle() {
        let record = OrbitalElementRecord::from_tle(ISS_TLE).unwrap();
        assert_eq!(record.norad_id(), 25544);
        assert_eq!(record.name(), "ISS (ZARYA)");
        assert!((record.inclination_deg() - 51.6461).abs() < 1e-9);
        assert!((record.mean_motion() - 15.49507896).abs() < 1e-6);
        assert_eq!(record.revolution_number(), 23600);
    }

    #[test]
    fn unnamed_tle_gets_catalog_name() {
        let two_lines: String = ISS_TLE.lines().skip(1).collect::<Vec<_>>().join("\n");
        let record = OrbitalElementRecord::from_tle(&two_lines).unwrap();
        assert_eq!(record.name(), "NORAD 25544");
    }

    #[test]
    fn rejects_malformed_tle() {
        assert!(matches!(
            OrbitalElementRecord::from_tle("just one line"),
            Err(InvalidElements::Tle(_))
        ));
    }

    #[test]
    fn deserializes_omm_field_names() {
        let json = r#"{
            "OBJECT_NAME": "ISS (ZARYA)",
            "NORAD_CAT_ID": 25544,
            "EPOCH": "2020-07-12T21:16:01.000416",
            "MEAN_MOTION": 15.49507896,
            "ECCENTRICITY": 0.0001413,
            "INCLINATION": 51.6461,
            "RA_OF_ASC_NODE": 221.2784,
            "ARG_OF_PERICENTER": 89.1723,
            "MEAN_ANOMALY": 280.4612,
            "BSTAR": -3.1515e-5,
            "REV_AT_EPOCH": 23600
        }"#;
        let fields: ElementFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.norad_id, 25544);
        assert_eq!(fields.epoch.timestamp(), 1594588561);
        let record = fields.build().unwrap();
        assert_eq!(record.name(), "ISS (ZARYA)");
    }

    #[test]
    fn orbit_number_advances_once_per_period() {
        let record = ElementFields {
            argument_of_perigee_deg: 0.0,
            mean_anomaly_deg: 0.0,
            ..fields()
        }
        .build()
        .unwrap();
        let epoch = record.epoch();
        let period_ms = (record.period_minutes() * 60_000.0) as i64;

        assert_eq!(record.orbit_number_at(epoch), Some(23600));
        let later = epoch + chrono::Duration::milliseconds(period_ms * 3 + 1000);
        assert_eq!(record.orbit_number_at(later), Some(23603));
    }
}
