use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::config::SatelliteEntry;
use crate::elements::{InvalidElements, OrbitalElementRecord};
use crate::predict::ModeFilter;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("satellite entry {0}: expected exactly one of `tle` or `elements`")]
    Source(usize),
    #[error("satellite entry {index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: InvalidElements,
    },
    #[error("satellite entry {index}: NORAD {norad_id} is already in the catalog")]
    Duplicate { index: usize, norad_id: u32 },
}

/// Validated records of the configured satellites plus their mode tags.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<Arc<OrbitalElementRecord>>,
    modes: HashMap<u32, BTreeSet<String>>,
    rejected: Vec<CatalogError>,
}

impl Catalog {
    /// Build the catalog, keeping every valid entry. Rejected entries are logged and kept
    /// in [`Catalog::rejected`].
    pub fn from_entries(entries: &[SatelliteEntry]) -> Self {
        let mut catalog = Catalog::default();
        for (index, entry) in entries.iter().enumerate() {
            match catalog.add(index, entry) {
                Ok(()) => {}
                Err(e) => {
                    log::warn!("Dropping {}", e);
                    catalog.rejected.push(e);
                }
            }
        }
        log::info!(
            "Catalog holds {} satellite(s), {} rejected",
            catalog.records.len(),
            catalog.rejected.len()
        );
        catalog
    }

    fn add(&mut self, index: usize, entry: &SatelliteEntry) -> Result<(), CatalogError> {
        let record = match (&entry.tle, &entry.elements) {
            (Some(tle), None) => OrbitalElementRecord::from_tle(tle),
            (None, Some(fields)) => fields.clone().build(),
            _ => return Err(CatalogError::Source(index)),
        }
        .map_err(|source| CatalogError::Invalid { index, source })?;

        let norad_id = record.norad_id();
        if self.get(norad_id).is_some() {
            return Err(CatalogError::Duplicate { index, norad_id });
        }
        if !entry.modes.is_empty() {
            self.modes.insert(norad_id, entry.modes.clone());
        }
        self.records.push(Arc::new(record));
        Ok(())
    }

    pub fn records(&self) -> &[Arc<OrbitalElementRecord>] {
        &self.records
    }

    pub fn get(&self, norad_id: u32) -> Option<&Arc<OrbitalElementRecord>> {
        self.records.iter().find(|r| r.norad_id() == norad_id)
    }

    pub fn modes(&self, norad_id: u32) -> Option<&BTreeSet<String>> {
        self.modes.get(&norad_id)
    }

    pub fn mode_filter<I, S>(&self, allowed: I) -> ModeFilter
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ModeFilter::new(allowed, self.modes.clone())
    }

    pub fn rejected(&self) -> &[CatalogError] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const CONFIG: &str = r#"
station:
  coordinates: "48.265, 11.671"
satellites:
  - tle: |
      ISS (ZARYA)
      1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
      2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
    modes: [fm, APRS]
  - elements:
      OBJECT_NAME: TESTSAT
      NORAD_CAT_ID: 90001
      EPOCH: "2020-07-12T21:16:01.000"
      MEAN_MOTION: 15.2
      ECCENTRICITY: 0.0002
      INCLINATION: 97.5
      RA_OF_ASC_NODE: 10.0
      ARG_OF_PERICENTER: 20.0
      MEAN_ANOMALY: 30.0
      BSTAR: 0.0001
    modes: [CW]
  - elements:
      norad_id: 90002
      epoch: "2020-07-12T21:16:01Z"
      mean_motion: 15.2
      eccentricity: 1.2
      inclination_deg: 97.5
      right_ascension_deg: 0
      argument_of_perigee_deg: 0
      mean_anomaly_deg: 0
  - modes: [FM]
  - tle: |
      1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
      2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
"#;

    #[test]
    fn keeps_valid_entries_and_reports_the_rest() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let catalog = Catalog::from_entries(&config.satellites);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(25544).unwrap().name(), "ISS (ZARYA)");
        assert_eq!(catalog.get(90001).unwrap().name(), "TESTSAT");
        assert!(catalog.get(90002).is_none());

        assert_eq!(catalog.rejected().len(), 3);
        assert!(matches!(
            catalog.rejected()[0],
            CatalogError::Invalid {
                index: 2,
                source: InvalidElements::Eccentricity(_)
            }
        ));
        assert_eq!(catalog.rejected()[1], CatalogError::Source(3));
        assert_eq!(
            catalog.rejected()[2],
            CatalogError::Duplicate {
                index: 4,
                norad_id: 25544
            }
        );
    }

    #[test]
    fn builds_mode_filters() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let catalog = Catalog::from_entries(&config.satellites);
        assert!(catalog.modes(25544).unwrap().contains("APRS"));

        let filter = catalog.mode_filter(["FM"]);
        assert!(filter.permits(25544));
        assert!(!filter.permits(90001));
    }
}
