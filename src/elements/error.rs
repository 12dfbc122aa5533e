use thiserror::Error;

/// Reasons an element set is rejected at construction time.
///
/// A rejected record is dropped by the ingestion layer; it is never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidElements {
    #[error("eccentricity {0} outside [0, 1)")]
    Eccentricity(f64),
    #[error("mean motion {0} rev/day must be positive")]
    MeanMotion(f64),
    #[error("inclination {0} deg outside [0, 180]")]
    Inclination(f64),
    #[error("{0} is not a finite number")]
    NotFinite(&'static str),
    #[error("invalid tle: {0}")]
    Tle(String),
    #[error("elements rejected by sgp4 model: {0}")]
    Model(String),
}
