mod aggregate;
mod error;
mod pass_finder;
mod types;

pub use aggregate::PassAggregator;
pub use error::PredictError;
pub use pass_finder::{
    find_passes, PassFinder, DEFAULT_COARSE_STEP_SECONDS, DEFAULT_TOLERANCE_MILLISECONDS,
};
pub use types::{horizon_end, ModeFilter, Pass, PassQuery, PassReport};
