mod error;
mod record;

pub use error::InvalidElements;
pub use record::{ElementFields, OrbitalElementRecord, DEEP_SPACE_PERIOD_MINUTES};
