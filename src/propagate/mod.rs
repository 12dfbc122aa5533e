mod error;
mod propagator;

pub use error::PropagationError;
pub use propagator::{propagate, PropagationState, EARTH_RADIUS_KM, MU_KM3_S2};
