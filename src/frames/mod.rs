mod observation;
mod station;
mod sun;
mod transform;

pub use observation::SatPos;
pub use station::StationPosition;
pub use sun::{is_eclipsed, sun_position_km};
pub use transform::*;
