mod footprint;
mod ground_track;
mod trajectory;

pub use footprint::{
    footprint_half_angle, get_footprint, range_ring, GroundPoint,
    DEFAULT_FOOTPRINT_RESOLUTION_DEG, MEAN_EARTH_RADIUS_KM,
};
pub use ground_track::{
    get_track, split_antimeridian, AntimeridianSplit, GroundTrack, TrackIter, TrackPoint,
};
pub use trajectory::{
    build_trajectory, doppler_shift, get_position, pass_path, Link, SPEED_OF_LIGHT_KM_S,
};
