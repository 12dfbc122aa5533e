use utoipa::OpenApi;

use super::api::catalog::SatelliteInfo;
use super::api::error::ErrorResponse;
use super::api::predict::PassesResponse;
use super::api::tracker::{FootprintResponse, TrackResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::catalog::list_satellites,
        super::api::predict::list_passes,
        super::api::tracker::position,
        super::api::tracker::track,
        super::api::tracker::footprint,
    ),
    components(
        schemas(
            SatelliteInfo,
            PassesResponse,
            TrackResponse,
            FootprintResponse,
            ErrorResponse,
            crate::predict::Pass,
            crate::frames::SatPos,
            crate::frames::StationPosition,
            crate::tracker::TrackPoint,
            crate::tracker::GroundPoint,
        )
    ),
    info(
        title = "satpass API",
        description = "Satellite positions, ground tracks, footprints and pass predictions",
        version = "0.1.0"
    ),
    tags(
        (name = "catalog", description = "Configured satellites"),
        (name = "predict", description = "Pass prediction"),
        (name = "tracker", description = "Positions, ground tracks and footprints")
    )
)]
pub struct ApiDoc;
