use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::elements::OrbitalElementRecord;
use crate::frames::SatPos;
use crate::tracker::{get_footprint, get_position, get_track, GroundPoint, TrackPoint};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

pub const MAX_TRACK_POINTS: i64 = 10_000;
pub const MAX_TRACK_MINUTES: f64 = 10_080.0;
pub const MAX_STEP_SECONDS: f64 = 86_400.0;

#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub start: Option<DateTime<Utc>>,
    /// Defaults to one orbital period
    pub minutes: Option<f64>,
    pub step_seconds: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FootprintQuery {
    pub at: Option<DateTime<Utc>>,
    pub resolution: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub norad_id: u32,
    /// Polylines split at the antimeridian
    pub segments: Vec<Vec<TrackPoint>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FootprintResponse {
    pub norad_id: u32,
    pub at: DateTime<Utc>,
    pub points: Vec<GroundPoint>,
}

fn lookup(state: &AppState, id: u32) -> ApiResult<&OrbitalElementRecord> {
    state
        .catalog
        .get(id)
        .map(|r| r.as_ref())
        .ok_or(ApiError::NotFound(id))
}

/// Positive duration of at most `max_seconds`.
fn seconds(value: f64, max_seconds: f64, name: &str) -> ApiResult<Duration> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::Validation(format!("{name} must be positive")));
    }
    if value > max_seconds {
        return Err(ApiError::Validation(format!("{name} is too large")));
    }
    Ok(Duration::milliseconds((value * 1000.0).round() as i64))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{id}/position",
    tag = "tracker",
    params(
        ("id" = u32, Path, description = "NORAD catalog number"),
        ("at" = Option<String>, Query, description = "Instant (RFC3339), defaults to now")
    ),
    responses(
        (status = 200, description = "Observation from the station", body = SatPos),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 422, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn position(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(query): Query<PositionQuery>,
) -> ApiResult<Json<SatPos>> {
    let record = lookup(&state, id)?;
    let at = query.at.unwrap_or_else(Utc::now);
    Ok(Json(get_position(record, &state.station, at)?))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{id}/track",
    tag = "tracker",
    params(
        ("id" = u32, Path, description = "NORAD catalog number"),
        ("start" = Option<String>, Query, description = "Start time (RFC3339), defaults to now"),
        ("minutes" = Option<f64>, Query, description = "Track length, defaults to one period"),
        ("step_seconds" = Option<f64>, Query, description = "Sampling step")
    ),
    responses(
        (status = 200, description = "Ground track", body = TrackResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 422, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<Json<TrackResponse>> {
    let record = lookup(&state, id)?;
    let start = query.start.unwrap_or_else(Utc::now);
    let length = seconds(
        query.minutes.unwrap_or(record.period_minutes()) * 60.0,
        MAX_TRACK_MINUTES * 60.0,
        "minutes",
    )?;
    let step = match query.step_seconds {
        Some(s) => seconds(s, MAX_STEP_SECONDS, "step_seconds")?,
        None => state.config.predict.track_step,
    };
    if step <= Duration::zero()
        || length.num_milliseconds() / step.num_milliseconds().max(1) > MAX_TRACK_POINTS
    {
        return Err(ApiError::Validation(format!(
            "track would exceed {MAX_TRACK_POINTS} points"
        )));
    }

    let end = start
        .checked_add_signed(length)
        .ok_or_else(|| ApiError::Validation("track ends beyond the supported calendar".into()))?;

    let segments = get_track(record, start, end, step)
        .segments(&state.config.predict.antimeridian())?;
    Ok(Json(TrackResponse {
        norad_id: id,
        segments,
    }))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{id}/footprint",
    tag = "tracker",
    params(
        ("id" = u32, Path, description = "NORAD catalog number"),
        ("at" = Option<String>, Query, description = "Instant (RFC3339), defaults to now"),
        ("resolution" = Option<f64>, Query, description = "Bearing step in degrees")
    ),
    responses(
        (status = 200, description = "Visibility footprint", body = FootprintResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 422, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn footprint(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(query): Query<FootprintQuery>,
) -> ApiResult<Json<FootprintResponse>> {
    let record = lookup(&state, id)?;
    let at = query.at.unwrap_or_else(Utc::now);
    let resolution = query
        .resolution
        .unwrap_or(state.config.predict.footprint_resolution_deg);
    if !(resolution.is_finite() && resolution > 0.0 && resolution <= 90.0) {
        return Err(ApiError::Validation(
            "resolution must be within (0, 90]".into(),
        ));
    }

    Ok(Json(FootprintResponse {
        norad_id: id,
        at,
        points: get_footprint(record, at, resolution)?,
    }))
}
