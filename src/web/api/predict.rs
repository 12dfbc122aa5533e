use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::predict::{Pass, PassQuery};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

pub const MAX_HORIZON_HOURS: u32 = 240;

#[derive(Debug, Deserialize)]
pub struct PassesQuery {
    /// Defaults to now
    pub start: Option<DateTime<Utc>>,
    pub hours: Option<u32>,
    pub min_elevation: Option<f64>,
    /// Comma separated list of allowed modes
    pub modes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassesResponse {
    pub passes: Vec<Pass>,
    pub satellite_count: usize,
    /// Satellites whose search failed
    pub failures: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "predict",
    params(
        ("start" = Option<String>, Query, description = "Start time (RFC3339), defaults to now"),
        ("hours" = Option<u32>, Query, description = "Search horizon in hours"),
        ("min_elevation" = Option<f64>, Query, description = "Minimum elevation (degrees)"),
        ("modes" = Option<String>, Query, description = "Comma separated allowed modes")
    ),
    responses(
        (status = 200, description = "Pass predictions", body = PassesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassesResponse>> {
    let defaults = &state.config.predict;
    let hours = query.hours.unwrap_or(defaults.horizon_hours);
    if hours > MAX_HORIZON_HOURS {
        return Err(ApiError::Validation(format!(
            "hours must not exceed {MAX_HORIZON_HOURS}"
        )));
    }
    let min_elevation = query.min_elevation.unwrap_or(defaults.min_elevation_deg);
    if !(-90.0..=90.0).contains(&min_elevation) {
        return Err(ApiError::Validation(
            "min_elevation must be within [-90, 90]".into(),
        ));
    }

    let mut pass_query = PassQuery::new(query.start.unwrap_or_else(Utc::now), hours, min_elevation);
    if let Some(modes) = query.modes.as_deref() {
        let allowed: Vec<_> = modes
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect();
        pass_query = pass_query.with_modes(state.catalog.mode_filter(allowed));
    }

    // stops the blocking searches when the client goes away
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let report = state
        .aggregator
        .compute_passes(state.catalog.records(), state.station, &pass_query, &cancel)
        .await?;

    let satellites: HashSet<_> = report.passes.iter().map(|p| p.norad_id).collect();
    Ok(Json(PassesResponse {
        satellite_count: satellites.len(),
        failures: report.failures.iter().map(ToString::to_string).collect(),
        passes: report.passes,
    }))
}
