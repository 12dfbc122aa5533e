use std::collections::BTreeSet;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::web::api::error::ApiResult;
use crate::web::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteInfo {
    pub norad_id: u32,
    pub name: String,
    pub epoch: DateTime<Utc>,
    pub period_minutes: f64,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub deep_space: bool,
    pub modes: BTreeSet<String>,
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    tag = "catalog",
    responses(
        (status = 200, description = "Satellites in the catalog", body = Vec<SatelliteInfo>)
    )
)]
pub async fn list_satellites(State(state): State<AppState>) -> ApiResult<Json<Vec<SatelliteInfo>>> {
    let satellites = state
        .catalog
        .records()
        .iter()
        .map(|record| SatelliteInfo {
            norad_id: record.norad_id(),
            name: record.name().to_string(),
            epoch: record.epoch(),
            period_minutes: record.period_minutes(),
            inclination_deg: record.inclination_deg(),
            eccentricity: record.eccentricity(),
            deep_space: record.is_deep_space(),
            modes: state
                .catalog
                .modes(record.norad_id())
                .cloned()
                .unwrap_or_default(),
        })
        .collect();
    Ok(Json(satellites))
}
