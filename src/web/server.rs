use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::Catalog;
use crate::config::{Config, ConfigError};
use crate::frames::StationPosition;
use crate::predict::PassAggregator;

use super::api::catalog as catalog_handlers;
use super::api::predict as predict_handlers;
use super::api::tracker as tracker_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
    pub station: StationPosition,
    pub aggregator: PassAggregator,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let station = config.station.position()?;
        let catalog = Catalog::from_entries(&config.satellites);
        let aggregator = PassAggregator::new(config.predict.pass_finder());
        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            station,
            aggregator,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/satellites", get(catalog_handlers::list_satellites))
        .route("/api/passes", get(predict_handlers::list_passes))
        .route(
            "/api/satellites/{id}/position",
            get(tracker_handlers::position),
        )
        .route("/api/satellites/{id}/track", get(tracker_handlers::track))
        .route(
            "/api/satellites/{id}/footprint",
            get(tracker_handlers::footprint),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let state = AppState::new(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
            log::info!("Shutting down");
        })
        .await
}
