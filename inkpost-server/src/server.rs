use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::infrastructure::settings::Settings;
use crate::presentation::middleware::cors::apply_cors;
use crate::presentation::middleware::trace::apply_trace;
use crate::presentation::openapi::ApiDoc;
use crate::presentation::{AppState, PROFILE_PICS_ROUTE, routes};

pub(crate) async fn run_http(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let app = build_router(settings, state)?;

    let listener = TcpListener::bind(&settings.http_addr).await?;

    info!("HTTP server listening on {}", settings.http_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_router(settings: &Settings, state: AppState) -> anyhow::Result<Router> {
    let app = routes::routes(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service(PROFILE_PICS_ROUTE, ServeDir::new(&settings.media_dir))
        .layer(DefaultBodyLimit::max(settings.http_request_body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            settings.http_request_timeout_secs,
        )));

    let app = apply_trace(app);
    apply_cors(app, settings)
}
