use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde::Serialize;

use super::AppState;
use super::handlers::account::{get_account, update_account};
use super::handlers::auth::{login, logout, register};
use super::handlers::pages::{about, home};
use super::handlers::posts::{delete_post, get_post, new_post, update_post};
use super::middleware::auth::session_auth_middleware;

pub(crate) fn routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(home))
        .route("/home", get(home))
        .route("/about", get(about))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout));

    let protected = Router::new()
        .route("/account", get(get_account).post(update_account))
        .route("/post/new", post(new_post))
        .route("/post/{id}", get(get_post))
        .route("/post/{id}/update", post(update_post))
        .route("/post/{id}/delete", post(delete_post))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(health_handler))
        .merge(public)
        .merge(protected)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}
