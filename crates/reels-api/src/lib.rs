//! HTTP surface of the marketplace.
//!
//! Handlers load state inside a database transaction, ask `reels-workflow`
//! what the request is allowed to do, persist the outcome, and only then hand
//! the resulting intents to the [`Dispatcher`](reels_notify::Dispatcher).

pub mod auth;
pub mod categories;
pub mod error;
pub mod extract;
pub mod improvements;
pub mod middleware;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod portfolio;
pub mod projects;
pub mod proposals;
mod transitions;


use axum::{
    Json, Router,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use reels_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

pub fn router(state: AppState) -> Router {
    let auth_layer = from_fn_with_state(state.clone(), require_auth);

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/register-creator", post(auth::register_creator))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-email", get(auth::verify_email))
        // Reads are public, writes need a token
        .route(
            "/categories",
            get(categories::list).post(categories::create.layer(auth_layer.clone())),
        )
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update.layer(auth_layer.clone()))
                .delete(categories::delete.layer(auth_layer.clone())),
        )
        .route(
            "/portfolio",
            get(portfolio::list).post(portfolio::create.layer(auth_layer.clone())),
        )
        .route(
            "/portfolio/{id}",
            get(portfolio::list_for_user).put(portfolio::update.layer(auth_layer.clone())),
        );

    let protected_routes = Router::new()
        .route("/orders", get(orders::list_mine).post(orders::create))
        .route("/orders/open", get(orders::list_open))
        .route("/orders/cancel/{id}", put(orders::cancel))
        .route("/orders/{id}", get(orders::get))
        .route("/proposals", post(proposals::create))
        .route("/proposals/mine", get(proposals::list_mine))
        .route("/proposals/order/{order_id}", get(proposals::list_for_order))
        .route("/proposals/{id}/status", put(proposals::update_status))
        .route("/projects", post(projects::create))
        .route("/projects/{id}", get(projects::get).put(projects::update))
        .route("/improvements", post(improvements::create))
        .route("/improvements/project/{project_id}", get(improvements::list))
        .route("/notifications", get(notifications::list))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/api/stripe/create-checkout-session", post(payments::create_checkout_session))
        .route("/api/stripe/onboarding-link", post(payments::onboarding_link))
        .route("/api/stripe/account", get(payments::account))
        .route_layer(auth_layer);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs synchronous database work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
}
