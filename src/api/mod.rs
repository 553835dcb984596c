use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, Environment};
use crate::db::Store;
use crate::services::AuthService;
use crate::state::SharedState;

mod api_keys;
pub mod auth;
mod error;
mod extract;
mod items;
mod login;
mod observability;
mod private;
mod types;
mod users;
mod utils;
mod validation;

pub use error::{ApiError, ErrorBody};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let prefix = config.server.api_prefix.trim_end_matches('/').to_string();
    let cors_origins = config.server.cors_allowed_origins.clone();
    let local = config.general.environment == Environment::Local;

    let mut api_router = Router::new()
        .route("/login/access-token", post(login::access_token))
        .route("/login/test-token", post(login::test_token))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/signup", post(users::signup))
        .route(
            "/users/me",
            get(users::read_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .route("/users/me/password", patch(users::update_password_me))
        .route(
            "/users/{id}",
            get(users::read_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/api-keys/",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/api-keys/{id}",
            axum::routing::delete(api_keys::revoke_api_key),
        )
        .route("/utils/health-check/", get(utils::health_check))
        .route("/metrics", get(observability::get_metrics))
        .merge(create_item_router(state.clone()));

    if local {
        api_router = api_router.route("/private/users/", post(private::create_user));
    }

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = api_router.with_state(state);
    let app = if prefix.is_empty() {
        api_router
    } else {
        Router::new().nest(&prefix, api_router)
    };

    app.layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
}

/// Machine routes; every request must carry a valid `X-API-Key`.
fn create_item_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/items/", get(items::list_items).post(items::create_item))
        .route(
            "/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::api_key_middleware,
        ))
}
