#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use stockroom::api::{self, AppState};
use stockroom::config::Config;
use stockroom::db::Store;
use stockroom::state::SharedState;

pub const PREFIX: &str = "/api/v1";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password-1";

pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    ApiKey(&'a str),
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_file(&self.db_path).ok();
    }
}

pub fn test_config(db_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.general.database_url = format!("sqlite:{}", db_path.display());
    config.security.secret_key = "integration-test-secret".to_string();
    // Cheap Argon2 so the suites stay fast
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config.bootstrap.first_superuser = ADMIN_EMAIL.to_string();
    config.bootstrap.first_superuser_password = ADMIN_PASSWORD.to_string();
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let db_path =
        std::env::temp_dir().join(format!("stockroom-test-{}.db", uuid::Uuid::new_v4()));
    let mut config = test_config(&db_path);
    customize(&mut config);

    let shared = SharedState::new(config)
        .await
        .expect("Failed to create shared state");
    shared
        .store
        .init_superuser(&shared.config.bootstrap)
        .await
        .expect("Failed to bootstrap superuser");

    let state = api::create_app_state(Arc::new(shared), None);
    let router = api::router(state.clone());

    TestApp {
        router,
        state,
        db_path,
    }
}

impl TestApp {
    pub fn store(&self) -> &Store {
        self.state.store()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, path: &str, auth: Auth<'_>) -> (StatusCode, Value) {
        self.send(request("GET", path, auth).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, path: &str, auth: Auth<'_>) -> (StatusCode, Value) {
        self.send(request("DELETE", path, auth).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: &str,
        path: &str,
        auth: Auth<'_>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(
            request(method, path, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let form = format!(
            "username={}&password={}",
            urlencoding::encode(email),
            urlencoding::encode(password)
        );
        self.send(
            request("POST", "/login/access-token", Auth::None)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
    }

    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Signs up a regular user and returns (id, token).
    pub async fn regular_user(&self, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .json(
                "POST",
                "/users/signup",
                Auth::None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        let id = body["id"].as_str().unwrap().to_string();
        (id, self.token_for(email, password).await)
    }

    /// Creates an API key as the superuser and returns its raw secret.
    pub async fn api_key(&self) -> String {
        let token = self.admin_token().await;
        let (status, body) = self
            .json(
                "POST",
                "/api-keys/",
                Auth::Bearer(&token),
                serde_json::json!({ "name": "test-client" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "api key creation failed: {body}");
        body["key"].as_str().unwrap().to_string()
    }
}

fn request(method: &str, path: &str, auth: Auth<'_>) -> axum::http::request::Builder {
    let builder = Request::builder()
        .method(method)
        .uri(format!("{PREFIX}{path}"));

    match auth {
        Auth::None => builder,
        Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        Auth::ApiKey(key) => builder.header("X-API-Key", key),
    }
}
