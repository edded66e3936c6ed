//! Student Registry API Server
//!
//! REST API over the in-memory student repository.

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};

use rate_limit::create_governor_config;
use storage::StudentRepository;

/// Application state shared across handlers
pub struct AppState {
    /// Student repository
    pub repository: StudentRepository,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, if a recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state around an existing repository
    pub fn new(repository: StudentRepository) -> Self {
        Self {
            repository,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    /// Create application state as configured
    pub fn from_config(config: &ApiConfig) -> Self {
        let repository = if config.seed_sample_data {
            StudentRepository::seeded()
        } else {
            StudentRepository::new()
        };
        Self::new(repository)
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router.
///
/// Student routes are served at `/students` and under the legacy
/// `/api/student` prefix.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health_handler))
        .route("/metrics", get(routes::health::metrics_handler))
        .nest(routes::students::STUDENTS_PATH, routes::students::student_routes())
        .nest("/api/student", routes::students::student_routes())
        .with_state(state)
}

/// Router with tracing, CORS and (if enabled) rate limiting layers
pub fn build_app(state: Arc<AppState>, config: &ApiConfig) -> Result<Router, ConfigError> {
    let mut app = create_router(state);

    if config.rate_limit.enabled {
        let governor = create_governor_config(&config.rate_limit)?;
        app = app.layer(GovernorLayer { config: governor });
    }

    Ok(app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()))
}

/// Initialize logging
pub fn init_logging(config: &ApiConfig) -> anyhow::Result<()> {
    let level: Level = config
        .log_level
        .parse()
        .map_err(|_| ConfigError::LogLevel(config.log_level.clone()))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    }
}

/// Run the server until Ctrl-C
pub async fn run_server(config: ApiConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_app(state, &config)?;
    let addr = config.socket_addr();

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use storage::Student;
    use tower::ServiceExt;

    fn seeded_app() -> Router {
        create_router(Arc::new(AppState::new(StudentRepository::seeded())))
    }

    fn empty_app() -> Router {
        create_router(Arc::new(AppState::new(StudentRepository::new())))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Option<Value>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_list_empty() {
        let app = empty_app();
        let (status, body) = send(&app, "GET", "/students", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!([])));
    }

    #[tokio::test]
    async fn test_get_seeded_student() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/students/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            Some(json!({"id": 2, "name": "Jane Smith", "age": 19, "grade": "B"}))
        );
    }

    #[tokio::test]
    async fn test_get_missing_is_404_without_body() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/students/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, None);
    }

    #[tokio::test]
    async fn test_create_returns_location_and_record() {
        let app = seeded_app();
        let request = Request::builder()
            .method("POST")
            .uri("/students")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"id": 77, "name": "New", "age": 18, "grade": "C"}).to_string(),
            ))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/students/4");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: Student = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(created, Student::new("New", 18, "C").with_id(4));

        let (status, body) = send(&app, "GET", "/students/4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({"id": 4, "name": "New", "age": 18, "grade": "C"})));
    }

    #[tokio::test]
    async fn test_update_id_mismatch_is_400() {
        // mismatch wins even when neither id exists
        let app = empty_app();
        let body = json!({"id": 6, "name": "X", "age": 1, "grade": "A"});
        let (status, _) = send(&app, "PUT", "/students/5", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_missing_is_404() {
        let app = seeded_app();
        let body = json!({"id": 9, "name": "X", "age": 1, "grade": "A"});
        let (status, _) = send(&app, "PUT", "/students/9", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let app = seeded_app();
        let body = json!({"id": 3, "name": "Robert Johnson", "age": 22, "grade": "A"});
        let (status, response_body) = send(&app, "PUT", "/students/3", Some(body.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(response_body, None);

        let (_, fetched) = send(&app, "GET", "/students/3", None).await;
        assert_eq!(fetched, Some(body));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_404() {
        let app = seeded_app();
        let (status, body) = send(&app, "DELETE", "/students/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, None);

        let (status, _) = send(&app, "GET", "/students/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/students/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let app = empty_app();
        let student = |name: &str| json!({"name": name, "age": 20, "grade": "B"});

        let (_, a) = send(&app, "POST", "/students", Some(student("A"))).await;
        let (_, b) = send(&app, "POST", "/students", Some(student("B"))).await;
        assert_eq!(a.unwrap()["id"], 1);
        assert_eq!(b.unwrap()["id"], 2);

        send(&app, "DELETE", "/students/1", None).await;
        let (_, c) = send(&app, "POST", "/students", Some(student("C"))).await;
        assert_eq!(c.unwrap()["id"], 3);
    }

    #[tokio::test]
    async fn test_legacy_prefix_serves_same_store() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/api/student", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap().as_array().unwrap().len(), 3);

        let (status, _) = send(&app, "DELETE", "/api/student/3", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", "/students/3", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_rejected() {
        let app = seeded_app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/students/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_count() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["student_count"], 3);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_404() {
        let app = seeded_app();
        let (status, _) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_state_from_config() {
        let seeded = AppState::from_config(&ApiConfig::default());
        assert_eq!(seeded.repository.count().unwrap(), 3);

        let config = ApiConfig {
            seed_sample_data: false,
            ..Default::default()
        };
        assert_eq!(AppState::from_config(&config).repository.count().unwrap(), 0);
    }

    #[test]
    fn test_build_app_rejects_bad_rate_limit() {
        let mut config = ApiConfig::default();
        config.rate_limit.enabled = true;
        config.rate_limit.per_second = 0;
        let state = Arc::new(AppState::from_config(&config));
        assert!(matches!(build_app(state, &config), Err(ConfigError::RateLimit(_))));
    }
}
