//! Warehouse Management System - Backend Server
//!
//! Master data, stock ledger and document flows (inbound, outbound,
//! transfers, stock counts) for a small multi-warehouse business.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    // Initialize tracing
    let json_logs = config.json_logs();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wms_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting Warehouse Management Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    if let Some(bootstrap) = &config.bootstrap {
        let created = services::AuthService::new(db_pool.clone(), &config)
            .ensure_bootstrap_admin(bootstrap)
            .await?;
        if created {
            tracing::info!("Created initial admin account '{}'", bootstrap.admin_username);
        }
    }

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_app() -> Router {
        let config = Config::for_tests();
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database.url)
            .expect("lazy pool");
        create_app(AppState {
            db,
            config: Arc::new(config),
        })
    }

    fn token(role: &str) -> String {
        services::auth::encode_access_token(Uuid::new_v4(), "tester", role, "test-secret", 3600)
            .expect("token")
    }

    fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).expect("request")
    }

    async fn error_code(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        body["error"]["code"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = tokio_test::assert_ok!(
            test_app().oneshot(request(Method::GET, "/", None)).await
        );
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::GET, "/api/v1/items", None))
                .await
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::GET, "/api/v1/dashboard", Some("not-a-jwt")))
                .await
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_logout_requires_token() {
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::POST, "/api/v1/auth/logout", None))
                .await
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_staff_cannot_delete() {
        let staff = token("staff");
        let uri = format!("/api/v1/items/{}", Uuid::new_v4());
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::DELETE, &uri, Some(&staff)))
                .await
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let uri = format!("/api/v1/outbound/{}", Uuid::new_v4());
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::DELETE, &uri, Some(&staff)))
                .await
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_code(response).await, "INSUFFICIENT_PERMISSIONS");
    }

    #[tokio::test]
    async fn test_staff_cannot_manage_users() {
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::GET, "/api/v1/users", Some(&token("staff"))))
                .await
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_template_download() {
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(
                    Method::GET,
                    "/api/v1/templates/items",
                    Some(&token("staff"))
                ))
                .await
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            services::spreadsheet::XLSX_CONTENT_TYPE
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"items-template.xlsx\""
        );
    }

    #[tokio::test]
    async fn test_unknown_template_and_report() {
        let admin = token("admin");
        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::GET, "/api/v1/templates/pallets", Some(&admin)))
                .await
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = tokio_test::assert_ok!(
            test_app()
                .oneshot(request(Method::GET, "/api/v1/exports/pallets", Some(&admin)))
                .await
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
