//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use secrecy::Secret;
use service_core::error::AppError;
use service_core::grpc::trace_context_interceptor;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tonic::transport::Server as GrpcServer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{JwtConfig, PvzConfig};
use crate::grpc::{
    proto::{pvz_service_server::PvzServiceServer, FILE_DESCRIPTOR_SET},
    PvzServiceImpl,
};
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::repository::{StoreHealth, Stores};
use crate::services::{
    init_metrics, Database, JwtService, ProductService, PvzService, ReceptionService, UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtService,
    pub pvz: PvzService,
    pub receptions: ReceptionService,
    pub products: ProductService,
    pub users: UserService,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Wire every service to the given stores.
    pub fn new(stores: Stores, jwt: JwtService) -> Self {
        Self {
            jwt,
            pvz: PvzService::new(
                stores.pvz.clone(),
                stores.receptions.clone(),
                stores.products.clone(),
            ),
            receptions: ReceptionService::new(stores.receptions.clone()),
            products: ProductService::new(stores.products.clone(), stores.receptions.clone()),
            users: UserService::new(stores.users.clone()),
            health: stores.health,
        }
    }

    /// State over fresh in-memory stores, signing tokens with `jwt_secret`.
    pub fn in_memory(jwt_secret: &str) -> Self {
        let jwt = JwtService::new(&JwtConfig {
            secret: Secret::new(jwt_secret.to_string()),
            expiry_minutes: 60,
        });
        Self::new(Stores::in_memory(), jwt)
    }
}

/// Build the HTTP router with every route and middleware layer.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let protected = Router::new()
        .route(
            "/pvz",
            post(handlers::pvz::create_pvz).get(handlers::pvz::list_pvz),
        )
        .route(
            "/pvz/:pvzId/close_last_reception",
            post(handlers::reception::close_last_reception),
        )
        .route(
            "/pvz/:pvzId/delete_last_product",
            post(handlers::product::delete_last_product),
        )
        .route("/receptions", post(handlers::reception::create_reception))
        .route("/products", post(handlers::product::add_product))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/dummyLogin", post(handlers::auth::dummy_login))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .merge(protected)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_listener: TcpListener,
    request_timeout: Duration,
    db: Arc<Database>,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: PvzConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: PvzConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: PvzConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);
        let state = AppState::new(Stores::postgres(db.clone()), JwtService::new(&config.jwt));

        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        let grpc_addr = SocketAddr::from(([0, 0, 0, 0], config.grpc_port));
        let grpc_listener = TcpListener::bind(grpc_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %grpc_addr, "Failed to bind gRPC listener");
            AppError::from(e)
        })?;
        let grpc_port = grpc_listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            grpc_port = grpc_port,
            "Pvz service listeners bound"
        );

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_listener,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            db,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get the gRPC port the server is listening on.
    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let http_router = build_router(self.state.clone(), self.request_timeout);

        let pvz_service = PvzServiceImpl::new(self.state.pvz.clone());

        // gRPC health service
        let (mut health_reporter, grpc_health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<PvzServiceServer<PvzServiceImpl>>()
            .await;

        // Reflection service for debugging
        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()
            .map_err(|e| {
                std::io::Error::other(format!("Failed to build reflection service: {}", e))
            })?;

        let grpc_trace_layer = TraceLayer::new_for_grpc()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::DEBUG));

        let pvz_service_with_interceptor =
            PvzServiceServer::with_interceptor(pvz_service, trace_context_interceptor);

        let incoming = tokio_stream::wrappers::TcpListenerStream::new(self.grpc_listener);
        let grpc_server = GrpcServer::builder()
            .layer(grpc_trace_layer)
            .add_service(grpc_health_service)
            .add_service(reflection_service)
            .add_service(pvz_service_with_interceptor)
            .serve_with_incoming(incoming);

        tracing::info!(
            service = "pvz-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            grpc_port = self.grpc_port,
            "Service ready to accept connections"
        );

        // Run both servers concurrently
        tokio::select! {
            result = axum::serve(self.http_listener, http_router) => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "HTTP server error");
                    return Err(std::io::Error::other(format!("HTTP server error: {}", e)));
                }
            }
            result = grpc_server => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "gRPC server error");
                    return Err(std::io::Error::other(format!("gRPC server error: {}", e)));
                }
            }
        }

        Ok(())
    }
}
