//! Apit API Gateway
//!
//! The HTTP entry point of the conference service.
//! Handles:
//! - Article submission (Word upload and inline editor)
//! - Conference and topic management for organizers
//! - Authentication and rate limiting
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;
mod services;
#[cfg(test)]
mod testing;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    routing::{delete, get, post, MethodRouter},
    Router,
};
use apit_common::{
    auth::JwtManager,
    config::{AppConfig, ObservabilityConfig},
    db::{DataGateway, DbPool, Repository},
    errors::AppError,
    metrics,
};
use apit_ingestion::{CommandConverter, DocumentIngestor, DocumentStore};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use middleware::rate_limit::{rate_limit_middleware, SubmissionLimiter};
use services::{ArticleService, ConferenceService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn DataGateway>,
    pub ingestor: Arc<DocumentIngestor>,
    pub articles: Arc<ArticleService>,
    pub conferences: Arc<ConferenceService>,
    pub jwt: Arc<JwtManager>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        gateway: Arc<dyn DataGateway>,
        ingestor: Arc<DocumentIngestor>,
        jwt: Arc<JwtManager>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            articles: Arc::new(ArticleService::new(gateway.clone(), ingestor.clone())),
            conferences: Arc::new(ConferenceService::new(gateway.clone())),
            config,
            gateway,
            ingestor,
            jwt,
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    
    // Load configuration
    let config = Arc::new(AppConfig::load()?);
    
    // Initialize tracing
    init_tracing(&config.observability);
    
    info!(
        service = %config.observability.service_name,
        "Starting Apit API Gateway v{}",
        apit_common::VERSION
    );
    
    // Initialize metrics
    let metrics_handle = install_metrics_recorder(&config)?;
    metrics::register_metrics();
    
    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }
    let gateway: Arc<dyn DataGateway> = Arc::new(Repository::new(db));
    
    // Document storage and converter
    let store = DocumentStore::new(config.storage.root.clone());
    store.ensure_root().await?;
    info!(
        root = %store.root().display(),
        converter = %config.converter.program,
        timeout_secs = config.converter_timeout().as_secs(),
        "Document storage ready"
    );
    let converter = Arc::new(CommandConverter::from_config(&config.converter));
    let ingestor = Arc::new(DocumentIngestor::new(store, converter));
    
    // Token validation
    let secret = config
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration {
            message: "auth.jwt_secret must be set".to_string(),
        })?;
    let jwt = Arc::new(JwtManager::new(secret, config.auth.jwt_expiration_secs));
    
    // Create app state
    let state = AppState::new(config.clone(), gateway, ingestor, jwt, metrics_handle);
    
    // Build the router
    let app = create_router(state);
    
    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);
    
    let listener = tokio::net::TcpListener::bind(addr).await?;
    
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    
    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Install the Prometheus recorder when metrics are enabled
fn install_metrics_recorder(config: &AppConfig) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }
    
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("document_conversion_duration_seconds".to_string()),
            metrics::CONVERSION_BUCKETS,
        )?
        .install_recorder()?;
    
    Ok(Some(handle))
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    
    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();
    
    // Document conversion is the expensive path, so only submissions are throttled
    let limiter = SubmissionLimiter::from_config(&config.rate_limit);
    let limited = |route: MethodRouter<AppState>| {
        if config.rate_limit.enabled {
            route.route_layer(axum::middleware::from_fn_with_state(
                limiter.clone(),
                rate_limit_middleware,
            ))
        } else {
            route
        }
    };
    
    let routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::metrics::render))
        
        // Article endpoints
        .route(
            "/articles/create",
            get(handlers::articles::create_form).merge(limited(post(handlers::articles::create))),
        )
        .route("/articles/compose", limited(post(handlers::articles::compose)))
        .route("/articles/index", get(handlers::articles::index))
        .route(
            "/articles/edit",
            get(handlers::articles::edit_view_missing_id).post(handlers::articles::edit_submit),
        )
        .route("/articles/edit/{id}", get(handlers::articles::edit_view))
        .route("/articles/delete/{id}", post(handlers::articles::delete))
        
        // Conference endpoints (organizers)
        .route("/conferences", post(handlers::conferences::create_conference))
        .route("/conferences/current", get(handlers::conferences::current_conference))
        .route("/conferences/{id}", delete(handlers::conferences::delete_conference))
        .route("/conferences/{id}/topics", post(handlers::conferences::add_topic))
        .route("/topics/{id}", delete(handlers::conferences::delete_topic));
    
    // Compose the app
    routes
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_upload_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // The id must be set before it can be propagated, so this goes outermost
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
