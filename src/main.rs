//! Check-in Dashboard Service
//!
//! Headless attendee table for event check-in: search, filter, sort and
//! windowing over an in-memory collection loaded from the upstream check-in
//! API, with optimistic shirt/meal claim updates.

mod api;
mod claims;
mod config;
mod debounce;
mod errors;
mod models;
mod parser;
mod pipeline;
mod session;
mod store;
mod upstream;
mod window;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use claims::ClaimController;
use config::Config;
use errors::AppError;
use session::TableSession;
use store::{RecordStore, SharedStore};
use upstream::{MutationSink, RecordSource, UpstreamClient};
use window::WindowConfig;

/// Outcome of the most recent load from the upstream.
#[derive(Debug, Clone)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(AppError),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub claims: Arc<ClaimController>,
    pub session: Arc<Mutex<TableSession>>,
    pub source: Arc<dyn RecordSource>,
    pub load: Arc<RwLock<LoadStatus>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, source: Arc<dyn RecordSource>, sink: Arc<dyn MutationSink>) -> Self {
        let store = RecordStore::new().shared();
        let claims = Arc::new(ClaimController::new(store.clone(), sink));
        let session = TableSession::new(
            config.search_debounce,
            WindowConfig {
                overscan: config.overscan,
                ..WindowConfig::new(config.row_height)
            },
        );

        Self {
            store,
            claims,
            session: Arc::new(Mutex::new(session)),
            source,
            load: Arc::new(RwLock::new(LoadStatus::Loading)),
            config: Arc::new(config),
        }
    }
}

/// Fetch the full collection and replace the store with it.
///
/// On failure the store is left untouched and the failure is kept for the view.
pub async fn load_records(state: &AppState) -> Result<usize, AppError> {
    let result = match state.source.fetch_records().await {
        Ok(records) => {
            let count = records.len();
            state
                .store
                .write()
                .await
                .replace_all(records)
                .map(|()| count)
        }
        Err(e) => Err(e),
    };

    let mut load = state.load.write().await;
    match &result {
        Ok(count) => {
            tracing::info!(upstream = %state.config.upstream_url, "Loaded {} records", count);
            *load = LoadStatus::Ready;
        }
        Err(e) => {
            tracing::warn!("Loading records failed: {}", e);
            *load = LoadStatus::Failed(e.clone());
        }
    }

    result
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Check-in Dashboard");
    tracing::info!("Upstream: {}", config.upstream_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    let client = Arc::new(UpstreamClient::new(
        &config.upstream_url,
        config.request_timeout,
    )?);
    let state = AppState::new(config.clone(), client.clone(), client);

    // A failed initial load is reported by the view and retried via /api/reload
    tracing::info!("Loading records...");
    if load_records(&state).await.is_err() {
        tracing::warn!("Starting without records; POST /api/reload to retry");
    }

    let session = state.session.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.lock().await.dispose();
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Table view
        .route("/view", get(api::get_view))
        .route("/view/query", put(api::update_query))
        .route("/view/criteria", put(api::update_criteria))
        .route("/view/criteria", delete(api::clear_criteria))
        .route("/view/sort", put(api::update_sort))
        .route("/view/sort/{column}", post(api::toggle_sort))
        .route("/view/viewport", put(api::update_viewport))
        // Records
        .route("/records", get(api::list_records))
        .route("/records/{id}", get(api::get_record))
        .route("/records/{id}/claims", post(api::update_claim))
        .route("/reload", post(api::reload_records))
        .route("/groups", get(api::list_groups))
        // Claims
        .route("/claims/pending", get(api::list_pending))
        .route("/claims/error", get(api::get_claim_error))
        .route("/claims/error", delete(api::clear_claim_error));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
