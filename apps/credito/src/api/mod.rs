//! # Credito HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `POST /login` - Open a session, returns a bearer token
//! - `POST /logout` - Drop the caller's bearer token
//! - `GET /health` - Health check
//! - `GET /kpis` - Desk counters and total approved limit
//! - `GET /companies` - List companies (optional `?agente=` filter)
//! - `POST /companies` - Register a company
//! - `GET /companies/{name}` - Fetch one company
//! - `PUT /companies/{name}` - Partial update (analyst only)
//! - `DELETE /companies/{name}` - Delete with cascade (analyst only)
//! - `GET /companies/{name}/pendencias` - Document checklist (`?pendentes=true`)
//! - `PUT /companies/{name}/pendencias` - Batch status update (analyst only)
//! - `POST /companies/{name}/transitions` - Move workflow stage (analyst only)
//! - `GET /companies/{name}/progress` - Deadline-progress report
//! - `POST /enquadramento` - Concentration report for a fund
//! - `POST /pdd` - PDD pivot over posted entries
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `CREDITO_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `CREDITO_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//!
//! Every endpoint except `/health` and `/login` requires a bearer token from
//! the config's `[[users]]` credential table.

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::{AuthRegistry, UserContext};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `credito::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    delete_company_handler, enquadramento_handler, get_company_handler, health_handler,
    kpis_handler, list_companies_handler, list_pendencias_handler, login_handler, logout_handler,
    move_stage_handler, pdd_handler, progress_handler, register_company_handler,
    update_company_handler, update_pendencias_handler,
};
#[allow(unused_imports)]
pub use types::{
    CompaniesResponse, CompanyResponse, EnquadramentoRequest, EnquadramentoResponse,
    HealthResponse, KpisResponse, LoginRequest, LoginResponse, MoveStageRequest, OpResponse,
    PddEntryJson, PddRequest, PddResponse, PendenciaStatusJson, PendenciaUpdateRequest,
    PendenciasResponse, PositionJson, ProgressResponse, RegisterRequest, TransitionResponse,
    UpdateRequest,
};

use crate::config::AppConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use credito_core::{CreditoError, Desk, FundLimits};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the desk behind a lock, the session registry, and
/// the configured fund caps.
#[derive(Clone)]
pub struct AppState {
    /// The desk engine.
    pub desk: Arc<RwLock<Desk>>,
    /// Credential table and live bearer tokens.
    pub auth: Arc<AuthRegistry>,
    /// Fund concentration caps by lowercase fund name.
    pub funds: Arc<BTreeMap<String, FundLimits>>,
}

impl AppState {
    /// Create new app state from a desk and the loaded configuration.
    #[must_use]
    pub fn new(desk: Desk, config: &AppConfig) -> Self {
        Self {
            desk: Arc::new(RwLock::new(desk)),
            auth: Arc::new(AuthRegistry::new(config.users.clone())),
            funds: Arc::new(config.funds.clone()),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `CREDITO_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("CREDITO_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (CREDITO_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in CREDITO_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No CREDITO_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Session Authentication - resolves the bearer token
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/login", post(handlers::login_handler))
        .route("/logout", post(handlers::logout_handler))
        .route("/kpis", get(handlers::kpis_handler))
        .route(
            "/companies",
            get(handlers::list_companies_handler).post(handlers::register_company_handler),
        )
        .route(
            "/companies/{name}",
            get(handlers::get_company_handler)
                .put(handlers::update_company_handler)
                .delete(handlers::delete_company_handler),
        )
        .route(
            "/companies/{name}/pendencias",
            get(handlers::list_pendencias_handler).put(handlers::update_pendencias_handler),
        )
        .route(
            "/companies/{name}/transitions",
            post(handlers::move_stage_handler),
        )
        .route(
            "/companies/{name}/progress",
            get(handlers::progress_handler),
        )
        .route("/enquadramento", post(handlers::enquadramento_handler))
        .route("/pdd", post(handlers::pdd_handler));

    // Apply session authentication middleware (innermost - runs last on request)
    router = router.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        auth::session_auth_middleware,
    ));

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, desk: Desk, config: &AppConfig) -> Result<(), CreditoError> {
    if config.users.is_empty() {
        tracing::warn!(
            "No [[users]] configured - the API will refuse every login. \
             Add credentials to the config file to open sessions."
        );
    }

    let state = AppState::new(desk, config);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CreditoError::IoError(format!("Bind failed: {e}")))?;

    tracing::info!("Credito HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| CreditoError::IoError(format!("Server error: {e}")))
}
