//! hjury-ai library interface
//!
//! Exposes the jury services and the HTTP router for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hjury_common::config::JuryTuning;
use hjury_common::events::EventBus;

use crate::services::{JuryOrchestrator, ProgressTracker, RepositoryInspector, SessionManager};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    pub tracker: ProgressTracker,
    pub sessions: SessionManager,
    pub orchestrator: JuryOrchestrator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last failed layer run, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        inspector: Arc<dyn RepositoryInspector>,
        tuning: JuryTuning,
    ) -> Self {
        let tracker = ProgressTracker::new(
            tuning.progress_max_sessions,
            Duration::from_secs(tuning.progress_idle_secs),
        );
        let sessions = SessionManager::new(db.clone(), tracker.clone(), event_bus.clone());
        let orchestrator = JuryOrchestrator::new(
            db.clone(),
            tracker.clone(),
            event_bus.clone(),
            inspector,
            tuning,
        );

        Self {
            db,
            event_bus,
            tracker,
            sessions,
            orchestrator,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/jury/events", get(api::jury_event_stream))
        .merge(api::jury_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
