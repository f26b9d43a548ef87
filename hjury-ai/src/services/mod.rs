//! Jury services
//!
//! Layer strategies, the orchestrator that runs them, live progress
//! tracking, final ranking and session lifecycle.

pub mod github_client;
pub mod jury_orchestrator;
pub mod layers;
pub mod progress_tracker;
pub mod results_aggregator;
pub mod session_manager;

pub use github_client::{
    parse_github_url, GithubClient, GithubRepo, RepositoryAccess, RepositoryError,
    RepositoryInspector,
};
pub use jury_orchestrator::{JuryOrchestrator, LayerExecutionSummary};
pub use progress_tracker::{LayerProgress, ProgressStatus, ProgressTracker, SessionProgress};
pub use results_aggregator::{aggregate, RankingEntry};
pub use session_manager::{
    LayerProgressSummary, SessionManager, SessionProgressSummary, SessionWithResults,
};
