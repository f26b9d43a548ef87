//! Data models for hjury-ai (AI Jury microservice)

pub mod candidate;
pub mod criteria;
pub mod evaluation_session;
pub mod final_results;
pub mod layer_result;

pub use candidate::{
    AnalysisReport, Candidate, CandidateReports, QualityReport, ReportStatus, ScoreReport,
    TechnologyCategory, TechnologyReport,
};
pub use criteria::EligibilityCriteria;
pub use evaluation_session::{EvaluationSession, JuryLayer, SessionStatus, TOTAL_LAYERS};
pub use final_results::{CategoryWinners, FinalResults, Winner};
pub use layer_result::{clamp_score, LayerOutcome, LayerResult};
