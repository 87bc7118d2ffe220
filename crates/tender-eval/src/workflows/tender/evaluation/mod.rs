//! Multi-evaluator tender scoring: sessions, conflict screening, consensus
//! aggregation, and the service facade that stitches them onto repositories.

pub mod config;
pub mod conflict;
pub mod consensus;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use config::EvaluationSettings;
pub use conflict::{
    CoiDeclaration, ConflictDetail, ConflictKind, DeclarationId, ExclusionSet, ReviewDecision,
    ReviewStatus, RiskLevel,
};
pub use consensus::{
    BidderStanding, ConsensusAggregator, ConsensusResult, CriterionAverage, OverrideEntry,
};
pub use domain::{
    AssignmentError, AssignmentId, BidderId, EvaluationAssignment, EvaluationPeriod, EvaluatorId,
    EvaluatorRole, EvaluatorScorecard, EvaluatorSeat, ScorecardKey, ScorecardStatus, ScorecardView,
    ScoreEntry, ScoreSubmission,
};
pub use repository::{EvaluationRepository, RepositoryError, TenderRepository};
pub use router::evaluation_router;
pub use service::{
    NewAssignment, NewDeclaration, OverrideRequest, ResyncReport, ServiceError,
    TenderEvaluationService,
};
pub use session::{EvaluationSession, ScorecardError};
