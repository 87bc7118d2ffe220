use super::conflict::{CoiDeclaration, DeclarationId};
use super::consensus::OverrideEntry;
use super::domain::{EvaluationAssignment, EvaluatorScorecard, ScorecardKey};
use crate::workflows::tender::domain::{ApprovalRecord, ContractRecord, Tender, TenderId};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage boundary for tender records and the downstream approval/contract
/// signals this system reads but never writes. Implementations are passed in
/// explicitly; nothing here reads ambient global state.
pub trait TenderRepository: Send + Sync {
    fn insert(&self, tender: Tender) -> Result<Tender, RepositoryError>;
    fn update(&self, tender: Tender) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TenderId) -> Result<Option<Tender>, RepositoryError>;
    fn all(&self) -> Result<Vec<Tender>, RepositoryError>;
    fn approval_for(&self, tender: &TenderId) -> Result<Option<ApprovalRecord>, RepositoryError>;
    fn contract_for(&self, tender: &TenderId) -> Result<Option<ContractRecord>, RepositoryError>;
}

/// Storage boundary for assignments, scorecards, declarations, and the
/// override audit log. Scorecard writes are last-write-wins upserts; the
/// override log is append-only.
pub trait EvaluationRepository: Send + Sync {
    fn insert_assignment(
        &self,
        assignment: EvaluationAssignment,
    ) -> Result<EvaluationAssignment, RepositoryError>;
    fn assignment_for(
        &self,
        tender: &TenderId,
    ) -> Result<Option<EvaluationAssignment>, RepositoryError>;

    fn upsert_scorecard(&self, scorecard: EvaluatorScorecard) -> Result<(), RepositoryError>;
    fn scorecard(&self, key: &ScorecardKey) -> Result<Option<EvaluatorScorecard>, RepositoryError>;
    fn scorecards_for(&self, tender: &TenderId)
        -> Result<Vec<EvaluatorScorecard>, RepositoryError>;

    fn insert_declaration(
        &self,
        declaration: CoiDeclaration,
    ) -> Result<CoiDeclaration, RepositoryError>;
    fn update_declaration(&self, declaration: CoiDeclaration) -> Result<(), RepositoryError>;
    fn declaration(&self, id: &DeclarationId) -> Result<Option<CoiDeclaration>, RepositoryError>;
    fn declarations_for(&self, tender: &TenderId) -> Result<Vec<CoiDeclaration>, RepositoryError>;

    fn append_override(
        &self,
        tender: &TenderId,
        entry: OverrideEntry,
    ) -> Result<(), RepositoryError>;
    fn overrides_for(&self, tender: &TenderId) -> Result<Vec<OverrideEntry>, RepositoryError>;
}
