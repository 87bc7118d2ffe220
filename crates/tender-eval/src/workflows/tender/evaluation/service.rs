use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config::EvaluationSettings;
use super::conflict::{
    CoiDeclaration, ConflictDetail, ConflictError, DeclarationId, ExclusionSet, ReviewDecision,
};
use super::consensus::{ConsensusAggregator, ConsensusResult, OverrideEntry};
use super::domain::{
    AssignmentError, AssignmentId, BidderId, EvaluationAssignment, EvaluationPeriod, EvaluatorId,
    EvaluatorScorecard, EvaluatorSeat, ScorecardKey, ScorecardStatus, ScorecardView,
    ScoreSubmission,
};
use super::repository::{EvaluationRepository, RepositoryError, TenderRepository};
use super::session::{EvaluationSession, ScorecardError};
use crate::workflows::tender::domain::{Tender, TenderId, TenderStatusView};
use crate::workflows::tender::status::{resolve, StatusResolution};
use crate::workflows::tender::template::{CriterionId, EvaluationTemplate, TemplateError};

/// Error raised by the evaluation service facade.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Scorecard(#[from] ScorecardError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("evaluator {0} is not on the assignment roster")]
    UnknownEvaluator(EvaluatorId),
    #[error("evaluator {0} holds no scorecards on this assignment")]
    NonScoringEvaluator(EvaluatorId),
    #[error("bidder {0} is not part of the assignment")]
    UnknownBidder(BidderId),
    #[error("operation restricted to the committee chairman")]
    ChairmanOnly,
    #[error("chairman override applies to submitted scorecards, found {}", status.label())]
    OverrideUnavailable { status: ScorecardStatus },
}

/// Assignment intake payload from the committee-assignment collaborator.
/// Template weights arrive raw and are normalized on acceptance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewAssignment {
    pub tender_id: TenderId,
    pub template: EvaluationTemplate,
    pub roster: Vec<EvaluatorSeat>,
    pub bidders: Vec<BidderId>,
    pub period: EvaluationPeriod,
}

/// COI declaration payload exchanged with the ethics-review collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewDeclaration {
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    pub has_conflict: bool,
    #[serde(default)]
    pub details: Vec<ConflictDetail>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverrideRequest {
    pub tender_id: TenderId,
    /// Who is performing the override; must hold the chairman seat.
    pub actor: EvaluatorId,
    pub evaluator_id: EvaluatorId,
    pub bidder_id: BidderId,
    pub criterion_id: CriterionId,
    pub new_score: f64,
    pub reason: String,
}

/// Outcome of one reconciliation sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResyncReport {
    pub examined: usize,
    pub updated: usize,
    pub failed: usize,
}

static ASSIGNMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DECLARATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assignment_id() -> AssignmentId {
    let id = ASSIGNMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssignmentId(format!("asg-{id:06}"))
}

fn next_declaration_id() -> DeclarationId {
    let id = DECLARATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DeclarationId(format!("coi-{id:06}"))
}

/// Service composing the scoring sessions, conflict gate, consensus
/// aggregation, and status resolution over explicit repositories.
pub struct TenderEvaluationService<T, E> {
    tenders: Arc<T>,
    evaluations: Arc<E>,
    settings: EvaluationSettings,
}

impl<T, E> TenderEvaluationService<T, E>
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    pub fn new(tenders: Arc<T>, evaluations: Arc<E>, settings: EvaluationSettings) -> Self {
        Self {
            tenders,
            evaluations,
            settings,
        }
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Accept a tender record from the authoring collaborator.
    pub fn register_tender(&self, tender: Tender) -> Result<Tender, ServiceError> {
        Ok(self.tenders.insert(tender)?)
    }

    pub fn tender(&self, id: &TenderId) -> Result<Tender, ServiceError> {
        Ok(self.tenders.fetch(id)?.ok_or(RepositoryError::NotFound)?)
    }

    /// Validate and persist a committee assignment, materializing one Draft
    /// scorecard per scoring seat per bidder.
    pub fn create_assignment(
        &self,
        request: NewAssignment,
    ) -> Result<EvaluationAssignment, ServiceError> {
        let mut tender = self
            .tenders
            .fetch(&request.tender_id)?
            .ok_or(RepositoryError::NotFound)?;

        let mut template = request.template;
        template.normalize(&self.settings.score_targets())?;

        let assignment = EvaluationAssignment::new(
            next_assignment_id(),
            request.tender_id,
            template,
            request.roster,
            request.bidders,
            request.period,
        )?;
        let assignment = self.evaluations.insert_assignment(assignment)?;

        for seat in assignment.scoring_seats() {
            for bidder in &assignment.bidders {
                let session = EvaluationSession::create(
                    &assignment.template,
                    assignment.tender_id.clone(),
                    seat.evaluator_id.clone(),
                    bidder.clone(),
                );
                self.evaluations
                    .upsert_scorecard(session.into_scorecard())?;
            }
        }

        tender.assignment_id = Some(assignment.id.clone());
        self.tenders.update(tender)?;

        info!(
            tender = %assignment.tender_id,
            assignment = %assignment.id,
            evaluators = assignment.roster.len(),
            bidders = assignment.bidders.len(),
            "evaluation assignment created"
        );

        Ok(assignment)
    }

    pub fn assignment(&self, tender: &TenderId) -> Result<EvaluationAssignment, ServiceError> {
        Ok(self
            .evaluations
            .assignment_for(tender)?
            .ok_or(RepositoryError::NotFound)?)
    }

    /// Persist in-progress scores without completeness checks. Range and
    /// lock rules still apply; the whole batch lands or none of it does.
    pub fn save_draft(&self, submission: ScoreSubmission) -> Result<ScorecardView, ServiceError> {
        let (assignment, scorecard) = self.writable_scorecard(&submission)?;
        let mut session = EvaluationSession::resume(&assignment.template, scorecard);
        for entry in &submission.scores {
            session.set_score(&entry.criterion_id, entry.score, entry.comment.clone())?;
        }

        let scorecard = session.into_scorecard();
        let view = scorecard.status_view();
        self.evaluations.upsert_scorecard(scorecard)?;
        Ok(view)
    }

    /// Accept a full score submission atomically: every entry validates and
    /// every criterion is scored, or the stored scorecard stays untouched.
    pub fn submit_scores(
        &self,
        submission: ScoreSubmission,
        now: DateTime<Utc>,
    ) -> Result<ScorecardView, ServiceError> {
        let (assignment, scorecard) = self.writable_scorecard(&submission)?;
        let mut session = EvaluationSession::resume(&assignment.template, scorecard);
        for entry in &submission.scores {
            session.set_score(&entry.criterion_id, entry.score, entry.comment.clone())?;
        }
        session.submit(now)?;

        let scorecard = session.into_scorecard();
        let view = scorecard.status_view();
        self.evaluations.upsert_scorecard(scorecard)?;

        info!(
            tender = %view.tender_id,
            evaluator = %view.evaluator_id,
            bidder = %view.bidder_id,
            total = view.total_score,
            "scorecard submitted"
        );

        Ok(view)
    }

    fn writable_scorecard(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<(EvaluationAssignment, EvaluatorScorecard), ServiceError> {
        let assignment = self.assignment(&submission.tender_id)?;

        let seat = assignment
            .seat(&submission.evaluator_id)
            .ok_or_else(|| ServiceError::UnknownEvaluator(submission.evaluator_id.clone()))?;
        if !seat.role.is_scoring() {
            return Err(ServiceError::NonScoringEvaluator(
                submission.evaluator_id.clone(),
            ));
        }
        if !assignment.bidders.contains(&submission.bidder_id) {
            return Err(ServiceError::UnknownBidder(submission.bidder_id.clone()));
        }

        let key = ScorecardKey {
            tender_id: submission.tender_id.clone(),
            evaluator_id: submission.evaluator_id.clone(),
            bidder_id: submission.bidder_id.clone(),
        };
        let scorecard = self
            .evaluations
            .scorecard(&key)?
            .ok_or(RepositoryError::NotFound)?;

        Ok((assignment, scorecard))
    }

    /// File a conflict-of-interest declaration for review.
    pub fn declare_conflict(
        &self,
        request: NewDeclaration,
        now: DateTime<Utc>,
    ) -> Result<CoiDeclaration, ServiceError> {
        let assignment = self.assignment(&request.tender_id)?;
        if assignment.seat(&request.evaluator_id).is_none() {
            return Err(ServiceError::UnknownEvaluator(request.evaluator_id));
        }
        for detail in &request.details {
            if !assignment.bidders.contains(&detail.bidder_id) {
                return Err(ServiceError::UnknownBidder(detail.bidder_id.clone()));
            }
        }

        let declaration = CoiDeclaration::declare(
            next_declaration_id(),
            request.tender_id,
            request.evaluator_id,
            request.has_conflict,
            request.details,
            now,
        );
        Ok(self.evaluations.insert_declaration(declaration)?)
    }

    /// Apply the ethics reviewer's decision to a pending declaration.
    pub fn review_conflict(
        &self,
        declaration_id: &DeclarationId,
        decision: ReviewDecision,
        reviewer: String,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CoiDeclaration, ServiceError> {
        let mut declaration = self
            .evaluations
            .declaration(declaration_id)?
            .ok_or(RepositoryError::NotFound)?;
        declaration.review(decision, reviewer, comment, now)?;
        self.evaluations.update_declaration(declaration.clone())?;
        Ok(declaration)
    }

    /// Recompute the consensus view from the current scorecards and
    /// exclusions. Pure read; callers may invoke it at any time.
    pub fn consensus(&self, tender_id: &TenderId) -> Result<ConsensusResult, ServiceError> {
        let assignment = self.assignment(tender_id)?;
        let scorecards = self.evaluations.scorecards_for(tender_id)?;
        let declarations = self.evaluations.declarations_for(tender_id)?;
        let exclusions = ExclusionSet::from_declarations(&declarations);
        let overrides = self.evaluations.overrides_for(tender_id)?;

        let aggregator = ConsensusAggregator::new(&assignment, &scorecards, &exclusions);
        Ok(aggregator.result(overrides))
    }

    /// Rewrite one submitted score under the chairman's authority, leaving
    /// exactly one audit record behind.
    pub fn chairman_override(
        &self,
        request: OverrideRequest,
        now: DateTime<Utc>,
    ) -> Result<ScorecardView, ServiceError> {
        let assignment = self.assignment(&request.tender_id)?;
        self.require_chairman(&assignment, &request.actor)?;

        let criterion = assignment
            .template
            .criterion(&request.criterion_id)
            .ok_or_else(|| ScorecardError::UnknownCriterion(request.criterion_id.clone()))?;
        if !(0.0..=f64::from(criterion.max_score)).contains(&request.new_score) {
            return Err(ScorecardError::OutOfRange {
                criterion: request.criterion_id.clone(),
                score: request.new_score,
                max: criterion.max_score,
            }
            .into());
        }

        let key = ScorecardKey {
            tender_id: request.tender_id.clone(),
            evaluator_id: request.evaluator_id.clone(),
            bidder_id: request.bidder_id.clone(),
        };
        let mut scorecard = self
            .evaluations
            .scorecard(&key)?
            .ok_or(RepositoryError::NotFound)?;
        if scorecard.status != ScorecardStatus::Submitted {
            return Err(ServiceError::OverrideUnavailable {
                status: scorecard.status,
            });
        }

        let entry = scorecard
            .scores
            .get_mut(&request.criterion_id)
            .ok_or_else(|| ScorecardError::UnknownCriterion(request.criterion_id.clone()))?;
        let old_score = entry.score;
        entry.score = request.new_score;
        entry.touched = true;
        scorecard.total_score = scorecard.sum_scores();

        let view = scorecard.status_view();
        self.evaluations.upsert_scorecard(scorecard)?;
        self.evaluations.append_override(
            &request.tender_id,
            OverrideEntry {
                criterion_id: request.criterion_id,
                evaluator_id: request.evaluator_id,
                bidder_id: request.bidder_id,
                old_score,
                new_score: request.new_score,
                reason: request.reason,
                timestamp: now,
            },
        )?;

        Ok(view)
    }

    /// Lock the assignment: every submitted scorecard becomes Approved.
    pub fn approve_all(
        &self,
        tender_id: &TenderId,
        actor: &EvaluatorId,
    ) -> Result<usize, ServiceError> {
        let assignment = self.assignment(tender_id)?;
        self.require_chairman(&assignment, actor)?;

        let mut approved = 0;
        for mut scorecard in self.evaluations.scorecards_for(tender_id)? {
            if scorecard.status == ScorecardStatus::Submitted {
                scorecard.status = ScorecardStatus::Approved;
                self.evaluations.upsert_scorecard(scorecard)?;
                approved += 1;
            }
        }

        Ok(approved)
    }

    fn require_chairman(
        &self,
        assignment: &EvaluationAssignment,
        actor: &EvaluatorId,
    ) -> Result<(), ServiceError> {
        if &assignment.chairman().evaluator_id != actor {
            return Err(ServiceError::ChairmanOnly);
        }
        Ok(())
    }

    /// Re-derive one tender's status from source records and persist the
    /// outcome when it moved.
    pub fn resolve_status(
        &self,
        tender_id: &TenderId,
        now: DateTime<Utc>,
    ) -> Result<TenderStatusView, ServiceError> {
        let tender = self
            .tenders
            .fetch(tender_id)?
            .ok_or(RepositoryError::NotFound)?;
        let (tender, _) = self.reconcile(tender, now)?;
        Ok(tender.status_view())
    }

    fn reconcile(
        &self,
        mut tender: Tender,
        now: DateTime<Utc>,
    ) -> Result<(Tender, bool), ServiceError> {
        let approval = self.tenders.approval_for(&tender.id)?;
        let contract = self.tenders.contract_for(&tender.id)?;
        let evaluation_complete = self.evaluation_complete(&tender.id)?;

        let resolution: StatusResolution = resolve(
            &tender,
            approval.as_ref(),
            contract.as_ref(),
            evaluation_complete,
            now,
            &self.settings.status_rules(),
        );

        if !resolution.changes(&tender) {
            return Ok((tender, false));
        }

        tender.status = resolution.status;
        tender.stage = resolution.stage;
        tender.approval_id = approval.map(|record| record.id);
        tender.contract_id = contract.map(|record| record.id);
        tender.status_updated_at = Some(resolution.resolved_at);
        self.tenders.update(tender.clone())?;

        Ok((tender, true))
    }

    fn evaluation_complete(&self, tender_id: &TenderId) -> Result<bool, ServiceError> {
        let Some(assignment) = self.evaluations.assignment_for(tender_id)? else {
            return Ok(false);
        };
        let scorecards = self.evaluations.scorecards_for(tender_id)?;
        let declarations = self.evaluations.declarations_for(tender_id)?;
        let exclusions = ExclusionSet::from_declarations(&declarations);

        Ok(ConsensusAggregator::new(&assignment, &scorecards, &exclusions).is_complete())
    }

    /// Periodic poll-and-reconcile sweep. Each tender is re-derived from
    /// source records in full; a failing tender is logged and retried on the
    /// next cycle without blocking the rest of the sweep.
    pub fn resync(&self, now: DateTime<Utc>) -> ResyncReport {
        let mut report = ResyncReport::default();

        let tenders = match self.tenders.all() {
            Ok(tenders) => tenders,
            Err(error) => {
                warn!(%error, "status resync could not list tenders");
                report.failed = 1;
                return report;
            }
        };

        for tender in tenders {
            report.examined += 1;
            let id = tender.id.clone();
            match self.reconcile(tender, now) {
                Ok((_, true)) => report.updated += 1,
                Ok((_, false)) => {}
                Err(error) => {
                    warn!(tender = %id, %error, "status resync skipped tender");
                    report.failed += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            updated = report.updated,
            failed = report.failed,
            "status resync cycle finished"
        );

        report
    }
}
