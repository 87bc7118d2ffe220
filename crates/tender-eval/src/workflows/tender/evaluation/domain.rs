use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::tender::domain::TenderId;
use crate::workflows::tender::template::{CriterionId, EvaluationTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluatorId(pub String);

impl std::fmt::Display for EvaluatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BidderId(pub String);

impl std::fmt::Display for BidderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorRole {
    Chairman,
    Member,
    Secretary,
}

impl EvaluatorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chairman => "Chairman",
            Self::Member => "Member",
            Self::Secretary => "Secretary",
        }
    }

    /// Secretaries keep minutes; only chairmen and members hold scorecards.
    pub const fn is_scoring(self) -> bool {
        matches!(self, Self::Chairman | Self::Member)
    }
}

/// One seat on the evaluation committee roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorSeat {
    pub evaluator_id: EvaluatorId,
    pub name: String,
    pub role: EvaluatorRole,
}

/// Evaluation window supplied by the committee-assignment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("evaluation period must end after it starts ({start} >= {end})")]
    DateLogic { start: NaiveDate, end: NaiveDate },
    #[error("assignment roster is empty")]
    EmptyRoster,
    #[error("assignment roster must include exactly one chairman, found {0}")]
    ChairmanCount(usize),
    #[error("assignment has no bidders to evaluate")]
    NoBidders,
    #[error("assignment template has no criteria")]
    EmptyTemplate,
}

/// Committee assignment binding a tender to a template, a roster, and the
/// bidders under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAssignment {
    pub id: AssignmentId,
    pub tender_id: TenderId,
    pub template: EvaluationTemplate,
    pub roster: Vec<EvaluatorSeat>,
    pub bidders: Vec<BidderId>,
    pub period: EvaluationPeriod,
}

impl EvaluationAssignment {
    pub fn new(
        id: AssignmentId,
        tender_id: TenderId,
        template: EvaluationTemplate,
        roster: Vec<EvaluatorSeat>,
        bidders: Vec<BidderId>,
        period: EvaluationPeriod,
    ) -> Result<Self, AssignmentError> {
        if period.end <= period.start {
            return Err(AssignmentError::DateLogic {
                start: period.start,
                end: period.end,
            });
        }
        if roster.is_empty() {
            return Err(AssignmentError::EmptyRoster);
        }
        let chairmen = roster
            .iter()
            .filter(|seat| seat.role == EvaluatorRole::Chairman)
            .count();
        if chairmen != 1 {
            return Err(AssignmentError::ChairmanCount(chairmen));
        }
        if bidders.is_empty() {
            return Err(AssignmentError::NoBidders);
        }
        if template.criteria.is_empty() {
            return Err(AssignmentError::EmptyTemplate);
        }

        Ok(Self {
            id,
            tender_id,
            template,
            roster,
            bidders,
            period,
        })
    }

    pub fn seat(&self, evaluator: &EvaluatorId) -> Option<&EvaluatorSeat> {
        self.roster
            .iter()
            .find(|seat| &seat.evaluator_id == evaluator)
    }

    pub fn chairman(&self) -> &EvaluatorSeat {
        self.roster
            .iter()
            .find(|seat| seat.role == EvaluatorRole::Chairman)
            .expect("constructor guarantees exactly one chairman")
    }

    pub fn scoring_seats(&self) -> impl Iterator<Item = &EvaluatorSeat> {
        self.roster.iter().filter(|seat| seat.role.is_scoring())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorecardStatus {
    Draft,
    Submitted,
    Approved,
}

impl ScorecardStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
        }
    }

    pub const fn is_locked(self) -> bool {
        !matches!(self, Self::Draft)
    }

    pub const fn counts_for_consensus(self) -> bool {
        matches!(self, Self::Submitted | Self::Approved)
    }
}

/// Score entry for a single criterion. `touched` distinguishes an awarded
/// zero from a field the evaluator never reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub touched: bool,
}

impl CriterionScore {
    pub const fn unscored() -> Self {
        Self {
            score: 0.0,
            comment: None,
            touched: false,
        }
    }
}

/// Lookup key for one evaluator's scorecard on one bidder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScorecardKey {
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    pub bidder_id: BidderId,
}

/// One evaluator's complete set of per-criterion scores for one bidder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorScorecard {
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    pub bidder_id: BidderId,
    pub scores: BTreeMap<CriterionId, CriterionScore>,
    pub status: ScorecardStatus,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl EvaluatorScorecard {
    pub fn key(&self) -> ScorecardKey {
        ScorecardKey {
            tender_id: self.tender_id.clone(),
            evaluator_id: self.evaluator_id.clone(),
            bidder_id: self.bidder_id.clone(),
        }
    }

    pub fn sum_scores(&self) -> f64 {
        self.scores.values().map(|entry| entry.score).sum()
    }

    pub fn status_view(&self) -> ScorecardView {
        ScorecardView {
            tender_id: self.tender_id.clone(),
            evaluator_id: self.evaluator_id.clone(),
            bidder_id: self.bidder_id.clone(),
            status: self.status,
            status_label: self.status.label(),
            total_score: self.total_score,
            submitted_at: self.submitted_at,
        }
    }
}

/// Sanitized scorecard representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ScorecardView {
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    pub bidder_id: BidderId,
    pub status: ScorecardStatus,
    pub status_label: &'static str,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Inbound score submission: accepted atomically or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    pub bidder_id: BidderId,
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub criterion_id: CriterionId,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
