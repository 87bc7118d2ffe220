use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{BidderId, EvaluatorId};
use crate::workflows::tender::domain::TenderId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclarationId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Financial,
    Familial,
    Professional,
    Other,
}

impl ConflictKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Financial => "Financial",
            Self::Familial => "Familial",
            Self::Professional => "Professional",
            Self::Other => "Other",
        }
    }
}

/// One declared relationship between an evaluator and a bidder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDetail {
    pub kind: ConflictKind,
    pub bidder_id: BidderId,
    pub relationship: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    NeedsClarification,
}

impl ReviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::NeedsClarification => "Needs Clarification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Disqualifying,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Disqualifying => "Disqualifying",
        }
    }

    pub const fn is_disqualifying(self) -> bool {
        matches!(self, Self::Disqualifying)
    }
}

/// Ethics reviewer's verdict on a pending declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum ReviewDecision {
    Approve {
        risk: RiskLevel,
        #[serde(default)]
        mitigation: Vec<String>,
    },
    Reject,
    NeedsClarification,
}

#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error("declaration is already {}, review it again only after resubmission", status.label())]
    AlreadyReviewed { status: ReviewStatus },
    #[error("only declarations sent back for clarification can be resubmitted, found {}", status.label())]
    NotResubmittable { status: ReviewStatus },
}

/// Conflict-of-interest declaration collected at assignment time and
/// adjudicated once by the ethics-review collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoiDeclaration {
    pub id: DeclarationId,
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    pub has_conflict: bool,
    pub details: Vec<ConflictDetail>,
    pub review: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
    pub mitigation: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
    pub declared_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl CoiDeclaration {
    pub fn declare(
        id: DeclarationId,
        tender_id: TenderId,
        evaluator_id: EvaluatorId,
        has_conflict: bool,
        details: Vec<ConflictDetail>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tender_id,
            evaluator_id,
            has_conflict,
            details,
            review: ReviewStatus::Pending,
            risk: None,
            mitigation: Vec::new(),
            reviewer: None,
            review_comment: None,
            declared_at: now,
            reviewed_at: None,
        }
    }

    /// Apply the reviewer's decision. A declaration is reviewed once;
    /// anything past Pending is terminal until explicitly resubmitted.
    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: String,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ConflictError> {
        if self.review != ReviewStatus::Pending {
            return Err(ConflictError::AlreadyReviewed {
                status: self.review,
            });
        }

        match decision {
            ReviewDecision::Approve { risk, mitigation } => {
                self.review = ReviewStatus::Approved;
                self.risk = Some(risk);
                self.mitigation = mitigation;
            }
            ReviewDecision::Reject => {
                self.review = ReviewStatus::Rejected;
                self.risk = None;
            }
            ReviewDecision::NeedsClarification => {
                self.review = ReviewStatus::NeedsClarification;
                self.risk = None;
            }
        }
        self.reviewer = Some(reviewer);
        self.review_comment = comment;
        self.reviewed_at = Some(now);

        Ok(())
    }

    /// Reopen a declaration the reviewer sent back for clarification.
    pub fn resubmit(
        &mut self,
        details: Vec<ConflictDetail>,
        now: DateTime<Utc>,
    ) -> Result<(), ConflictError> {
        if self.review != ReviewStatus::NeedsClarification {
            return Err(ConflictError::NotResubmittable {
                status: self.review,
            });
        }

        self.details = details;
        self.review = ReviewStatus::Pending;
        self.risk = None;
        self.mitigation = Vec::new();
        self.reviewer = None;
        self.review_comment = None;
        self.declared_at = now;
        self.reviewed_at = None;

        Ok(())
    }
}

/// Scorecard eligibility derived from approved declarations.
///
/// An approved conflict below Disqualifying recuses the evaluator from the
/// named bidders only; Disqualifying risk removes the evaluator from the
/// whole assignment. Pending, Rejected, and NeedsClarification declarations
/// exclude nothing: the review outcome is the sole authority.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    disqualified: BTreeSet<EvaluatorId>,
    recusals: BTreeSet<(EvaluatorId, BidderId)>,
}

impl ExclusionSet {
    pub fn from_declarations<'a>(
        declarations: impl IntoIterator<Item = &'a CoiDeclaration>,
    ) -> Self {
        let mut exclusions = Self::default();

        for declaration in declarations {
            if declaration.review != ReviewStatus::Approved || !declaration.has_conflict {
                continue;
            }
            match declaration.risk {
                Some(risk) if risk.is_disqualifying() => {
                    exclusions
                        .disqualified
                        .insert(declaration.evaluator_id.clone());
                }
                Some(_) => {
                    for detail in &declaration.details {
                        exclusions.recusals.insert((
                            declaration.evaluator_id.clone(),
                            detail.bidder_id.clone(),
                        ));
                    }
                }
                None => {}
            }
        }

        exclusions
    }

    pub fn is_disqualified(&self, evaluator: &EvaluatorId) -> bool {
        self.disqualified.contains(evaluator)
    }

    pub fn is_eligible(&self, evaluator: &EvaluatorId, bidder: &BidderId) -> bool {
        if self.disqualified.contains(evaluator) {
            return false;
        }
        !self
            .recusals
            .iter()
            .any(|(excluded, named)| excluded == evaluator && named == bidder)
    }
}
