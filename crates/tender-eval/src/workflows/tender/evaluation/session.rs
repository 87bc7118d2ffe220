use chrono::{DateTime, Utc};

use super::domain::{
    BidderId, CriterionScore, EvaluatorId, EvaluatorScorecard, ScorecardStatus,
};
use crate::workflows::tender::domain::TenderId;
use crate::workflows::tender::template::{CriterionId, EvaluationTemplate};

#[derive(Debug, thiserror::Error)]
pub enum ScorecardError {
    #[error("criterion {0:?} is not part of the evaluation template")]
    UnknownCriterion(CriterionId),
    #[error("score {score} for criterion {criterion:?} is outside [0, {max}]")]
    OutOfRange {
        criterion: CriterionId,
        score: f64,
        max: u16,
    },
    #[error("scorecard is {} and no longer editable by its evaluator", status.label())]
    Locked { status: ScorecardStatus },
    #[error("cannot submit with unscored criteria: {missing:?}")]
    Unscored { missing: Vec<CriterionId> },
}

/// Working copy of one scorecard bound to its evaluation template.
///
/// The session enforces the draft/submit lifecycle; persistence is the
/// caller's concern, so a failed operation leaves the stored scorecard
/// untouched.
#[derive(Debug)]
pub struct EvaluationSession<'a> {
    template: &'a EvaluationTemplate,
    scorecard: EvaluatorScorecard,
}

impl<'a> EvaluationSession<'a> {
    /// Start a fresh Draft scorecard with every criterion at zero, unscored.
    pub fn create(
        template: &'a EvaluationTemplate,
        tender_id: TenderId,
        evaluator_id: EvaluatorId,
        bidder_id: BidderId,
    ) -> Self {
        let scores = template
            .criteria
            .iter()
            .map(|criterion| (criterion.id.clone(), CriterionScore::unscored()))
            .collect();

        Self {
            template,
            scorecard: EvaluatorScorecard {
                tender_id,
                evaluator_id,
                bidder_id,
                scores,
                status: ScorecardStatus::Draft,
                total_score: 0.0,
                submitted_at: None,
            },
        }
    }

    /// Resume a previously persisted scorecard.
    pub fn resume(template: &'a EvaluationTemplate, scorecard: EvaluatorScorecard) -> Self {
        Self {
            template,
            scorecard,
        }
    }

    pub fn scorecard(&self) -> &EvaluatorScorecard {
        &self.scorecard
    }

    pub fn into_scorecard(self) -> EvaluatorScorecard {
        self.scorecard
    }

    /// Record a score, marking the criterion as touched so an intentional
    /// zero is distinguishable from an unscored field.
    pub fn set_score(
        &mut self,
        criterion_id: &CriterionId,
        score: f64,
        comment: Option<String>,
    ) -> Result<(), ScorecardError> {
        if self.scorecard.status.is_locked() {
            return Err(ScorecardError::Locked {
                status: self.scorecard.status,
            });
        }

        let criterion = self
            .template
            .criterion(criterion_id)
            .ok_or_else(|| ScorecardError::UnknownCriterion(criterion_id.clone()))?;

        if !(0.0..=f64::from(criterion.max_score)).contains(&score) {
            return Err(ScorecardError::OutOfRange {
                criterion: criterion_id.clone(),
                score,
                max: criterion.max_score,
            });
        }

        let entry = self
            .scorecard
            .scores
            .get_mut(criterion_id)
            .ok_or_else(|| ScorecardError::UnknownCriterion(criterion_id.clone()))?;
        entry.score = score;
        entry.comment = comment;
        entry.touched = true;

        Ok(())
    }

    /// Submit the scorecard: every criterion must have been explicitly
    /// scored, totals are fixed, and the card locks against its owner.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), ScorecardError> {
        if self.scorecard.status.is_locked() {
            return Err(ScorecardError::Locked {
                status: self.scorecard.status,
            });
        }

        let missing: Vec<CriterionId> = self
            .scorecard
            .scores
            .iter()
            .filter(|(_, entry)| !entry.touched)
            .map(|(criterion, _)| criterion.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ScorecardError::Unscored { missing });
        }

        self.scorecard.total_score = self.scorecard.sum_scores();
        self.scorecard.status = ScorecardStatus::Submitted;
        self.scorecard.submitted_at = Some(now);

        Ok(())
    }
}
