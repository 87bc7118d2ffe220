use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflict::ExclusionSet;
use super::domain::{BidderId, EvaluationAssignment, EvaluatorId, EvaluatorScorecard};
use crate::workflows::tender::domain::TenderId;
use crate::workflows::tender::template::CriterionId;

/// Audit record for one chairman override. The log is append-only; entries
/// are never rewritten once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub criterion_id: CriterionId,
    pub evaluator_id: EvaluatorId,
    pub bidder_id: BidderId,
    pub old_score: f64,
    pub new_score: f64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionAverage {
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub max_score: u16,
    pub average: f64,
}

/// One bidder's aggregated result within the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidderStanding {
    pub bidder_id: BidderId,
    pub rank: u32,
    pub total_score: f64,
    pub criterion_averages: Vec<CriterionAverage>,
    /// When the bidder's last eligible scorecard arrived; drives tie-breaks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Aggregated, auditable outcome of a tender evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub tender_id: TenderId,
    pub complete: bool,
    pub standings: Vec<BidderStanding>,
    pub overrides: Vec<OverrideEntry>,
}

/// Pure read over the persisted scorecards and exclusions: safe to recompute
/// at any time, by any caller, without side effects.
pub struct ConsensusAggregator<'a> {
    assignment: &'a EvaluationAssignment,
    scorecards: &'a [EvaluatorScorecard],
    exclusions: &'a ExclusionSet,
}

impl<'a> ConsensusAggregator<'a> {
    pub fn new(
        assignment: &'a EvaluationAssignment,
        scorecards: &'a [EvaluatorScorecard],
        exclusions: &'a ExclusionSet,
    ) -> Self {
        Self {
            assignment,
            scorecards,
            exclusions,
        }
    }

    fn eligible_for<'b>(
        &'b self,
        bidder: &'b BidderId,
    ) -> impl Iterator<Item = &'b EvaluatorScorecard> + 'b {
        let exclusions = self.exclusions;
        self.scorecards
            .iter()
            .filter(move |card| &card.bidder_id == bidder)
            .filter(|card| card.status.counts_for_consensus())
            .filter(move |card| exclusions.is_eligible(&card.evaluator_id, &card.bidder_id))
    }

    /// Mean score across eligible scorecards. Returns 0.0 when no eligible
    /// scorecard exists: "no data" and "scored zero" are deliberately not
    /// distinguished here, matching the established reporting behavior.
    pub fn average_score(&self, criterion: &CriterionId, bidder: &BidderId) -> f64 {
        let scores: Vec<f64> = self
            .eligible_for(bidder)
            .filter_map(|card| card.scores.get(criterion))
            .map(|entry| entry.score)
            .collect();

        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// Sum of per-criterion averages; normalized max scores already encode
    /// each criterion's weight.
    pub fn total_score(&self, bidder: &BidderId) -> f64 {
        self.assignment
            .template
            .criteria
            .iter()
            .map(|criterion| self.average_score(&criterion.id, bidder))
            .sum()
    }

    /// Evaluation is complete once every non-excluded scoring seat has a
    /// submitted (or approved) scorecard for every bidder.
    pub fn is_complete(&self) -> bool {
        self.assignment.scoring_seats().all(|seat| {
            self.assignment.bidders.iter().all(|bidder| {
                if !self.exclusions.is_eligible(&seat.evaluator_id, bidder) {
                    return true;
                }
                self.scorecards.iter().any(|card| {
                    card.evaluator_id == seat.evaluator_id
                        && &card.bidder_id == bidder
                        && card.status.counts_for_consensus()
                })
            })
        })
    }

    /// Bidders ranked by total score, highest first. Ties break on the
    /// earlier completed evaluation (latest eligible submission timestamp),
    /// then on bidder id, so the ranking is total.
    pub fn final_ranking(&self) -> Vec<BidderStanding> {
        let mut standings: Vec<BidderStanding> = self
            .assignment
            .bidders
            .iter()
            .map(|bidder| {
                let criterion_averages = self
                    .assignment
                    .template
                    .criteria
                    .iter()
                    .map(|criterion| CriterionAverage {
                        criterion_id: criterion.id.clone(),
                        criterion_name: criterion.name.clone(),
                        max_score: criterion.max_score,
                        average: self.average_score(&criterion.id, bidder),
                    })
                    .collect::<Vec<_>>();
                let total_score = criterion_averages
                    .iter()
                    .map(|entry| entry.average)
                    .sum();
                let evaluated_at = self
                    .eligible_for(bidder)
                    .filter_map(|card| card.submitted_at)
                    .max();

                BidderStanding {
                    bidder_id: bidder.clone(),
                    rank: 0,
                    total_score,
                    criterion_averages,
                    evaluated_at,
                }
            })
            .collect();

        standings.sort_by(|a, b| {
            b.total_score
                .total_cmp(&a.total_score)
                .then_with(|| match (a.evaluated_at, b.evaluated_at) {
                    (Some(left), Some(right)) => left.cmp(&right),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.bidder_id.cmp(&b.bidder_id))
        });

        for (index, standing) in standings.iter_mut().enumerate() {
            standing.rank = index as u32 + 1;
        }

        standings
    }

    pub fn result(&self, overrides: Vec<OverrideEntry>) -> ConsensusResult {
        ConsensusResult {
            tender_id: self.assignment.tender_id.clone(),
            complete: self.is_complete(),
            standings: self.final_ranking(),
            overrides,
        }
    }
}
