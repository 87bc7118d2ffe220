use serde::{Deserialize, Serialize};

use crate::workflows::tender::status::StatusRules;
use crate::workflows::tender::template::ScoreTargets;

/// Evaluation policy dials: the QCBS point split and the closing-soon
/// lookahead window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSettings {
    pub technical_target: u16,
    pub financial_target: u16,
    pub closing_soon_window_days: u32,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            technical_target: 70,
            financial_target: 30,
            closing_soon_window_days: 7,
        }
    }
}

impl EvaluationSettings {
    pub fn score_targets(&self) -> ScoreTargets {
        ScoreTargets {
            technical: self.technical_target,
            financial: self.financial_target,
        }
    }

    pub fn status_rules(&self) -> StatusRules {
        StatusRules {
            closing_soon_window_days: self.closing_soon_window_days,
        }
    }
}
