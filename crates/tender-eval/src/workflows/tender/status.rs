use chrono::{DateTime, Duration, Utc};

use super::domain::{
    ApprovalRecord, ApprovalStatus, ContractRecord, ContractStatus, Tender, TenderStatus,
    WorkflowStage,
};

/// Date-driven dials for the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRules {
    /// How many days before the closing date a tender reads "Closing Soon".
    pub closing_soon_window_days: u32,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            closing_soon_window_days: 7,
        }
    }
}

/// Outcome of one resolver pass. `status` and `stage` are a pure function of
/// the inputs; `resolved_at` is the stamp recorded on the tender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusResolution {
    pub status: TenderStatus,
    pub stage: WorkflowStage,
    pub resolved_at: DateTime<Utc>,
}

impl StatusResolution {
    pub fn changes(&self, tender: &Tender) -> bool {
        tender.status != self.status || tender.stage != self.stage
    }
}

/// Derive the canonical status and workflow stage for a tender.
///
/// Signals are consulted in strict priority order: a contract record wins
/// over an approval record, which wins over evaluation completion, which
/// wins over the date-driven rules. Re-running with unchanged inputs always
/// yields the same `(status, stage)` pair, so callers may resolve on every
/// poll or external event.
pub fn resolve(
    tender: &Tender,
    approval: Option<&ApprovalRecord>,
    contract: Option<&ContractRecord>,
    evaluation_complete: bool,
    now: DateTime<Utc>,
    rules: &StatusRules,
) -> StatusResolution {
    let (status, stage) = if let Some(contract) = contract {
        match contract.status {
            ContractStatus::Created => (TenderStatus::ContractCreated, WorkflowStage::ContractAward),
            ContractStatus::Active => (TenderStatus::ContractSigned, WorkflowStage::Implementation),
            ContractStatus::Completed => (TenderStatus::Completed, WorkflowStage::Implementation),
        }
    } else if let Some(approval) = approval {
        let status = match approval.status {
            ApprovalStatus::Pending => TenderStatus::NoObjectionPending,
            ApprovalStatus::Approved => TenderStatus::NoObjectionApproved,
            ApprovalStatus::Rejected => TenderStatus::NoObjectionRejected,
        };
        (status, WorkflowStage::ApprovalReview)
    } else if evaluation_complete {
        (TenderStatus::Evaluated, WorkflowStage::Evaluation)
    } else {
        date_driven(tender, now, rules)
    };

    StatusResolution {
        status,
        stage,
        resolved_at: now,
    }
}

fn date_driven(
    tender: &Tender,
    now: DateTime<Utc>,
    rules: &StatusRules,
) -> (TenderStatus, WorkflowStage) {
    let today = now.date_naive();

    if today > tender.closing_date {
        return (TenderStatus::Closed, WorkflowStage::Evaluation);
    }

    let window = Duration::days(i64::from(rules.closing_soon_window_days));
    if tender.closing_date - today <= window && tender.status != TenderStatus::Draft {
        return (TenderStatus::ClosingSoon, WorkflowStage::Tendering);
    }

    // Inside the explicit phase the authoring collaborator owns the status.
    let status = if tender.status.is_pre_closing() {
        tender.status
    } else {
        TenderStatus::Open
    };
    let stage = match status {
        TenderStatus::Draft => WorkflowStage::Planning,
        _ => WorkflowStage::Tendering,
    };
    (status, stage)
}
