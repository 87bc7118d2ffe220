use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::tender::evaluation::domain::AssignmentId;

/// Identifier wrapper for tenders supplied by the authoring collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenderId(pub String);

impl std::fmt::Display for TenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderCategory {
    Goods,
    Works,
    Services,
    Consultancy,
}

impl TenderCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Goods => "Goods",
            Self::Works => "Works",
            Self::Services => "Services",
            Self::Consultancy => "Consultancy",
        }
    }
}

/// Canonical tender status. Always a tagged variant, never free text: the
/// resolver in `status.rs` is the only authority once evaluation has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    Draft,
    Published,
    Open,
    ClosingSoon,
    Closed,
    Evaluated,
    NoObjectionPending,
    NoObjectionApproved,
    NoObjectionRejected,
    ContractCreated,
    ContractSigned,
    Completed,
}

impl TenderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Published => "Published",
            Self::Open => "Open",
            Self::ClosingSoon => "Closing Soon",
            Self::Closed => "Closed",
            Self::Evaluated => "Evaluated",
            Self::NoObjectionPending => "No-Objection Pending",
            Self::NoObjectionApproved => "No-Objection Approved",
            Self::NoObjectionRejected => "No-Objection Rejected",
            Self::ContractCreated => "Contract Created",
            Self::ContractSigned => "Contract Signed",
            Self::Completed => "Completed",
        }
    }

    /// Statuses a tender can carry before its closing date passes. Only these
    /// survive the date-driven rules untouched.
    pub const fn is_pre_closing(self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Published | Self::Open | Self::ClosingSoon
        )
    }
}

/// Coarse phase label derived alongside the fine-grained status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Planning,
    Tendering,
    Evaluation,
    ApprovalReview,
    ContractAward,
    Implementation,
}

impl WorkflowStage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Planning,
            Self::Tendering,
            Self::Evaluation,
            Self::ApprovalReview,
            Self::ContractAward,
            Self::Implementation,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Tendering => "Tendering",
            Self::Evaluation => "Evaluation",
            Self::ApprovalReview => "Approval Review",
            Self::ContractAward => "Contract Award",
            Self::Implementation => "Implementation",
        }
    }
}

/// Tender record as exchanged with the authoring collaborator, plus the
/// status metadata this system writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tender {
    pub id: TenderId,
    pub title: String,
    pub category: TenderCategory,
    pub closing_date: NaiveDate,
    pub status: TenderStatus,
    pub stage: WorkflowStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<ApprovalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<ContractId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<AssignmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,
}

impl Tender {
    /// A freshly authored tender prior to any resolver pass.
    pub fn draft(id: TenderId, title: String, category: TenderCategory, closing_date: NaiveDate) -> Self {
        Self {
            id,
            title,
            category,
            closing_date,
            status: TenderStatus::Draft,
            stage: WorkflowStage::Planning,
            approval_id: None,
            contract_id: None,
            assignment_id: None,
            status_updated_at: None,
        }
    }

    pub fn status_view(&self) -> TenderStatusView {
        TenderStatusView {
            tender_id: self.id.clone(),
            status: self.status,
            status_label: self.status.label(),
            stage: self.stage,
            stage_label: self.stage.label(),
            closing_date: self.closing_date,
            status_updated_at: self.status_updated_at,
        }
    }
}

/// Sanitized representation of a tender's externally visible status.
#[derive(Debug, Clone, Serialize)]
pub struct TenderStatusView {
    pub tender_id: TenderId,
    pub status: TenderStatus,
    pub status_label: &'static str,
    pub stage: WorkflowStage,
    pub stage_label: &'static str,
    pub closing_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,
}

/// State of a downstream no-objection review, consumed read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: ApprovalId,
    pub tender_id: TenderId,
    pub status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// State of a downstream contract record, consumed read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Created,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id: ContractId,
    pub tender_id: TenderId,
    pub status: ContractStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_on: Option<NaiveDate>,
}
