use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::tender::domain::{
    ApprovalRecord, ContractRecord, Tender, TenderCategory, TenderId, TenderStatus,
};
use crate::workflows::tender::evaluation::conflict::{CoiDeclaration, DeclarationId};
use crate::workflows::tender::evaluation::consensus::OverrideEntry;
use crate::workflows::tender::evaluation::domain::{
    BidderId, EvaluationAssignment, EvaluationPeriod, EvaluatorId, EvaluatorRole,
    EvaluatorScorecard, EvaluatorSeat, ScorecardKey, ScoreEntry, ScoreSubmission,
};
use crate::workflows::tender::evaluation::repository::{
    EvaluationRepository, RepositoryError, TenderRepository,
};
use crate::workflows::tender::evaluation::service::{NewAssignment, TenderEvaluationService};
use crate::workflows::tender::evaluation::EvaluationSettings;
use crate::workflows::tender::template::{
    CriterionCategory, CriterionId, EvaluationTemplate, ScoringCriterion,
};

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn clock(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(10, 0, 0).expect("valid time").and_utc()
}

pub(super) fn criterion(
    id: &str,
    name: &str,
    category: CriterionCategory,
    weight: u16,
) -> ScoringCriterion {
    ScoringCriterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        category,
        max_score: weight,
    }
}

/// Raw QCBS template; normalization turns the technical weights
/// [22, 18, 15, 10] into [24, 19, 16, 11] against the default 70/30 split.
pub(super) fn raw_template() -> EvaluationTemplate {
    EvaluationTemplate::new(
        "QCBS standard",
        vec![
            criterion(
                "technical-capability",
                "Technical Capability",
                CriterionCategory::Technical,
                22,
            ),
            criterion(
                "key-staff",
                "Key Staff Experience",
                CriterionCategory::Technical,
                18,
            ),
            criterion(
                "methodology",
                "Methodology",
                CriterionCategory::Technical,
                15,
            ),
            criterion("work-plan", "Work Plan", CriterionCategory::Technical, 10),
            criterion(
                "financial-offer",
                "Financial Offer",
                CriterionCategory::Financial,
                30,
            ),
        ],
    )
}

pub(super) fn settings() -> EvaluationSettings {
    EvaluationSettings::default()
}

pub(super) fn chairman() -> EvaluatorId {
    EvaluatorId("eval-chair".to_string())
}

pub(super) fn member_one() -> EvaluatorId {
    EvaluatorId("eval-m1".to_string())
}

pub(super) fn member_two() -> EvaluatorId {
    EvaluatorId("eval-m2".to_string())
}

pub(super) fn roster() -> Vec<EvaluatorSeat> {
    vec![
        EvaluatorSeat {
            evaluator_id: chairman(),
            name: "Amina Yusuf".to_string(),
            role: EvaluatorRole::Chairman,
        },
        EvaluatorSeat {
            evaluator_id: member_one(),
            name: "Daniel Okello".to_string(),
            role: EvaluatorRole::Member,
        },
        EvaluatorSeat {
            evaluator_id: member_two(),
            name: "Grace Mutai".to_string(),
            role: EvaluatorRole::Member,
        },
        EvaluatorSeat {
            evaluator_id: EvaluatorId("eval-sec".to_string()),
            name: "Peter Ndlovu".to_string(),
            role: EvaluatorRole::Secretary,
        },
    ]
}

pub(super) fn bidder_alpha() -> BidderId {
    BidderId("bidder-alpha".to_string())
}

pub(super) fn bidder_beta() -> BidderId {
    BidderId("bidder-beta".to_string())
}

pub(super) fn bidders() -> Vec<BidderId> {
    vec![bidder_alpha(), bidder_beta()]
}

pub(super) fn period() -> EvaluationPeriod {
    EvaluationPeriod {
        start: date(2026, 3, 20),
        end: date(2026, 4, 10),
    }
}

pub(super) fn tender_id() -> TenderId {
    TenderId("tender-001".to_string())
}

pub(super) fn open_tender() -> Tender {
    let mut tender = Tender::draft(
        tender_id(),
        "Regional water supply design and supervision".to_string(),
        TenderCategory::Consultancy,
        date(2026, 3, 15),
    );
    tender.status = TenderStatus::Open;
    tender
}

pub(super) fn new_assignment() -> NewAssignment {
    NewAssignment {
        tender_id: tender_id(),
        template: raw_template(),
        roster: roster(),
        bidders: bidders(),
        period: period(),
    }
}

/// Scores in template order (normalized maxes [24, 19, 16, 11, 30]).
pub(super) fn score_entries(values: [f64; 5]) -> Vec<ScoreEntry> {
    let ids = [
        "technical-capability",
        "key-staff",
        "methodology",
        "work-plan",
        "financial-offer",
    ];
    ids.iter()
        .zip(values)
        .map(|(id, score)| ScoreEntry {
            criterion_id: CriterionId(id.to_string()),
            score,
            comment: None,
        })
        .collect()
}

pub(super) fn submission(evaluator: EvaluatorId, bidder: BidderId, values: [f64; 5]) -> ScoreSubmission {
    ScoreSubmission {
        tender_id: tender_id(),
        evaluator_id: evaluator,
        bidder_id: bidder,
        scores: score_entries(values),
    }
}

#[derive(Default)]
pub(super) struct MemoryTenderRepository {
    tenders: Mutex<BTreeMap<TenderId, Tender>>,
    approvals: Mutex<BTreeMap<TenderId, ApprovalRecord>>,
    contracts: Mutex<BTreeMap<TenderId, ContractRecord>>,
}

impl MemoryTenderRepository {
    pub(super) fn set_approval(&self, record: ApprovalRecord) {
        self.approvals
            .lock()
            .expect("approval mutex poisoned")
            .insert(record.tender_id.clone(), record);
    }

    pub(super) fn set_contract(&self, record: ContractRecord) {
        self.contracts
            .lock()
            .expect("contract mutex poisoned")
            .insert(record.tender_id.clone(), record);
    }

    pub(super) fn stored(&self, id: &TenderId) -> Option<Tender> {
        self.tenders
            .lock()
            .expect("tender mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl TenderRepository for MemoryTenderRepository {
    fn insert(&self, tender: Tender) -> Result<Tender, RepositoryError> {
        let mut guard = self.tenders.lock().expect("tender mutex poisoned");
        if guard.contains_key(&tender.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(tender.id.clone(), tender.clone());
        Ok(tender)
    }

    fn update(&self, tender: Tender) -> Result<(), RepositoryError> {
        let mut guard = self.tenders.lock().expect("tender mutex poisoned");
        if !guard.contains_key(&tender.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(tender.id.clone(), tender);
        Ok(())
    }

    fn fetch(&self, id: &TenderId) -> Result<Option<Tender>, RepositoryError> {
        let guard = self.tenders.lock().expect("tender mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<Tender>, RepositoryError> {
        let guard = self.tenders.lock().expect("tender mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn approval_for(&self, tender: &TenderId) -> Result<Option<ApprovalRecord>, RepositoryError> {
        let guard = self.approvals.lock().expect("approval mutex poisoned");
        Ok(guard.get(tender).cloned())
    }

    fn contract_for(&self, tender: &TenderId) -> Result<Option<ContractRecord>, RepositoryError> {
        let guard = self.contracts.lock().expect("contract mutex poisoned");
        Ok(guard.get(tender).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryEvaluationRepository {
    assignments: Mutex<BTreeMap<TenderId, EvaluationAssignment>>,
    scorecards: Mutex<BTreeMap<ScorecardKey, EvaluatorScorecard>>,
    declarations: Mutex<BTreeMap<DeclarationId, CoiDeclaration>>,
    overrides: Mutex<BTreeMap<TenderId, Vec<OverrideEntry>>>,
}

impl EvaluationRepository for MemoryEvaluationRepository {
    fn insert_assignment(
        &self,
        assignment: EvaluationAssignment,
    ) -> Result<EvaluationAssignment, RepositoryError> {
        let mut guard = self.assignments.lock().expect("assignment mutex poisoned");
        if guard.contains_key(&assignment.tender_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(assignment.tender_id.clone(), assignment.clone());
        Ok(assignment)
    }

    fn assignment_for(
        &self,
        tender: &TenderId,
    ) -> Result<Option<EvaluationAssignment>, RepositoryError> {
        let guard = self.assignments.lock().expect("assignment mutex poisoned");
        Ok(guard.get(tender).cloned())
    }

    fn upsert_scorecard(&self, scorecard: EvaluatorScorecard) -> Result<(), RepositoryError> {
        let mut guard = self.scorecards.lock().expect("scorecard mutex poisoned");
        guard.insert(scorecard.key(), scorecard);
        Ok(())
    }

    fn scorecard(&self, key: &ScorecardKey) -> Result<Option<EvaluatorScorecard>, RepositoryError> {
        let guard = self.scorecards.lock().expect("scorecard mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    fn scorecards_for(
        &self,
        tender: &TenderId,
    ) -> Result<Vec<EvaluatorScorecard>, RepositoryError> {
        let guard = self.scorecards.lock().expect("scorecard mutex poisoned");
        Ok(guard
            .values()
            .filter(|card| &card.tender_id == tender)
            .cloned()
            .collect())
    }

    fn insert_declaration(
        &self,
        declaration: CoiDeclaration,
    ) -> Result<CoiDeclaration, RepositoryError> {
        let mut guard = self.declarations.lock().expect("declaration mutex poisoned");
        if guard.contains_key(&declaration.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(declaration.id.clone(), declaration.clone());
        Ok(declaration)
    }

    fn update_declaration(&self, declaration: CoiDeclaration) -> Result<(), RepositoryError> {
        let mut guard = self.declarations.lock().expect("declaration mutex poisoned");
        if !guard.contains_key(&declaration.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(declaration.id.clone(), declaration);
        Ok(())
    }

    fn declaration(&self, id: &DeclarationId) -> Result<Option<CoiDeclaration>, RepositoryError> {
        let guard = self.declarations.lock().expect("declaration mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn declarations_for(&self, tender: &TenderId) -> Result<Vec<CoiDeclaration>, RepositoryError> {
        let guard = self.declarations.lock().expect("declaration mutex poisoned");
        Ok(guard
            .values()
            .filter(|declaration| &declaration.tender_id == tender)
            .cloned()
            .collect())
    }

    fn append_override(
        &self,
        tender: &TenderId,
        entry: OverrideEntry,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.overrides.lock().expect("override mutex poisoned");
        guard.entry(tender.clone()).or_default().push(entry);
        Ok(())
    }

    fn overrides_for(&self, tender: &TenderId) -> Result<Vec<OverrideEntry>, RepositoryError> {
        let guard = self.overrides.lock().expect("override mutex poisoned");
        Ok(guard.get(tender).cloned().unwrap_or_default())
    }
}

/// Repository stub that fails every call, for infrastructure-error paths.
pub(super) struct UnavailableTenderRepository;

impl TenderRepository for UnavailableTenderRepository {
    fn insert(&self, _tender: Tender) -> Result<Tender, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _tender: Tender) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &TenderId) -> Result<Option<Tender>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Tender>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn approval_for(&self, _tender: &TenderId) -> Result<Option<ApprovalRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn contract_for(&self, _tender: &TenderId) -> Result<Option<ContractRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService =
    TenderEvaluationService<MemoryTenderRepository, MemoryEvaluationRepository>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryTenderRepository>,
    Arc<MemoryEvaluationRepository>,
) {
    let tenders = Arc::new(MemoryTenderRepository::default());
    let evaluations = Arc::new(MemoryEvaluationRepository::default());
    let service = TenderEvaluationService::new(tenders.clone(), evaluations.clone(), settings());
    (service, tenders, evaluations)
}

/// Service with a registered tender and a created assignment.
pub(super) fn service_with_assignment() -> (
    MemoryService,
    Arc<MemoryTenderRepository>,
    Arc<MemoryEvaluationRepository>,
    EvaluationAssignment,
) {
    let (service, tenders, evaluations) = build_service();
    service.register_tender(open_tender()).expect("tender registers");
    let assignment = service
        .create_assignment(new_assignment())
        .expect("assignment creates");
    (service, tenders, evaluations, assignment)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
