#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use tender_eval::workflows::tender::domain::{
    ApprovalRecord, ContractRecord, Tender, TenderCategory, TenderId, TenderStatus,
};
use tender_eval::workflows::tender::evaluation::{
    BidderId, CoiDeclaration, DeclarationId, EvaluationAssignment, EvaluationPeriod,
    EvaluationRepository, EvaluationSettings, EvaluatorId, EvaluatorRole, EvaluatorScorecard,
    EvaluatorSeat, NewAssignment, OverrideEntry, RepositoryError, ScorecardKey, ScoreEntry,
    ScoreSubmission, TenderEvaluationService, TenderRepository,
};
use tender_eval::workflows::tender::template::{
    CriterionCategory, CriterionId, EvaluationTemplate, ScoringCriterion,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn clock(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(10, 0, 0).expect("valid time").and_utc()
}

fn criterion(id: &str, name: &str, category: CriterionCategory, weight: u16) -> ScoringCriterion {
    ScoringCriterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        category,
        max_score: weight,
    }
}

pub fn raw_template() -> EvaluationTemplate {
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
            criterion("methodology", "Methodology", CriterionCategory::Technical, 15),
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

pub fn chairman() -> EvaluatorId {
    EvaluatorId("eval-chair".to_string())
}

pub fn member_one() -> EvaluatorId {
    EvaluatorId("eval-m1".to_string())
}

pub fn member_two() -> EvaluatorId {
    EvaluatorId("eval-m2".to_string())
}

pub fn bidder_alpha() -> BidderId {
    BidderId("bidder-alpha".to_string())
}

pub fn bidder_beta() -> BidderId {
    BidderId("bidder-beta".to_string())
}

pub fn tender_id() -> TenderId {
    TenderId("tender-001".to_string())
}

pub fn open_tender() -> Tender {
    let mut tender = Tender::draft(
        tender_id(),
        "Regional water supply design and supervision".to_string(),
        TenderCategory::Consultancy,
        date(2026, 3, 15),
    );
    tender.status = TenderStatus::Open;
    tender
}

pub fn new_assignment() -> NewAssignment {
    NewAssignment {
        tender_id: tender_id(),
        template: raw_template(),
        roster: vec![
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
        ],
        bidders: vec![bidder_alpha(), bidder_beta()],
        period: EvaluationPeriod {
            start: date(2026, 3, 20),
            end: date(2026, 4, 10),
        },
    }
}

pub fn submission(evaluator: EvaluatorId, bidder: BidderId, values: [f64; 5]) -> ScoreSubmission {
    let ids = [
        "technical-capability",
        "key-staff",
        "methodology",
        "work-plan",
        "financial-offer",
    ];
    ScoreSubmission {
        tender_id: tender_id(),
        evaluator_id: evaluator,
        bidder_id: bidder,
        scores: ids
            .iter()
            .zip(values)
            .map(|(id, score)| ScoreEntry {
                criterion_id: CriterionId(id.to_string()),
                score,
                comment: None,
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct MemoryTenderRepository {
    tenders: Mutex<BTreeMap<TenderId, Tender>>,
    approvals: Mutex<BTreeMap<TenderId, ApprovalRecord>>,
    contracts: Mutex<BTreeMap<TenderId, ContractRecord>>,
}

impl MemoryTenderRepository {
    pub fn set_approval(&self, record: ApprovalRecord) {
        self.approvals
            .lock()
            .expect("approval mutex poisoned")
            .insert(record.tender_id.clone(), record);
    }

    pub fn clear_approval(&self, tender: &TenderId) {
        self.approvals
            .lock()
            .expect("approval mutex poisoned")
            .remove(tender);
    }

    pub fn set_contract(&self, record: ContractRecord) {
        self.contracts
            .lock()
            .expect("contract mutex poisoned")
            .insert(record.tender_id.clone(), record);
    }

    pub fn stored(&self, id: &TenderId) -> Option<Tender> {
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
pub struct MemoryEvaluationRepository {
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

pub type MemoryService =
    TenderEvaluationService<MemoryTenderRepository, MemoryEvaluationRepository>;

pub fn build_service() -> (
    MemoryService,
    Arc<MemoryTenderRepository>,
    Arc<MemoryEvaluationRepository>,
) {
    let tenders = Arc::new(MemoryTenderRepository::default());
    let evaluations = Arc::new(MemoryEvaluationRepository::default());
    let service =
        TenderEvaluationService::new(tenders.clone(), evaluations.clone(), EvaluationSettings::default());
    (service, tenders, evaluations)
}
