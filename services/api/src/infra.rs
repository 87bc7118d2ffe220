use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;

use tender_eval::workflows::tender::domain::{
    ApprovalRecord, ContractRecord, Tender, TenderId,
};
use tender_eval::workflows::tender::evaluation::{
    CoiDeclaration, DeclarationId, EvaluationAssignment, EvaluationRepository, EvaluatorScorecard,
    OverrideEntry, RepositoryError, ScorecardKey, TenderRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-process tender store. Approval and contract records arrive from the
/// downstream collaborators and are only ever read by the resolver.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTenderRepository {
    tenders: Arc<Mutex<HashMap<TenderId, Tender>>>,
    approvals: Arc<Mutex<HashMap<TenderId, ApprovalRecord>>>,
    contracts: Arc<Mutex<HashMap<TenderId, ContractRecord>>>,
}

impl InMemoryTenderRepository {
    pub(crate) fn record_approval(&self, record: ApprovalRecord) {
        self.approvals
            .lock()
            .expect("approval mutex poisoned")
            .insert(record.tender_id.clone(), record);
    }

    pub(crate) fn record_contract(&self, record: ContractRecord) {
        self.contracts
            .lock()
            .expect("contract mutex poisoned")
            .insert(record.tender_id.clone(), record);
    }
}

impl TenderRepository for InMemoryTenderRepository {
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
        let mut tenders: Vec<Tender> = guard.values().cloned().collect();
        tenders.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tenders)
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    assignments: Arc<Mutex<HashMap<TenderId, EvaluationAssignment>>>,
    scorecards: Arc<Mutex<HashMap<ScorecardKey, EvaluatorScorecard>>>,
    declarations: Arc<Mutex<HashMap<DeclarationId, CoiDeclaration>>>,
    overrides: Arc<Mutex<HashMap<TenderId, Vec<OverrideEntry>>>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
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
        let mut cards: Vec<EvaluatorScorecard> = guard
            .values()
            .filter(|card| &card.tender_id == tender)
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(cards)
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
        let mut declarations: Vec<CoiDeclaration> = guard
            .values()
            .filter(|declaration| &declaration.tender_id == tender)
            .cloned()
            .collect();
        declarations.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(declarations)
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
