use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{WorkflowSink, WorkflowSource};
use crate::error::{Collection, StoreError};
use crate::model::{
    AdmissionRecord, ChecklistRecord, ChecklistSummary, ClaimFiling, ClientProfile,
    ClientWorkflowStatus, DocumentRef, ExamRecord, PreviousWorkflow,
};

/// Dados de um cliente mantidos pelo [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct ClientFixture {
    /// Registro completo do checklist; o resumo é derivado dele.
    pub checklist: Option<ChecklistRecord>,
    pub admissions: Vec<AdmissionRecord>,
    pub filings: Vec<ClaimFiling>,
    pub exams: Vec<ExamRecord>,
    pub financial_entries: usize,
    pub client: Option<ClientProfile>,
    pub documents: Vec<DocumentRef>,
    pub judicial_filings: usize,
    /// Linha gravada de workflow, com colunas de outras telas (`laudo_medico_url`, `cid`).
    pub workflow: Option<Map<String, Value>>,
}

/// Armazenamento em memória, usado em testes e no comando `demo`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    clients: RwLock<HashMap<String, ClientFixture>>,
    failing: RwLock<HashSet<Collection>>,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
    full_checklist_reads: AtomicUsize,
    bo_status_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cria ou altera os dados de um cliente.
    pub async fn seed(&self, client_id: &str, edit: impl FnOnce(&mut ClientFixture)) {
        let mut clients = self.clients.write().await;
        edit(clients.entry(client_id.to_string()).or_default());
    }

    /// Faz toda operação sobre `collection` falhar a partir de agora.
    pub async fn fail(&self, collection: Collection) {
        self.failing.write().await.insert(collection);
    }

    pub async fn recover(&self, collection: Collection) {
        self.failing.write().await.remove(&collection);
    }

    /// Faz as gravações falharem sem afetar as leituras.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Quantidade de gravações bem-sucedidas.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Quantas vezes o checklist completo foi pedido.
    pub fn full_checklist_reads(&self) -> usize {
        self.full_checklist_reads.load(Ordering::SeqCst)
    }

    /// Quantas vezes o sub-campo `bo_status` do checklist foi pedido.
    pub fn bo_status_reads(&self) -> usize {
        self.bo_status_reads.load(Ordering::SeqCst)
    }

    /// Linha de workflow gravada, lida como registro completo.
    pub async fn workflow(&self, client_id: &str) -> Option<ClientWorkflowStatus> {
        let clients = self.clients.read().await;
        let row = clients.get(client_id)?.workflow.clone()?;
        serde_json::from_value(Value::Object(row)).ok()
    }

    async fn check(&self, collection: Collection) -> Result<(), StoreError> {
        if self.failing.read().await.contains(&collection) {
            Err(StoreError::Unavailable(collection))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(Collection::Workflow))
        } else {
            Ok(())
        }
    }

    async fn read<T>(
        &self,
        collection: Collection,
        client_id: &str,
        select: impl FnOnce(&ClientFixture) -> T,
    ) -> Result<T, StoreError>
    where
        T: Default,
    {
        self.try_read(collection, client_id, |c| Ok(select(c))).await
    }

    async fn try_read<T>(
        &self,
        collection: Collection,
        client_id: &str,
        select: impl FnOnce(&ClientFixture) -> Result<T, StoreError>,
    ) -> Result<T, StoreError>
    where
        T: Default,
    {
        self.check(collection).await?;
        let clients = self.clients.read().await;
        match clients.get(client_id) {
            Some(fixture) => select(fixture),
            None => Ok(T::default()),
        }
    }
}

/// Decodifica uma linha guardada como a resposta do backend seria decodificada.
fn decode_row<T: DeserializeOwned>(
    collection: Collection,
    row: &Map<String, Value>,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|e| StoreError::Decode {
        collection,
        message: e.to_string(),
    })
}

fn record_row(record: &ClientWorkflowStatus) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Decode {
            collection: Collection::Workflow,
            message: "record did not serialize to an object".into(),
        }),
        Err(e) => Err(StoreError::Decode {
            collection: Collection::Workflow,
            message: e.to_string(),
        }),
    }
}

impl WorkflowSource for MemoryStore {
    async fn checklist(&self, client_id: &str) -> Result<Option<ChecklistSummary>, StoreError> {
        self.try_read(Collection::Checklist, client_id, |c| {
            c.checklist
                .as_ref()
                .map(|record| decode_row::<ChecklistSummary>(Collection::Checklist, &record.0))
                .transpose()
        })
        .await
    }

    async fn admissions(&self, client_id: &str) -> Result<Vec<AdmissionRecord>, StoreError> {
        self.read(Collection::Admissions, client_id, |c| c.admissions.clone())
            .await
    }

    async fn claim_filings(&self, client_id: &str) -> Result<Vec<ClaimFiling>, StoreError> {
        self.read(Collection::ClaimFilings, client_id, |c| c.filings.clone())
            .await
    }

    async fn exams(&self, client_id: &str) -> Result<Vec<ExamRecord>, StoreError> {
        self.read(Collection::Exams, client_id, |c| c.exams.clone())
            .await
    }

    async fn has_financial_entry(&self, client_id: &str) -> Result<bool, StoreError> {
        self.read(Collection::FinancialEntries, client_id, |c| {
            c.financial_entries > 0
        })
        .await
    }

    async fn previous_workflow(
        &self,
        client_id: &str,
    ) -> Result<Option<PreviousWorkflow>, StoreError> {
        self.try_read(Collection::Workflow, client_id, |c| {
            c.workflow
                .as_ref()
                .map(|row| decode_row::<PreviousWorkflow>(Collection::Workflow, row))
                .transpose()
        })
        .await
    }

    async fn client_profile(&self, client_id: &str) -> Result<Option<ClientProfile>, StoreError> {
        self.read(Collection::Client, client_id, |c| c.client.clone())
            .await
    }

    async fn documents(&self, client_id: &str) -> Result<Vec<DocumentRef>, StoreError> {
        self.read(Collection::Documents, client_id, |c| c.documents.clone())
            .await
    }

    async fn full_checklist(&self, client_id: &str) -> Result<Option<ChecklistRecord>, StoreError> {
        self.full_checklist_reads.fetch_add(1, Ordering::SeqCst);
        self.read(Collection::Checklist, client_id, |c| c.checklist.clone())
            .await
    }

    async fn checklist_bo_status(&self, client_id: &str) -> Result<Option<String>, StoreError> {
        self.bo_status_reads.fetch_add(1, Ordering::SeqCst);
        self.read(Collection::Checklist, client_id, |c| {
            c.checklist
                .as_ref()
                .and_then(|record| record.0.get("bo_status"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .await
    }

    async fn judicial_filing_count(&self, client_id: &str) -> Result<usize, StoreError> {
        self.read(Collection::JudicialFilings, client_id, |c| {
            c.judicial_filings
        })
        .await
    }
}

impl WorkflowSink for MemoryStore {
    async fn insert_workflow(&self, record: &ClientWorkflowStatus) -> Result<(), StoreError> {
        self.check_write()?;
        let row = record_row(record)?;
        let mut clients = self.clients.write().await;
        let fixture = clients.entry(record.client_id.clone()).or_default();
        if fixture.workflow.is_some() {
            return Err(StoreError::Api {
                status: 409,
                message: format!("workflow for client {} already exists", record.client_id),
            });
        }
        fixture.workflow = Some(row);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_workflow(&self, record: &ClientWorkflowStatus) -> Result<(), StoreError> {
        self.check_write()?;
        let row = record_row(record)?;
        let mut clients = self.clients.write().await;
        let stored = clients
            .get_mut(&record.client_id)
            .and_then(|fixture| fixture.workflow.as_mut())
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("no workflow for client {}", record.client_id),
            })?;
        stored.extend(row);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
