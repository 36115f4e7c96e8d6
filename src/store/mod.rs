//! Portas de acesso aos dados do cliente.
//!
//! [`WorkflowSource`] reúne uma consulta tipada por coleção e [`WorkflowSink`]
//! a gravação do registro consolidado. O motor só conhece estes dois traits;
//! [`MemoryStore`] e [`RestStore`] são as implementações disponíveis.

mod memory;
mod rest;

use std::future::Future;

use crate::error::StoreError;
use crate::model::{
    AdmissionRecord, ChecklistRecord, ChecklistSummary, ClaimFiling, ClientProfile,
    ClientWorkflowStatus, DocumentRef, ExamRecord, PreviousWorkflow,
};

pub use memory::{ClientFixture, MemoryStore};
pub use rest::{RestStore, TableNames};

/// Leituras filtradas por `client_id`.
pub trait WorkflowSource: Send + Sync {
    fn checklist(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Option<ChecklistSummary>, StoreError>> + Send;

    fn admissions(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Vec<AdmissionRecord>, StoreError>> + Send;

    fn claim_filings(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Vec<ClaimFiling>, StoreError>> + Send;

    fn exams(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Vec<ExamRecord>, StoreError>> + Send;

    /// Verificação de existência limitada a uma linha.
    fn has_financial_entry(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn previous_workflow(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Option<PreviousWorkflow>, StoreError>> + Send;

    fn client_profile(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Option<ClientProfile>, StoreError>> + Send;

    fn documents(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Vec<DocumentRef>, StoreError>> + Send;

    /// Registro completo do checklist, para a conta de preenchimento.
    fn full_checklist(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Option<ChecklistRecord>, StoreError>> + Send;

    /// Apenas o sub-campo `bo_status` do checklist.
    fn checklist_bo_status(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn judicial_filing_count(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Gravação do registro de workflow, chaveada por `client_id`.
pub trait WorkflowSink: Send + Sync {
    fn insert_workflow(
        &self,
        record: &ClientWorkflowStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atualiza só as colunas do registro; colunas mantidas por outras telas ficam intactas.
    fn update_workflow(
        &self,
        record: &ClientWorkflowStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
