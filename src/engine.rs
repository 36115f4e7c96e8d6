//! Pipeline de recálculo: leituras → inferência → gravação → aviso de cache.
//!
//! Qualquer falha de leitura aborta antes da gravação. Recalculações do mesmo
//! cliente dentro de um [`WorkflowEngine`] são serializadas por um mutex por
//! cliente; clientes diferentes seguem em paralelo.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::builder::build_record;
use crate::error::{Collection, EngineError, StoreError};
use crate::events::{EventBus, WorkflowEvent};
use crate::matcher::{DocumentSignals, match_documents};
use crate::model::{ClientWorkflowStatus, FollowUpReads, SourceSnapshot};
use crate::steps;
use crate::store::{WorkflowSink, WorkflowSource};

/// Como o registro foi persistido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    Inserted,
    Updated,
}

/// Resultado de uma recalculação concluída.
#[derive(Debug, Clone, Serialize)]
pub struct Recalculation {
    pub record: ClientWorkflowStatus,
    /// Todas as categorias do matcher, inclusive as que nenhuma etapa consome.
    pub signals: DocumentSignals,
    pub write: WriteKind,
}

/// Motor de recálculo: lê as fontes, aplica as etapas e grava um registro por cliente.
pub struct WorkflowEngine<S> {
    store: S,
    events: EventBus,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

async fn read<T>(
    collection: Collection,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, EngineError> {
    fut.await.map_err(EngineError::read(collection))
}

impl<S> WorkflowEngine<S>
where
    S: WorkflowSource + WorkflowSink,
{
    pub fn new(store: S) -> Self {
        Self::with_events(store, EventBus::default())
    }

    pub fn with_events(store: S, events: EventBus) -> Self {
        Self {
            store,
            events,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recalcula e grava o registro de workflow de um cliente.
    pub async fn recalculate(&self, client_id: &str) -> Result<Recalculation, EngineError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(EngineError::InvalidClientId);
        }

        let lock = self.client_lock(client_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run(client_id).await
        };
        self.release_lock(client_id, lock).await;

        match &result {
            Ok(done) => tracing::info!(
                client_id,
                write = ?done.write,
                checklist = %done.record.checklist_status,
                "workflow recalculated"
            ),
            Err(e) => tracing::warn!(client_id, error = %e, "workflow recalculation aborted"),
        }
        result
    }

    async fn run(&self, client_id: &str) -> Result<Recalculation, EngineError> {
        let snapshot = self.read_snapshot(client_id).await?;
        let signals = match_documents(&snapshot.documents);
        let follow_up = self.read_follow_up(client_id, &snapshot, &signals).await?;

        let record = build_record(client_id, &snapshot, &follow_up, &signals, Utc::now());

        let write = if snapshot.previous.is_some() {
            self.store
                .update_workflow(&record)
                .await
                .map_err(EngineError::Write)?;
            WriteKind::Updated
        } else {
            self.store
                .insert_workflow(&record)
                .await
                .map_err(EngineError::Write)?;
            WriteKind::Inserted
        };

        self.events.publish(WorkflowEvent::recalculated(client_id));

        Ok(Recalculation {
            record,
            signals,
            write,
        })
    }

    async fn read_snapshot(&self, client_id: &str) -> Result<SourceSnapshot, EngineError> {
        let store = &self.store;
        let (
            checklist,
            admissions,
            filings,
            exams,
            has_financial_entry,
            previous,
            client,
            documents,
        ) = tokio::try_join!(
            read(Collection::Checklist, store.checklist(client_id)),
            read(Collection::Admissions, store.admissions(client_id)),
            read(Collection::ClaimFilings, store.claim_filings(client_id)),
            read(Collection::Exams, store.exams(client_id)),
            read(Collection::FinancialEntries, store.has_financial_entry(client_id)),
            read(Collection::Workflow, store.previous_workflow(client_id)),
            read(Collection::Client, store.client_profile(client_id)),
            read(Collection::Documents, store.documents(client_id)),
        )?;
        tracing::debug!(
            client_id,
            admissions = admissions.len(),
            filings = filings.len(),
            exams = exams.len(),
            documents = documents.len(),
            has_previous = previous.is_some(),
            "source snapshot read"
        );

        Ok(SourceSnapshot {
            checklist,
            admissions,
            filings,
            exams,
            has_financial_entry,
            previous,
            client,
            documents,
        })
    }

    /// Leituras condicionais do checklist e a contagem de processos judiciais.
    async fn read_follow_up(
        &self,
        client_id: &str,
        snapshot: &SourceSnapshot,
        signals: &DocumentSignals,
    ) -> Result<FollowUpReads, EngineError> {
        let store = &self.store;
        let summary = snapshot.checklist.as_ref();
        let needs_full = summary.is_some_and(|s| !steps::checklist_declared_done(s));
        let needs_bo = summary.is_some_and(|s| s.status_text().is_some())
            && !steps::police_report_settled(snapshot.client.as_ref(), signals);

        let (full_checklist, checklist_bo_status, judicial_filings) = tokio::try_join!(
            async {
                if needs_full {
                    read(Collection::Checklist, store.full_checklist(client_id)).await
                } else {
                    Ok(None)
                }
            },
            async {
                if needs_bo {
                    read(Collection::Checklist, store.checklist_bo_status(client_id)).await
                } else {
                    Ok(None)
                }
            },
            read(Collection::JudicialFilings, store.judicial_filing_count(client_id)),
        )?;
        tracing::debug!(client_id, needs_full, needs_bo, judicial_filings, "follow-up reads done");

        Ok(FollowUpReads {
            full_checklist,
            checklist_bo_status,
            judicial_filings,
        })
    }

    async fn client_lock(&self, client_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(client_id.to_string()).or_default().clone()
    }

    /// Remove o mutex do cliente quando ninguém mais o aguarda.
    async fn release_lock(&self, client_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Uma referência no mapa e outra aqui.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(client_id);
        }
    }
}

impl<S> WorkflowEngine<S>
where
    S: WorkflowSource + WorkflowSink + 'static,
{
    /// Recalcula vários clientes em tarefas paralelas, um resultado por id na ordem recebida.
    pub async fn recalculate_many(
        self: &Arc<Self>,
        client_ids: &[String],
    ) -> Vec<(String, Result<Recalculation, EngineError>)> {
        let handles: Vec<_> = client_ids
            .iter()
            .map(|id| {
                let engine = Arc::clone(self);
                let task_id = id.clone();
                let handle = tokio::spawn(async move { engine.recalculate(&task_id).await });
                (id.clone(), handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(EngineError::Task(e.to_string())));
            results.push((id, result));
        }
        results
    }
}
