//! Adaptador HTTP para um backend gerenciado no estilo PostgREST.
//!
//! Cada coleção é uma tabela em `{base_url}/rest/v1/{tabela}`, filtrada por
//! `client_id=eq.{id}`. Verificações de existência pedem `select=id&limit=1`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{WorkflowSink, WorkflowSource};
use crate::error::{Collection, StoreError};
use crate::model::{
    AdmissionRecord, ChecklistRecord, ChecklistSummary, ClaimFiling, ClientProfile,
    ClientWorkflowStatus, DocumentRef, ExamRecord, PreviousWorkflow,
};

const REST_PREFIX: &str = "rest/v1";

/// Nomes das tabelas no backend. Cada campo ausente no `esteira.toml` usa o padrão.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub checklists: String,
    pub admissions: String,
    pub claim_filings: String,
    pub exams: String,
    pub financial_entries: String,
    pub workflow: String,
    pub clients: String,
    pub documents: String,
    pub judicial_filings: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            checklists: "checklists".into(),
            admissions: "bau_registros".into(),
            claim_filings: "protocolos".into(),
            exams: "pericias".into(),
            financial_entries: "lancamentos_financeiros".into(),
            workflow: "cliente_workflow_status".into(),
            clients: "clientes".into(),
            documents: "documentos".into(),
            judicial_filings: "processos_judiciais".into(),
        }
    }
}

/// Filtro de uma consulta: coluna comparada ao id do cliente, colunas pedidas e limite.
struct Query<'a> {
    collection: Collection,
    table: &'a str,
    key_column: &'a str,
    select: &'a str,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    fn new(collection: Collection, table: &'a str, select: &'a str) -> Self {
        Self {
            collection,
            table,
            key_column: "client_id",
            select,
            limit: None,
        }
    }

    fn keyed_by(mut self, column: &'a str) -> Self {
        self.key_column = column;
        self
    }

    fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Deserialize)]
struct BoStatusRow {
    #[serde(default)]
    bo_status: Option<String>,
}

/// Adaptador HTTP para um backend no estilo PostgREST (`/rest/v1/<tabela>`).
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    tables: TableNames,
}

impl RestStore {
    pub fn new(
        base_url: &str,
        api_key: String,
        tables: TableNames,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            tables,
        })
    }

    fn url(&self, table: &str) -> String {
        format!("{}/{REST_PREFIX}/{table}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        query: Query<'_>,
        client_id: &str,
    ) -> Result<Vec<T>, StoreError> {
        let mut params = vec![
            (query.key_column, format!("eq.{client_id}")),
            ("select", query.select.to_string()),
        ];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        tracing::debug!(table = query.table, client_id, "reading collection");
        let response = self
            .request(reqwest::Method::GET, query.table)
            .query(&params)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| StoreError::Decode {
            collection: query.collection,
            message: e.to_string(),
        })
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        query: Query<'_>,
        client_id: &str,
    ) -> Result<Option<T>, StoreError> {
        let rows = self.fetch(query.limit(1), client_id).await?;
        Ok(rows.into_iter().next())
    }

    async fn exists(&self, query: Query<'_>, client_id: &str) -> Result<bool, StoreError> {
        let rows: Vec<serde_json::Value> = self.fetch(query.limit(1), client_id).await?;
        Ok(!rows.is_empty())
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

impl WorkflowSource for RestStore {
    async fn checklist(&self, client_id: &str) -> Result<Option<ChecklistSummary>, StoreError> {
        let query = Query::new(
            Collection::Checklist,
            &self.tables.checklists,
            "id,status,concluded_at",
        );
        self.fetch_one(query, client_id).await
    }

    async fn admissions(&self, client_id: &str) -> Result<Vec<AdmissionRecord>, StoreError> {
        let query = Query::new(Collection::Admissions, &self.tables.admissions, "status");
        self.fetch(query, client_id).await
    }

    async fn claim_filings(&self, client_id: &str) -> Result<Vec<ClaimFiling>, StoreError> {
        let query = Query::new(Collection::ClaimFilings, &self.tables.claim_filings, "status");
        self.fetch(query, client_id).await
    }

    async fn exams(&self, client_id: &str) -> Result<Vec<ExamRecord>, StoreError> {
        let query = Query::new(Collection::Exams, &self.tables.exams, "status");
        self.fetch(query, client_id).await
    }

    async fn has_financial_entry(&self, client_id: &str) -> Result<bool, StoreError> {
        let query = Query::new(
            Collection::FinancialEntries,
            &self.tables.financial_entries,
            "id",
        );
        self.exists(query, client_id).await
    }

    async fn previous_workflow(
        &self,
        client_id: &str,
    ) -> Result<Option<PreviousWorkflow>, StoreError> {
        let query = Query::new(
            Collection::Workflow,
            &self.tables.workflow,
            "laudo_status,laudo_medico_url,cid",
        );
        self.fetch_one(query, client_id).await
    }

    async fn client_profile(&self, client_id: &str) -> Result<Option<ClientProfile>, StoreError> {
        let query = Query::new(
            Collection::Client,
            &self.tables.clients,
            "police_report,police_report_number",
        )
        .keyed_by("id");
        self.fetch_one(query, client_id).await
    }

    async fn documents(&self, client_id: &str) -> Result<Vec<DocumentRef>, StoreError> {
        let query = Query::new(
            Collection::Documents,
            &self.tables.documents,
            "file_name,document_category",
        );
        self.fetch(query, client_id).await
    }

    async fn full_checklist(&self, client_id: &str) -> Result<Option<ChecklistRecord>, StoreError> {
        let query = Query::new(Collection::Checklist, &self.tables.checklists, "*");
        self.fetch_one(query, client_id).await
    }

    async fn checklist_bo_status(&self, client_id: &str) -> Result<Option<String>, StoreError> {
        let query = Query::new(Collection::Checklist, &self.tables.checklists, "bo_status");
        let row: Option<BoStatusRow> = self.fetch_one(query, client_id).await?;
        Ok(row.and_then(|r| r.bo_status))
    }

    /// Conta no máximo uma linha: basta saber se existe processo judicial.
    async fn judicial_filing_count(&self, client_id: &str) -> Result<usize, StoreError> {
        let query = Query::new(
            Collection::JudicialFilings,
            &self.tables.judicial_filings,
            "id",
        );
        Ok(usize::from(self.exists(query, client_id).await?))
    }
}

impl WorkflowSink for RestStore {
    async fn insert_workflow(&self, record: &ClientWorkflowStatus) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, &self.tables.workflow)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_workflow(&self, record: &ClientWorkflowStatus) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PATCH, &self.tables.workflow)
            .query(&[("client_id", format!("eq.{}", record.client_id))])
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChecklistStatus, StepStatus};
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> RestStore {
        RestStore::new(
            &format!("{}/", server.uri()),
            "anon-key".into(),
            TableNames::default(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn record() -> ClientWorkflowStatus {
        ClientWorkflowStatus {
            client_id: "c-1".into(),
            client_registered: true,
            checklist_status: ChecklistStatus::Concluido,
            admission_requested: false,
            admission_status: None,
            police_report_status: Some(StepStatus::Concluido),
            medical_report_status: None,
            filing_status: None,
            exam_cleared: false,
            financial_cleared: false,
            legal_cleared: false,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn exams_are_filtered_by_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/pericias"))
            .and(query_param("client_id", "eq.c-1"))
            .and(query_param("select", "status"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"status": "agendada"}, {"status": "realizada"}])),
            )
            .mount(&server)
            .await;

        let exams = store(&server).exams("c-1").await.unwrap();
        assert_eq!(exams.len(), 2);
        assert_eq!(exams[1].status, "realizada");
    }

    #[tokio::test]
    async fn client_profile_is_keyed_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/clientes"))
            .and(query_param("id", "eq.c-1"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"police_report": false, "police_report_number": "123/2024"}
            ])))
            .mount(&server)
            .await;

        let profile = store(&server).client_profile("c-1").await.unwrap().unwrap();
        assert!(profile.has_police_report_number());
    }

    #[tokio::test]
    async fn existence_check_reads_at_most_one_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/lancamentos_financeiros"))
            .and(query_param("select", "id"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/processos_judiciais"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
            .mount(&server)
            .await;

        let store = store(&server);
        assert!(!store.has_financial_entry("c-1").await.unwrap());
        assert_eq!(store.judicial_filing_count("c-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_checklist_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/checklists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store(&server);
        assert!(store.checklist("c-1").await.unwrap().is_none());
        assert!(store.checklist_bo_status("c-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conclusion_timestamp_without_offset_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/checklists"))
            .and(query_param("client_id", "eq.c-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "chk-1", "status": "concluido", "concluded_at": "2024-04-01T12:00:00"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/cliente_workflow_status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"laudo_status": "revisao", "cid": "S82.1"}
            ])))
            .mount(&server)
            .await;

        let store = store(&server);
        let summary = store.checklist("c-1").await.unwrap().unwrap();
        assert!(summary.has_conclusion_date());
        assert_eq!(summary.status_text(), Some("concluido"));

        let previous = store.previous_workflow("c-1").await.unwrap().unwrap();
        assert_eq!(previous.laudo_status, None);
        assert!(previous.has_diagnosis_code());
    }

    #[tokio::test]
    async fn error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/documentos"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = store(&server).documents("c-1").await.unwrap_err();
        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/protocolos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = store(&server).claim_filings("c-1").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Decode {
                collection: Collection::ClaimFilings,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn insert_posts_record_columns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/cliente_workflow_status"))
            .and(body_partial_json(json!({
                "client_id": "c-1",
                "cliente_cadastrado": true,
                "checklist_status": "concluido",
                "bo_status": "concluido"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).insert_workflow(&record()).await.unwrap();
    }

    #[tokio::test]
    async fn update_patches_by_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/cliente_workflow_status"))
            .and(query_param("client_id", "eq.c-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).update_workflow(&record()).await.unwrap();
    }
}
