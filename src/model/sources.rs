//! Entidades de origem lidas pelo motor. Nenhuma delas é escrita aqui.
//!
//! Os campos de status das coleções são strings livres no banco; a comparação
//! é feita por [`status_in`], que normaliza espaços e caixa.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::status::StepStatus;

/// Campos de controle do checklist, fora da conta de preenchimento.
pub const CHECKLIST_META_FIELDS: &[&str] = &[
    "id",
    "client_id",
    "created_at",
    "updated_at",
    "status",
    "concluded_at",
    "concluded_by",
];

/// Leitura estreita do checklist usada no fan-out principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Lido como valor bruto: colunas `timestamp` chegam sem fuso.
    #[serde(default)]
    pub concluded_at: Option<Value>,
}

impl ChecklistSummary {
    /// Há data de conclusão gravada (texto em branco não conta).
    pub fn has_conclusion_date(&self) -> bool {
        match &self.concluded_at {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Status presente e não vazio.
    pub fn status_text(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Registro completo do checklist: um mapa aberto de perguntas de atendimento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistRecord(pub Map<String, Value>);

impl ChecklistRecord {
    /// Itera apenas os campos de pergunta (sem os campos de controle).
    pub fn question_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0
            .iter()
            .filter(|(key, _)| !CHECKLIST_META_FIELDS.contains(&key.as_str()))
    }
}

impl From<Value> for ChecklistRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ChecklistRecord(map),
            _ => ChecklistRecord::default(),
        }
    }
}

/// Registro de solicitação do BAU (boletim de atendimento de urgência).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    #[serde(default)]
    pub status: String,
}

/// Protocolo do pedido de indenização.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimFiling {
    #[serde(default)]
    pub status: String,
}

/// Agendamento de perícia médica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    #[serde(default)]
    pub status: String,
}

/// Dados do cadastro do cliente relevantes para o boletim de ocorrência.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    #[serde(default, deserialize_with = "null_as_false")]
    pub police_report: bool,
    #[serde(default)]
    pub police_report_number: Option<String>,
}

impl ClientProfile {
    pub fn has_police_report_number(&self) -> bool {
        self.police_report_number
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub file_name: String,
    #[serde(default, rename = "document_category")]
    pub category: Option<String>,
}

impl DocumentRef {
    pub fn named(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            category: None,
        }
    }
}

/// Recorte do registro de workflow já gravado.
///
/// `laudo_url` e `cid` são preenchidos por outras telas; o motor só os lê.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviousWorkflow {
    /// Valores fora de [`StepStatus`] são lidos como ausentes.
    #[serde(default, deserialize_with = "known_step_status")]
    pub laudo_status: Option<StepStatus>,
    #[serde(default, rename = "laudo_medico_url")]
    pub laudo_url: Option<String>,
    #[serde(default)]
    pub cid: Option<String>,
}

impl PreviousWorkflow {
    pub fn has_report_reference(&self) -> bool {
        non_blank(self.laudo_url.as_deref())
    }

    pub fn has_diagnosis_code(&self) -> bool {
        non_blank(self.cid.as_deref())
    }
}

/// Resultado das oito leituras independentes do fan-out principal.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub checklist: Option<ChecklistSummary>,
    pub admissions: Vec<AdmissionRecord>,
    pub filings: Vec<ClaimFiling>,
    pub exams: Vec<ExamRecord>,
    pub has_financial_entry: bool,
    pub previous: Option<PreviousWorkflow>,
    pub client: Option<ClientProfile>,
    pub documents: Vec<DocumentRef>,
}

/// Leituras feitas depois do snapshot: as duas condicionais e a de processos judiciais.
#[derive(Debug, Clone, Default)]
pub struct FollowUpReads {
    pub full_checklist: Option<ChecklistRecord>,
    pub checklist_bo_status: Option<String>,
    pub judicial_filings: usize,
}

/// Compara um status livre contra um conjunto, ignorando espaços e caixa.
pub fn status_in(status: &str, set: &[&str]) -> bool {
    let normalized = status.trim().to_ascii_lowercase();
    set.contains(&normalized.as_str())
}

fn non_blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn known_step_status<'de, D>(deserializer: D) -> Result<Option<StepStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_in_normalizes_case_and_whitespace() {
        assert!(status_in(" Deferido ", &["deferido", "pago"]));
        assert!(!status_in("em_analise", &["deferido", "pago"]));
    }

    #[test]
    fn question_fields_skip_meta_fields() {
        let record = ChecklistRecord::from(json!({
            "id": "x",
            "client_id": "c-1",
            "status": "em_preenchimento",
            "concluded_by": null,
            "acidente_data": "2024-01-01",
            "vitima_hospitalizada": null
        }));
        let keys: Vec<&str> = record.question_fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"acidente_data"));
        assert!(keys.contains(&"vitima_hospitalizada"));
    }

    #[test]
    fn client_profile_treats_null_flag_as_false() {
        let profile: ClientProfile =
            serde_json::from_value(json!({"police_report": null, "police_report_number": "  "}))
                .unwrap();
        assert!(!profile.police_report);
        assert!(!profile.has_police_report_number());
    }

    #[test]
    fn previous_workflow_reads_report_columns() {
        let previous: PreviousWorkflow = serde_json::from_value(json!({
            "laudo_status": "em_andamento",
            "laudo_medico_url": "https://files/laudo.pdf",
            "cid": ""
        }))
        .unwrap();
        assert_eq!(previous.laudo_status, Some(StepStatus::EmAndamento));
        assert!(previous.has_report_reference());
        assert!(!previous.has_diagnosis_code());
    }

    #[test]
    fn unknown_laudo_status_reads_as_absent() {
        let previous: PreviousWorkflow = serde_json::from_value(json!({
            "laudo_status": "aguardando_pericia",
            "cid": "S82.1"
        }))
        .unwrap();
        assert_eq!(previous.laudo_status, None);
        assert_eq!(previous.cid.as_deref(), Some("S82.1"));

        let numeric: PreviousWorkflow =
            serde_json::from_value(json!({"laudo_status": 3})).unwrap();
        assert_eq!(numeric.laudo_status, None);
    }

    #[test]
    fn conclusion_date_accepts_timestamps_without_offset() {
        let summary: ChecklistSummary = serde_json::from_value(json!({
            "status": "em_preenchimento",
            "concluded_at": "2024-04-01T12:00:00"
        }))
        .unwrap();
        assert!(summary.has_conclusion_date());

        let open: ChecklistSummary =
            serde_json::from_value(json!({"status": "pendente", "concluded_at": null})).unwrap();
        assert!(!open.has_conclusion_date());

        let blank = ChecklistSummary {
            concluded_at: Some(json!("  ")),
            ..Default::default()
        };
        assert!(!blank.has_conclusion_date());
    }

    #[test]
    fn summary_status_text_skips_blank() {
        let summary = ChecklistSummary {
            status: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(summary.status_text(), None);
    }
}
