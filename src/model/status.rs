use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Situação do checklist de atendimento.
///
/// Valores desconhecidos vindos do banco são preservados em [`ChecklistStatus::Other`]
/// e gravados de volta sem alteração, inclusive espaços e caixa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChecklistStatus {
    Pendente,
    EmPreenchimento,
    Concluido,
    Other(String),
}

impl ChecklistStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ChecklistStatus::Pendente => "pendente",
            ChecklistStatus::EmPreenchimento => "em_preenchimento",
            ChecklistStatus::Concluido => "concluido",
            ChecklistStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ChecklistStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pendente" => ChecklistStatus::Pendente,
            "em_preenchimento" => ChecklistStatus::EmPreenchimento,
            "concluido" => ChecklistStatus::Concluido,
            _ => ChecklistStatus::Other(raw),
        }
    }
}

impl From<ChecklistStatus> for String {
    fn from(status: ChecklistStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progresso de uma etapa que só tem dois estados conhecidos.
/// A ausência de sinal é representada por `None` no registro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    EmAndamento,
    Concluido,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::EmAndamento => write!(f, "em_andamento"),
            StepStatus::Concluido => write!(f, "concluido"),
        }
    }
}

/// Registro consolidado de progresso de um cliente. Uma linha por `client_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientWorkflowStatus {
    pub client_id: String,
    #[serde(rename = "cliente_cadastrado")]
    pub client_registered: bool,
    pub checklist_status: ChecklistStatus,
    #[serde(rename = "bau_acionado")]
    pub admission_requested: bool,
    #[serde(rename = "bau_status")]
    pub admission_status: Option<StepStatus>,
    #[serde(rename = "bo_status")]
    pub police_report_status: Option<StepStatus>,
    #[serde(rename = "laudo_status")]
    pub medical_report_status: Option<StepStatus>,
    #[serde(rename = "protocolo_status")]
    pub filing_status: Option<StepStatus>,
    #[serde(rename = "pericia_liberada")]
    pub exam_cleared: bool,
    #[serde(rename = "financeiro_liberado")]
    pub financial_cleared: bool,
    #[serde(rename = "juridico_liberado")]
    pub legal_cleared: bool,
    pub updated_at: DateTime<Utc>,
}

impl ClientWorkflowStatus {
    /// Compara dois registros ignorando `updated_at`.
    pub fn same_progress(&self, other: &Self) -> bool {
        Self {
            updated_at: other.updated_at,
            ..self.clone()
        } == *other
    }
}
