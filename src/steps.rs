//! As nove etapas do workflow do cliente, cada uma uma função pura.
//!
//! Nenhuma função aqui faz I/O: as leituras condicionais já chegam prontas em
//! [`FollowUpReads`](crate::model::FollowUpReads).

use serde_json::Value;

use crate::matcher::{DocumentCategory, DocumentSignals};
use crate::model::{
    AdmissionRecord, ChecklistRecord, ChecklistStatus, ChecklistSummary, ClaimFiling,
    ClientProfile, ExamRecord, PreviousWorkflow, StepStatus, status_in,
};

/// Fração mínima de perguntas respondidas para considerar o checklist concluído.
pub const CHECKLIST_FILL_THRESHOLD: f64 = 0.8;

/// Sem checklist, esta quantidade de documentos enviados já conta como concluído.
pub const DOCUMENTS_FOR_IMPLICIT_CHECKLIST: usize = 3;

const ADMISSION_DONE: &[&str] = &["concluido", "recebido", "validado"];
const FILING_DONE: &[&str] = &["concluido", "deferido", "pago", "finalizado"];
const EXAM_DONE: &[&str] = &["realizada", "concluida", "concluido"];

pub fn client_registered(client: Option<&ClientProfile>) -> bool {
    client.is_some()
}

/// Um valor conta como preenchido quando não é nulo, texto em branco, lista ou objeto vazio.
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Proporção de perguntas preenchidas. Um checklist sem perguntas tem razão 0.
pub fn fill_ratio(record: &ChecklistRecord) -> f64 {
    let (filled, total) = record
        .question_fields()
        .fold((0usize, 0usize), |(filled, total), (_, value)| {
            (filled + usize::from(is_filled(value)), total + 1)
        });
    if total == 0 {
        0.0
    } else {
        filled as f64 / total as f64
    }
}

/// Checklist marcado como concluído pelo status ou pela data de conclusão.
pub fn checklist_declared_done(summary: &ChecklistSummary) -> bool {
    summary.has_conclusion_date()
        || summary
            .status_text()
            .is_some_and(|s| ChecklistStatus::from(s.to_string()) == ChecklistStatus::Concluido)
}

/// Etapa 2. `full` só é lido quando o checklist existe e não está concluído.
pub fn checklist_status(
    summary: Option<&ChecklistSummary>,
    full: Option<&ChecklistRecord>,
    document_count: usize,
) -> ChecklistStatus {
    let Some(summary) = summary else {
        return if document_count >= DOCUMENTS_FOR_IMPLICIT_CHECKLIST {
            ChecklistStatus::Concluido
        } else {
            ChecklistStatus::Pendente
        };
    };

    if checklist_declared_done(summary) {
        return ChecklistStatus::Concluido;
    }

    let ratio = full.map(fill_ratio).unwrap_or(0.0);
    if ratio >= CHECKLIST_FILL_THRESHOLD {
        return ChecklistStatus::Concluido;
    }
    if ratio > 0.0 {
        return ChecklistStatus::EmPreenchimento;
    }

    // Status desconhecido volta ao registro exatamente como veio.
    match &summary.status {
        Some(declared) if summary.status_text().is_some() => {
            ChecklistStatus::from(declared.clone())
        }
        _ => ChecklistStatus::Pendente,
    }
}

/// Etapa 3: `(bau_acionado, bau_status)`.
///
/// Com registros presentes o BAU já está acionado, então qualquer registro
/// fora do conjunto de concluídos deixa a etapa em andamento.
pub fn admission(
    admissions: &[AdmissionRecord],
    signals: &DocumentSignals,
) -> (bool, Option<StepStatus>) {
    let has_doc = signals.has(DocumentCategory::Admission);
    let requested = !admissions.is_empty() || has_doc;

    let status = if !admissions.is_empty() {
        if admissions.iter().all(|a| status_in(&a.status, ADMISSION_DONE)) {
            Some(StepStatus::Concluido)
        } else {
            Some(StepStatus::EmAndamento)
        }
    } else if has_doc {
        Some(StepStatus::Concluido)
    } else {
        None
    };

    (requested, status)
}

/// Verdadeiro quando o cadastro ou os documentos já comprovam o BO,
/// dispensando a leitura do sub-campo `bo_status` do checklist.
pub fn police_report_settled(client: Option<&ClientProfile>, signals: &DocumentSignals) -> bool {
    client.is_some_and(|c| c.police_report || c.has_police_report_number())
        || signals.has(DocumentCategory::PoliceReport)
}

/// Etapa 4. `checklist_bo` é o sub-campo `bo_status` do checklist, quando lido.
pub fn police_report(
    client: Option<&ClientProfile>,
    signals: &DocumentSignals,
    checklist_bo: Option<&str>,
) -> Option<StepStatus> {
    if police_report_settled(client, signals) {
        return Some(StepStatus::Concluido);
    }
    let answer = checklist_bo
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())?;
    match answer.as_str() {
        "sim_anexado" => Some(StepStatus::Concluido),
        "nao" => None,
        _ => Some(StepStatus::EmAndamento),
    }
}

/// Etapa 5. Única etapa que herda o valor anterior quando não há sinal novo.
pub fn medical_report(
    previous: Option<&PreviousWorkflow>,
    signals: &DocumentSignals,
) -> Option<StepStatus> {
    let base = previous.and_then(|p| p.laudo_status);
    let (reference, diagnosis) = previous
        .map(|p| (p.has_report_reference(), p.has_diagnosis_code()))
        .unwrap_or((false, false));

    match (reference, diagnosis) {
        (true, true) => Some(StepStatus::Concluido),
        (true, false) | (false, true) => Some(StepStatus::EmAndamento),
        (false, false) if signals.has(DocumentCategory::MedicalReport) => {
            Some(StepStatus::Concluido)
        }
        (false, false) => base,
    }
}

/// Etapa 6.
pub fn filing_status(filings: &[ClaimFiling]) -> Option<StepStatus> {
    if filings.is_empty() {
        return None;
    }
    if filings.iter().any(|f| status_in(&f.status, FILING_DONE)) {
        Some(StepStatus::Concluido)
    } else {
        Some(StepStatus::EmAndamento)
    }
}

/// Etapa 7.
pub fn exam_cleared(exams: &[ExamRecord]) -> bool {
    exams.iter().any(|e| status_in(&e.status, EXAM_DONE))
}

/// Etapa 8.
pub fn financial_cleared(has_financial_entry: bool, signals: &DocumentSignals) -> bool {
    has_financial_entry || signals.has(DocumentCategory::BankAccount)
}

/// Etapa 9.
pub fn legal_cleared(judicial_filings: usize) -> bool {
    judicial_filings > 0
}
