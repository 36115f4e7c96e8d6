use chrono::{DateTime, Utc};

use crate::matcher::DocumentSignals;
use crate::model::{ClientWorkflowStatus, FollowUpReads, SourceSnapshot};
use crate::steps;

/// Monta o registro de workflow a partir das leituras e dos sinais dos documentos.
pub fn build_record(
    client_id: &str,
    snapshot: &SourceSnapshot,
    follow_up: &FollowUpReads,
    signals: &DocumentSignals,
    now: DateTime<Utc>,
) -> ClientWorkflowStatus {
    let (admission_requested, admission_status) = steps::admission(&snapshot.admissions, signals);

    ClientWorkflowStatus {
        client_id: client_id.to_string(),
        client_registered: steps::client_registered(snapshot.client.as_ref()),
        checklist_status: steps::checklist_status(
            snapshot.checklist.as_ref(),
            follow_up.full_checklist.as_ref(),
            snapshot.documents.len(),
        ),
        admission_requested,
        admission_status,
        police_report_status: steps::police_report(
            snapshot.client.as_ref(),
            signals,
            follow_up.checklist_bo_status.as_deref(),
        ),
        medical_report_status: steps::medical_report(snapshot.previous.as_ref(), signals),
        filing_status: steps::filing_status(&snapshot.filings),
        exam_cleared: steps::exam_cleared(&snapshot.exams),
        financial_cleared: steps::financial_cleared(snapshot.has_financial_entry, signals),
        legal_cleared: steps::legal_cleared(follow_up.judicial_filings),
        updated_at: now,
    }
}
