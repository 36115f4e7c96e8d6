mod sources;
mod status;

pub use sources::{
    AdmissionRecord, CHECKLIST_META_FIELDS, ChecklistRecord, ChecklistSummary, ClaimFiling,
    ClientProfile, DocumentRef, ExamRecord, FollowUpReads, PreviousWorkflow, SourceSnapshot,
    status_in,
};
pub use status::{ChecklistStatus, ClientWorkflowStatus, StepStatus};
