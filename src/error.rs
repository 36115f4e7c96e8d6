use std::fmt;

use thiserror::Error;

/// Coleção de origem de uma leitura, usada para identificar a falha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Checklist,
    Admissions,
    ClaimFilings,
    Exams,
    FinancialEntries,
    Workflow,
    Client,
    Documents,
    JudicialFilings,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Checklist => "checklist",
            Collection::Admissions => "admissions",
            Collection::ClaimFilings => "claim filings",
            Collection::Exams => "exams",
            Collection::FinancialEntries => "financial entries",
            Collection::Workflow => "workflow status",
            Collection::Client => "client profile",
            Collection::Documents => "documents",
            Collection::JudicialFilings => "judicial filings",
        };
        f.write_str(name)
    }
}

/// Falhas reportadas pelos adaptadores de armazenamento.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode {collection} response: {message}")]
    Decode {
        collection: Collection,
        message: String,
    },

    #[error("{0} unavailable")]
    Unavailable(Collection),
}

/// Resultado explícito de uma recalculação que não chegou ao fim.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Client id must not be empty")]
    InvalidClientId,

    /// Alguma leitura falhou; nada foi gravado.
    #[error("Read from {collection} failed: {cause}")]
    Read {
        collection: Collection,
        #[source]
        cause: StoreError,
    },

    /// A gravação falhou; o registro anterior (ou a ausência dele) permanece.
    #[error("Workflow write failed: {0}")]
    Write(#[source] StoreError),

    #[error("Recalculation task failed: {0}")]
    Task(String),
}

impl EngineError {
    pub fn read(collection: Collection) -> impl FnOnce(StoreError) -> Self {
        move |cause| EngineError::Read { collection, cause }
    }
}
