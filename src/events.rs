//! Aviso de recálculo para as camadas que mantêm cache das telas do cliente.
//!
//! O motor publica um [`WorkflowEvent`] no [`EventBus`] depois de gravar
//! com sucesso. A entrega é best-effort: sem assinantes o evento é descartado.

use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// Visões em cache que dependem do registro de workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKey {
    ClientWorkflow,
    ClientChecklist,
}

impl CacheKey {
    /// As duas visões invalidadas a cada recálculo.
    pub const STALE_AFTER_RECALCULATION: [CacheKey; 2] =
        [CacheKey::ClientWorkflow, CacheKey::ClientChecklist];
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::ClientWorkflow => write!(f, "client-workflow"),
            CacheKey::ClientChecklist => write!(f, "client-checklist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Recalculated {
        client_id: String,
        invalidated: [CacheKey; 2],
    },
}

impl WorkflowEvent {
    pub fn recalculated(client_id: &str) -> Self {
        WorkflowEvent::Recalculated {
            client_id: client_id.to_string(),
            invalidated: CacheKey::STALE_AFTER_RECALCULATION,
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            WorkflowEvent::Recalculated { client_id, .. } => client_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Publica o evento e devolve quantos assinantes o receberam.
    pub fn publish(&self, event: WorkflowEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!(client_id = event.client_id(), "no cache subscribers");
                0
            }
        }
    }
}
