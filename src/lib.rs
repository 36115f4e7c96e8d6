//! Motor de inferência do status de workflow de clientes.
//!
//! Dado um id de cliente, [`WorkflowEngine::recalculate`] lê as coleções de
//! origem, aplica as nove etapas de [`steps`] e grava um único registro
//! [`ClientWorkflowStatus`] por cliente, avisando as visões em cache depois.

pub mod builder;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod matcher;
pub mod model;
pub mod steps;
pub mod store;
pub mod ui;

pub use engine::{Recalculation, WorkflowEngine, WriteKind};
pub use error::{Collection, EngineError, StoreError};
pub use events::{CacheKey, EventBus, WorkflowEvent};
pub use model::ClientWorkflowStatus;
