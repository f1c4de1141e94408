pub mod audit_models;
mod audit_service;
mod audit_store;

pub use audit_models::{
    field_diff, DeletedKind, DeletionLogEntry, EventAction, EventLogEntry, LogKind, LogQuery,
    RewardAction, RewardLogEntry,
};
pub use audit_service::{AuditError, AuditService};
pub use audit_store::AuditStore;
