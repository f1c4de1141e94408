// Shared storage primitives used by every store trait in the core.
//
// The core never touches the filesystem directly; infra implements the
// store traits and reports failures through `StoreError`.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Record already exists: {0}")]
    Duplicate(String),
    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Process-wide gate that serializes read-modify-write cycles.
///
/// Every JSON store guards its own file, but a command usually reads a record,
/// changes it and writes it back. Holding the gate across that cycle keeps two
/// concurrent commands from overwriting each other's changes. Cloning shares
/// the same gate.
#[derive(Clone, Default)]
pub struct WriteGate {
    inner: Arc<Mutex<()>>,
}

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enter(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }
}
