//! In-memory snapshot store for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use {async_trait::async_trait, serde_json::Value, tokio::sync::Mutex};

use crate::{
    error::{Error, Result},
    snapshot::SnapshotStore,
};

/// Snapshot store that keeps the document in memory. `set_failing` makes
/// subsequent saves error, for exercising persistence-failure tolerance.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    document: Mutex<Option<Value>>,
    failing: AtomicBool,
    save_count: AtomicUsize,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document, as if loaded from disk.
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub async fn document(&self) -> Option<Value> {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshot {
    async fn load(&self) -> Result<Option<Value>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("simulated load failure")));
        }
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &Value) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("simulated save failure")));
        }
        self.save_count.fetch_add(1, Ordering::SeqCst);
        *self.document.lock().await = Some(document.clone());
        Ok(())
    }
}
