use {async_trait::async_trait, serde_json::Value};

use crate::error::Result;

/// Durable storage for the snapshot document.
///
/// One process owns the snapshot, so saves are exclusive full overwrites;
/// no read-modify-write and no file locking.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the raw snapshot document. `Ok(None)` when no snapshot exists
    /// yet; a parse or read failure is an error the caller may tolerate.
    async fn load(&self) -> Result<Option<Value>>;

    /// Replace the snapshot with `document`.
    async fn save(&self, document: &Value) -> Result<()>;
}
