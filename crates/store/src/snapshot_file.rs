//! JSON file-backed snapshot store with atomic writes.

use std::path::PathBuf;

use {async_trait::async_trait, serde_json::Value, tokio::fs};

use crate::{
    error::{Error, Result},
    snapshot::SnapshotStore,
};

/// File-backed snapshot. The whole document lives in a single JSON file.
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Snapshot at the default `~/.headcount/counters.json` location.
    pub fn default_path() -> Result<Self> {
        let home = dirs_next::home_dir().ok_or_else(|| {
            Error::Io(std::io::Error::other("cannot determine home directory"))
        })?;
        Ok(Self::new(home.join(".headcount").join("counters.json")))
    }

    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Atomic write: write to temp, rename over target, keep `.bak`.
    async fn atomic_write(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json.as_bytes()).await?;

        // Backup existing file.
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            let _ = fs::rename(&self.path, &bak).await;
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshot {
    async fn load(&self) -> Result<Option<Value>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    async fn save(&self, document: &Value) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        self.atomic_write(&json).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {serde_json::json, tempfile::TempDir};

    use super::*;

    fn make_snapshot(dir: &TempDir) -> FileSnapshot {
        FileSnapshot::new(dir.path().join("counters.json"))
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let snap = make_snapshot(&tmp);
        assert!(snap.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let snap = make_snapshot(&tmp);

        let doc = json!({ "c1": { "label": "Test", "configs": [] } });
        snap.save(&doc).await.unwrap();
        assert_eq!(snap.load().await.unwrap().unwrap(), doc);
    }

    #[tokio::test]
    async fn test_backup_kept_on_rewrite() {
        let tmp = TempDir::new().unwrap();
        let snap = make_snapshot(&tmp);

        snap.save(&json!({ "v": 1 })).await.unwrap();
        snap.save(&json!({ "v": 2 })).await.unwrap();

        let bak = tmp.path().join("counters.json.bak");
        assert!(bak.exists());
        let backup: Value =
            serde_json::from_str(&std::fs::read_to_string(&bak).unwrap()).unwrap();
        assert_eq!(backup, json!({ "v": 1 }));
    }

    #[tokio::test]
    async fn test_load_corrupt_file_errors() {
        let tmp = TempDir::new().unwrap();
        let snap = make_snapshot(&tmp);
        std::fs::write(snap.path(), "{not json").unwrap();
        assert!(snap.load().await.is_err());
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let snap = FileSnapshot::new(tmp.path().join("nested").join("counters.json"));
        snap.save(&json!({})).await.unwrap();
        assert!(snap.load().await.unwrap().is_some());
    }
}
