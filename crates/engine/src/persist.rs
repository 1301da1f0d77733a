//! Snapshot persistence glue.

use std::collections::HashMap;

use {
    headcount_platform::CommunityGateway,
    headcount_store::{ConfigStore, SnapshotStore, codec},
    tracing::warn,
};

/// Serialize the store and write it through the snapshot backend. Labels
/// are resolved through the gateway; an unresolvable label never blocks
/// persistence.
pub async fn persist_snapshot(
    store: &ConfigStore,
    gateway: &dyn CommunityGateway,
    snapshot: &dyn SnapshotStore,
) -> headcount_store::Result<()> {
    let entries = store.all_entries().await;
    let mut labels = HashMap::new();
    for (community, _) in &entries {
        if let Some(label) = gateway.community_label(community).await {
            labels.insert(community.clone(), label);
        }
    }
    let document = codec::encode(&entries, |community| labels.get(community).cloned());
    snapshot.save(&document).await
}

/// Persist and log on failure. A persistence problem never aborts the
/// operation that triggered it.
pub async fn persist_best_effort(
    store: &ConfigStore,
    gateway: &dyn CommunityGateway,
    snapshot: &dyn SnapshotStore,
) {
    if let Err(e) = persist_snapshot(store, gateway, snapshot).await {
        warn!(error = %e, "failed to persist counter snapshot");
    }
}
