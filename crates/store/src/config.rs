//! In-memory index of provisioned counters, keyed by community.

use std::collections::HashMap;

use {
    headcount_counters::CounterKind,
    headcount_platform::{CategoryId, ChannelId, CommunityId},
    serde::{Deserialize, Serialize},
    tokio::sync::RwLock,
    tracing::warn,
};

use crate::snapshot::SnapshotStore;

/// One provisioned counter. Never mutated in place; the channel's displayed
/// name is the only externally mutable projection derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterConfig {
    pub channel_id: ChannelId,
    pub kind: CounterKind,
    pub category_id: CategoryId,
}

/// Mapping from community to its provisioned counters.
///
/// A community with no entry and a community mapped to an empty sequence
/// both read as "no counters". Insertion order within a community is
/// preserved. The store does not deduplicate channel ids; provisioning
/// upholds uniqueness by always creating a fresh channel.
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: RwLock<HashMap<CommunityId, Vec<CounterConfig>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot backend. A missing or unreadable
    /// snapshot yields an empty store; never an error.
    pub async fn load_from(snapshot: &dyn SnapshotStore) -> Self {
        let store = Self::new();
        match snapshot.load().await {
            Ok(Some(document)) => {
                let decoded = crate::codec::decode(&document);
                let mut entries = store.entries.write().await;
                for (community, configs) in decoded {
                    entries.insert(community, configs);
                }
            },
            Ok(None) => {},
            Err(e) => warn!(error = %e, "failed to load counter snapshot, starting empty"),
        }
        store
    }

    /// Counters for one community. `None` when it has none.
    pub async fn get(&self, community: &CommunityId) -> Option<Vec<CounterConfig>> {
        let entries = self.entries.read().await;
        entries.get(community).filter(|c| !c.is_empty()).cloned()
    }

    /// Append a counter, creating the community entry if absent.
    pub async fn add(&self, community: &CommunityId, config: CounterConfig) {
        let mut entries = self.entries.write().await;
        entries.entry(community.clone()).or_default().push(config);
    }

    /// Remove the community entry entirely. Returns the configs that were
    /// present.
    pub async fn clear(&self, community: &CommunityId) -> Vec<CounterConfig> {
        let mut entries = self.entries.write().await;
        entries.remove(community).unwrap_or_default()
    }

    /// Remove a single counter by channel id. Returns whether anything was
    /// removed. Used when a channel has been gone long enough to prune.
    pub async fn remove_channel(&self, community: &CommunityId, channel: &ChannelId) -> bool {
        let mut entries = self.entries.write().await;
        let Some(configs) = entries.get_mut(community) else {
            return false;
        };
        let before = configs.len();
        configs.retain(|c| c.channel_id != *channel);
        let removed = configs.len() != before;
        if configs.is_empty() {
            entries.remove(community);
        }
        removed
    }

    /// All communities with their counters, sorted by community id so
    /// snapshots serialize deterministically.
    pub async fn all_entries(&self) -> Vec<(CommunityId, Vec<CounterConfig>)> {
        let entries = self.entries.read().await;
        let mut all: Vec<_> = entries
            .iter()
            .map(|(community, configs)| (community.clone(), configs.clone()))
            .collect();
        all.sort_by(|(a, _), (b, _)| a.cmp(b));
        all
    }

    /// Number of communities with at least one counter.
    pub async fn community_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|c| !c.is_empty()).count()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config(channel: &str) -> CounterConfig {
        CounterConfig {
            channel_id: ChannelId::new(channel),
            kind: CounterKind::Members,
            category_id: CategoryId::new("cat-1"),
        }
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let store = ConfigStore::new();
        let community = CommunityId::new("c1");
        store.add(&community, config("a")).await;
        store.add(&community, config("b")).await;
        store.add(&community, config("c")).await;

        let configs = store.get(&community).await.unwrap();
        let ids: Vec<_> = configs.iter().map(|c| c.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_get_absent_community() {
        let store = ConfigStore::new();
        assert!(store.get(&CommunityId::new("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let store = ConfigStore::new();
        let community = CommunityId::new("c1");
        store.add(&community, config("a")).await;

        let cleared = store.clear(&community).await;
        assert_eq!(cleared.len(), 1);
        assert!(store.get(&community).await.is_none());
        assert_eq!(store.community_count().await, 0);
    }

    #[tokio::test]
    async fn test_clear_empty_community_is_noop() {
        let store = ConfigStore::new();
        assert!(store.clear(&CommunityId::new("c1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_channel() {
        let store = ConfigStore::new();
        let community = CommunityId::new("c1");
        store.add(&community, config("a")).await;
        store.add(&community, config("b")).await;

        assert!(store.remove_channel(&community, &ChannelId::new("a")).await);
        assert!(!store.remove_channel(&community, &ChannelId::new("a")).await);
        let configs = store.get(&community).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].channel_id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_remove_last_channel_drops_community() {
        let store = ConfigStore::new();
        let community = CommunityId::new("c1");
        store.add(&community, config("a")).await;

        store.remove_channel(&community, &ChannelId::new("a")).await;
        assert!(store.get(&community).await.is_none());
        assert_eq!(store.community_count().await, 0);
    }

    #[tokio::test]
    async fn test_all_entries_sorted() {
        let store = ConfigStore::new();
        store.add(&CommunityId::new("zz"), config("a")).await;
        store.add(&CommunityId::new("aa"), config("b")).await;

        let entries = store.all_entries().await;
        assert_eq!(entries[0].0.as_str(), "aa");
        assert_eq!(entries[1].0.as_str(), "zz");
    }

    #[tokio::test]
    async fn test_load_from_snapshot() {
        let snap = crate::MemorySnapshot::with_document(serde_json::json!({
            "c1": { "label": "First", "configs": [
                { "channelId": "ch-1", "kind": "members", "categoryId": "cat-1" }
            ]},
            "c2": [
                { "channelId": "ch-2", "kind": "bots", "categoryId": "cat-2" }
            ]
        }));
        let store = ConfigStore::load_from(&snap).await;
        assert_eq!(store.community_count().await, 2);
        let c2 = store.get(&CommunityId::new("c2")).await.unwrap();
        assert_eq!(c2[0].kind, CounterKind::Bots);
    }

    #[tokio::test]
    async fn test_load_from_failing_snapshot_yields_empty_store() {
        let snap = crate::MemorySnapshot::new();
        snap.set_failing(true);
        let store = ConfigStore::load_from(&snap).await;
        assert_eq!(store.community_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_channel_ids_not_deduplicated() {
        let store = ConfigStore::new();
        let community = CommunityId::new("c1");
        store.add(&community, config("a")).await;
        store.add(&community, config("a")).await;
        assert_eq!(store.get(&community).await.unwrap().len(), 2);
    }
}
