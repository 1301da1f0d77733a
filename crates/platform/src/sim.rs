//! In-process gateway backend.
//!
//! Backs the test suites and the `--sim` development mode with a fully
//! in-memory platform: communities, categories, channels, and membership
//! live in a single state table. Operations on channels marked as failing
//! return an external error, which is how the services' failure isolation
//! is exercised.

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::atomic::{AtomicU64, Ordering},
};

use {async_trait::async_trait, rand::Rng, tokio::sync::Mutex};

use crate::{
    command::CommandSpec,
    error::{Error, Result},
    gateway::CommunityGateway,
    types::{
        CategoryId, CategoryRef, ChannelId, ChannelRef, CommunityId, MemberRecord,
        PermissionPolicy, PresenceStatus,
    },
};

#[derive(Debug, Default)]
struct SimCommunity {
    label: String,
    members: Vec<MemberRecord>,
    /// category id -> name
    categories: HashMap<CategoryId, String>,
    /// channel id -> (name, parent category)
    channels: HashMap<ChannelId, (String, CategoryId)>,
}

#[derive(Debug, Default)]
struct SimState {
    communities: HashMap<CommunityId, SimCommunity>,
    /// Channels whose rename/delete operations fail.
    failing: HashSet<ChannelId>,
    rename_calls: Vec<(ChannelId, String)>,
    delete_calls: Vec<ChannelId>,
    fetch_calls: usize,
    registered_commands: Vec<String>,
}

/// In-memory [`CommunityGateway`] implementation.
#[derive(Debug, Default)]
pub struct SimGateway {
    state: Mutex<SimState>,
    next_id: AtomicU64,
}

impl SimGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway pre-seeded with one small community, for `--sim` runs.
    pub async fn demo() -> Self {
        let gw = Self::new();
        gw.add_community("sim-1", "Demo Community").await;
        gw.set_members("sim-1", vec![
            MemberRecord::human().with_presence(PresenceStatus::Online),
            MemberRecord::human()
                .with_roles(3)
                .with_presence(PresenceStatus::Idle),
            MemberRecord::human(),
            MemberRecord::bot().with_presence(PresenceStatus::Online),
        ])
        .await;
        gw
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }

    // ── Seeding and inspection helpers ──────────────────────────────────

    pub async fn add_community(&self, id: impl Into<CommunityId>, label: &str) {
        let mut state = self.state.lock().await;
        state.communities.insert(id.into(), SimCommunity {
            label: label.to_string(),
            ..SimCommunity::default()
        });
    }

    pub async fn set_members(&self, id: impl Into<CommunityId>, members: Vec<MemberRecord>) {
        let mut state = self.state.lock().await;
        if let Some(community) = state.communities.get_mut(&id.into()) {
            community.members = members;
        }
    }

    /// Seed a channel under an existing category with a fixed id.
    pub async fn insert_channel(
        &self,
        community: impl Into<CommunityId>,
        channel: ChannelId,
        name: &str,
        parent: CategoryId,
    ) {
        let mut state = self.state.lock().await;
        if let Some(c) = state.communities.get_mut(&community.into()) {
            c.channels.insert(channel, (name.to_string(), parent));
        }
    }

    /// Simulate an out-of-band channel deletion.
    pub async fn drop_channel(&self, channel: &ChannelId) {
        let mut state = self.state.lock().await;
        for community in state.communities.values_mut() {
            community.channels.remove(channel);
        }
    }

    /// Make rename/delete operations on a channel fail.
    pub async fn fail_channel(&self, channel: &ChannelId) {
        self.state.lock().await.failing.insert(channel.clone());
    }

    pub async fn channel_name(&self, channel: &ChannelId) -> Option<String> {
        let state = self.state.lock().await;
        state
            .communities
            .values()
            .find_map(|c| c.channels.get(channel).map(|(name, _)| name.clone()))
    }

    pub async fn has_category(&self, category: &CategoryId) -> bool {
        let state = self.state.lock().await;
        state
            .communities
            .values()
            .any(|c| c.categories.contains_key(category))
    }

    pub async fn rename_calls(&self) -> Vec<(ChannelId, String)> {
        self.state.lock().await.rename_calls.clone()
    }

    pub async fn delete_calls(&self) -> Vec<ChannelId> {
        self.state.lock().await.delete_calls.clone()
    }

    pub async fn fetch_calls(&self) -> usize {
        self.state.lock().await.fetch_calls
    }

    pub async fn registered_commands(&self) -> Vec<String> {
        self.state.lock().await.registered_commands.clone()
    }

    pub async fn clear_calls(&self) {
        let mut state = self.state.lock().await;
        state.rename_calls.clear();
        state.delete_calls.clear();
        state.fetch_calls = 0;
    }

    /// Flip one random member's presence. Returns the touched community,
    /// so the caller can emit a presence event for it.
    pub async fn churn(&self) -> Option<CommunityId> {
        let mut state = self.state.lock().await;
        if state.communities.is_empty() {
            return None;
        }
        let mut rng = rand::rng();
        let id = {
            let ids: Vec<_> = state.communities.keys().cloned().collect();
            ids[rng.random_range(0..ids.len())].clone()
        };
        let community = state.communities.get_mut(&id)?;
        if community.members.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..community.members.len());
        let member = &mut community.members[idx];
        member.presence = match member.presence {
            Some(PresenceStatus::Offline) | None => Some(PresenceStatus::Online),
            Some(_) => Some(PresenceStatus::Offline),
        };
        Some(id)
    }

    fn external(context: &str) -> Error {
        Error::external(context.to_string(), io::Error::other("simulated platform failure"))
    }
}

#[async_trait]
impl CommunityGateway for SimGateway {
    async fn fetch_membership(&self, community: &CommunityId) -> Result<Vec<MemberRecord>> {
        let mut state = self.state.lock().await;
        state.fetch_calls += 1;
        state
            .communities
            .get(community)
            .map(|c| c.members.clone())
            .ok_or_else(|| Error::unknown_community(community))
    }

    async fn find_category(
        &self,
        community: &CommunityId,
        name: &str,
    ) -> Result<Option<CategoryRef>> {
        let state = self.state.lock().await;
        let c = state
            .communities
            .get(community)
            .ok_or_else(|| Error::unknown_community(community))?;
        Ok(c.categories
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, n)| CategoryRef {
                id: id.clone(),
                community: community.clone(),
                name: n.clone(),
            }))
    }

    async fn create_category(
        &self,
        community: &CommunityId,
        name: &str,
        _policy: &PermissionPolicy,
    ) -> Result<CategoryRef> {
        let id = CategoryId::new(self.fresh_id("cat"));
        let mut state = self.state.lock().await;
        let c = state
            .communities
            .get_mut(community)
            .ok_or_else(|| Error::unknown_community(community))?;
        c.categories.insert(id.clone(), name.to_string());
        Ok(CategoryRef {
            id,
            community: community.clone(),
            name: name.to_string(),
        })
    }

    async fn create_voice_channel(
        &self,
        community: &CommunityId,
        name: &str,
        parent: &CategoryId,
        _policy: &PermissionPolicy,
    ) -> Result<ChannelRef> {
        let id = ChannelId::new(self.fresh_id("chan"));
        let mut state = self.state.lock().await;
        let c = state
            .communities
            .get_mut(community)
            .ok_or_else(|| Error::unknown_community(community))?;
        if !c.categories.contains_key(parent) {
            return Err(Self::external("create channel: parent category missing"));
        }
        c.channels
            .insert(id.clone(), (name.to_string(), parent.clone()));
        Ok(ChannelRef {
            id,
            community: community.clone(),
            name: name.to_string(),
        })
    }

    async fn get_channel(
        &self,
        community: &CommunityId,
        channel: &ChannelId,
    ) -> Result<Option<ChannelRef>> {
        let state = self.state.lock().await;
        let c = state
            .communities
            .get(community)
            .ok_or_else(|| Error::unknown_community(community))?;
        Ok(c.channels.get(channel).map(|(name, _)| ChannelRef {
            id: channel.clone(),
            community: community.clone(),
            name: name.clone(),
        }))
    }

    async fn get_category(
        &self,
        community: &CommunityId,
        category: &CategoryId,
    ) -> Result<Option<CategoryRef>> {
        let state = self.state.lock().await;
        let c = state
            .communities
            .get(community)
            .ok_or_else(|| Error::unknown_community(community))?;
        Ok(c.categories.get(category).map(|name| CategoryRef {
            id: category.clone(),
            community: community.clone(),
            name: name.clone(),
        }))
    }

    async fn rename_channel(&self, channel: &ChannelRef, new_name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing.contains(&channel.id) {
            return Err(Self::external("rename channel"));
        }
        state
            .rename_calls
            .push((channel.id.clone(), new_name.to_string()));
        for community in state.communities.values_mut() {
            if let Some((name, _)) = community.channels.get_mut(&channel.id) {
                *name = new_name.to_string();
                return Ok(());
            }
        }
        Err(Self::external("rename channel: not found"))
    }

    async fn delete_channel(&self, channel: &ChannelRef) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing.contains(&channel.id) {
            return Err(Self::external("delete channel"));
        }
        state.delete_calls.push(channel.id.clone());
        for community in state.communities.values_mut() {
            if community.channels.remove(&channel.id).is_some() {
                return Ok(());
            }
        }
        Err(Self::external("delete channel: not found"))
    }

    async fn delete_category(&self, category: &CategoryRef) -> Result<()> {
        let mut state = self.state.lock().await;
        for community in state.communities.values_mut() {
            if community.categories.remove(&category.id).is_some() {
                return Ok(());
            }
        }
        Err(Self::external("delete category: not found"))
    }

    async fn child_count(&self, category: &CategoryRef) -> Result<usize> {
        let state = self.state.lock().await;
        Ok(state
            .communities
            .values()
            .map(|c| {
                c.channels
                    .values()
                    .filter(|(_, parent)| *parent == category.id)
                    .count()
            })
            .sum())
    }

    async fn community_label(&self, community: &CommunityId) -> Option<String> {
        let state = self.state.lock().await;
        state.communities.get(community).map(|c| c.label.clone())
    }

    async fn register_commands(&self, specs: &[CommandSpec]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.registered_commands = specs.iter().map(|s| s.name.to_string()).collect();
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find_category() {
        let gw = SimGateway::new();
        gw.add_community("c1", "Test").await;
        let community = CommunityId::new("c1");

        assert!(gw.find_category(&community, "Stats").await.unwrap().is_none());
        let cat = gw
            .create_category(&community, "Stats", &PermissionPolicy::DenyConnect)
            .await
            .unwrap();
        let found = gw.find_category(&community, "Stats").await.unwrap().unwrap();
        assert_eq!(found.id, cat.id);
        // Exact match only.
        assert!(gw.find_category(&community, "stats").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rename_records_call_and_updates_name() {
        let gw = SimGateway::new();
        gw.add_community("c1", "Test").await;
        let community = CommunityId::new("c1");
        let cat = gw
            .create_category(&community, "Stats", &PermissionPolicy::DenyConnect)
            .await
            .unwrap();
        let chan = gw
            .create_voice_channel(&community, "Total Members: 1", &cat.id, &PermissionPolicy::DenyConnect)
            .await
            .unwrap();

        gw.rename_channel(&chan, "Total Members: 2").await.unwrap();
        assert_eq!(gw.channel_name(&chan.id).await.unwrap(), "Total Members: 2");
        assert_eq!(gw.rename_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_channel_errors() {
        let gw = SimGateway::new();
        gw.add_community("c1", "Test").await;
        let community = CommunityId::new("c1");
        let cat = gw
            .create_category(&community, "Stats", &PermissionPolicy::DenyConnect)
            .await
            .unwrap();
        let chan = gw
            .create_voice_channel(&community, "Bots: 0", &cat.id, &PermissionPolicy::DenyConnect)
            .await
            .unwrap();
        gw.fail_channel(&chan.id).await;

        assert!(gw.rename_channel(&chan, "Bots: 1").await.is_err());
        assert!(gw.delete_channel(&chan).await.is_err());
        // Failed operations are not recorded as calls.
        assert!(gw.rename_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_child_count_tracks_deletions() {
        let gw = SimGateway::new();
        gw.add_community("c1", "Test").await;
        let community = CommunityId::new("c1");
        let cat = gw
            .create_category(&community, "Stats", &PermissionPolicy::DenyConnect)
            .await
            .unwrap();
        let chan = gw
            .create_voice_channel(&community, "Bots: 0", &cat.id, &PermissionPolicy::DenyConnect)
            .await
            .unwrap();
        assert_eq!(gw.child_count(&cat).await.unwrap(), 1);
        gw.delete_channel(&chan).await.unwrap();
        assert_eq!(gw.child_count(&cat).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_community() {
        let gw = SimGateway::new();
        let err = gw.fetch_membership(&CommunityId::new("nope")).await;
        assert!(matches!(err, Err(Error::UnknownCommunity { .. })));
    }
}
