//! Counter set-up and teardown.

use std::sync::Arc;

use {
    headcount_counters::{CounterKind, evaluate, target_name},
    headcount_platform::{CommunityGateway, CommunityId, PermissionPolicy},
    headcount_store::{ConfigStore, CounterConfig, SnapshotStore},
    tracing::{debug, info, warn},
};

use crate::{error::Result, persist::persist_best_effort};

/// Outcome of a teardown. Zero counts on a community without counters is
/// the normal "nothing to reset" case, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Creates counters (category + restricted voice channel) and tears them
/// down again.
pub struct ProvisionService {
    gateway: Arc<dyn CommunityGateway>,
    store: Arc<ConfigStore>,
    snapshot: Arc<dyn SnapshotStore>,
}

impl ProvisionService {
    pub fn new(
        gateway: Arc<dyn CommunityGateway>,
        store: Arc<ConfigStore>,
        snapshot: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            gateway,
            store,
            snapshot,
        }
    }

    /// Provision one counter: reuse or create the category, create a fresh
    /// voice channel named for the current count, record the config, and
    /// persist. An external failure aborts before the store is touched;
    /// the caller reports it and must not retry automatically.
    pub async fn set_up(
        &self,
        community: &CommunityId,
        kind: CounterKind,
        category_name: &str,
    ) -> Result<CounterConfig> {
        let policy = PermissionPolicy::DenyConnect;

        let category = match self.gateway.find_category(community, category_name).await? {
            Some(category) => category,
            None => {
                self.gateway
                    .create_category(community, category_name, &policy)
                    .await?
            },
        };

        let members = self.gateway.fetch_membership(community).await?;
        let name = target_name(kind, evaluate(kind, &members));
        let channel = self
            .gateway
            .create_voice_channel(community, &name, &category.id, &policy)
            .await?;

        let config = CounterConfig {
            channel_id: channel.id,
            kind,
            category_id: category.id,
        };
        self.store.add(community, config.clone()).await;
        persist_best_effort(&self.store, self.gateway.as_ref(), self.snapshot.as_ref()).await;

        info!(
            community = %community,
            kind = %kind,
            channel = %config.channel_id,
            "counter provisioned"
        );
        Ok(config)
    }

    /// Tear down every counter of a community. Per-channel failures are
    /// counted and isolated; the store entry is cleared unconditionally so
    /// it never keeps referencing channels the operator believes are gone.
    pub async fn tear_down(&self, community: &CommunityId) -> Result<TeardownReport> {
        let Some(configs) = self.store.get(community).await else {
            debug!(community = %community, "nothing to reset");
            return Ok(TeardownReport::default());
        };

        let mut report = TeardownReport::default();
        for config in &configs {
            match self.gateway.get_channel(community, &config.channel_id).await {
                Ok(Some(channel)) => match self.gateway.delete_channel(&channel).await {
                    Ok(()) => report.deleted += 1,
                    Err(e) => {
                        report.failed += 1;
                        warn!(
                            channel = %config.channel_id,
                            error = %e,
                            "failed to delete counter channel"
                        );
                    },
                },
                Ok(None) => {
                    debug!(channel = %config.channel_id, "counter channel already gone");
                },
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        channel = %config.channel_id,
                        error = %e,
                        "failed to look up counter channel"
                    );
                },
            }

            // Category cleanup is independent and best effort: only when it
            // still exists and has no children left.
            if let Ok(Some(category)) =
                self.gateway.get_category(community, &config.category_id).await
            {
                let empty = matches!(self.gateway.child_count(&category).await, Ok(0));
                if empty && let Err(e) = self.gateway.delete_category(&category).await {
                    warn!(
                        category = %config.category_id,
                        error = %e,
                        "failed to delete counter category"
                    );
                }
            }
        }

        self.store.clear(community).await;
        persist_best_effort(&self.store, self.gateway.as_ref(), self.snapshot.as_ref()).await;

        info!(
            community = %community,
            deleted = report.deleted,
            failed = report.failed,
            "counters torn down"
        );
        Ok(report)
    }
}
