//! The reconciliation engine: periodic full sweep and debounced partial
//! sweep over the same core routine.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use {
    headcount_counters::{evaluate, target_name},
    headcount_platform::{ChannelId, CommunityGateway, CommunityId},
    headcount_store::{ConfigStore, CounterConfig, SnapshotStore},
    serde::Serialize,
    tokio::{
        sync::{Mutex, Notify, RwLock},
        task::JoinHandle,
    },
    tracing::{debug, info, warn},
};

use crate::persist::persist_best_effort;

/// Outcome of one counter during a sweep. Failed and skipped entries get
/// no in-sweep retry; the next sweep picks them up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SweepOutcome {
    /// Channel no longer exists externally.
    Skipped,
    /// Target name matches the current name; no write issued.
    Unchanged,
    /// Channel renamed to the new target name.
    Updated,
    /// An external call failed; logged and isolated.
    Failed,
}

/// Tuning knobs for the reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Interval between full sweeps over every community.
    pub sweep_interval: Duration,
    /// Delay between a membership/presence event and the partial sweep it
    /// schedules. Triggers inside the window coalesce into one sweep.
    pub debounce_delay: Duration,
    /// Consecutive sweeps a channel may be missing before its config is
    /// pruned from the store.
    pub prune_after_misses: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            debounce_delay: Duration::from_secs(1),
            prune_after_misses: 3,
        }
    }
}

/// Keeps counter channel names in step with live membership.
pub struct ReconcileService {
    gateway: Arc<dyn CommunityGateway>,
    store: Arc<ConfigStore>,
    snapshot: Arc<dyn SnapshotStore>,
    config: ReconcileConfig,
    /// Communities with a debounce task already scheduled.
    pending: Mutex<HashSet<CommunityId>>,
    /// Consecutive missing-channel sightings per channel.
    misses: Mutex<HashMap<ChannelId, u32>>,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
    wake: Arc<Notify>,
    running: RwLock<bool>,
}

impl ReconcileService {
    pub fn new(
        gateway: Arc<dyn CommunityGateway>,
        store: Arc<ConfigStore>,
        snapshot: Arc<dyn SnapshotStore>,
    ) -> Arc<Self> {
        Self::with_config(gateway, store, snapshot, ReconcileConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn CommunityGateway>,
        store: Arc<ConfigStore>,
        snapshot: Arc<dyn SnapshotStore>,
        config: ReconcileConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            store,
            snapshot,
            config,
            pending: Mutex::new(HashSet::new()),
            misses: Mutex::new(HashMap::new()),
            timer_handle: Mutex::new(None),
            wake: Arc::new(Notify::new()),
            running: RwLock::new(false),
        })
    }

    /// Start the full-sweep timer loop. The first sweep runs immediately,
    /// bringing counters current after a restart.
    pub async fn start(self: &Arc<Self>) {
        *self.running.write().await = true;

        let svc = Arc::clone(self);
        let handle = tokio::spawn(async move {
            svc.sweep_loop().await;
        });
        *self.timer_handle.lock().await = Some(handle);
        info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            "reconcile service started"
        );
    }

    /// Stop the timer loop.
    pub async fn stop(&self) {
        *self.running.write().await = false;
        self.wake.notify_one();

        let mut handle = self.timer_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        info!("reconcile service stopped");
    }

    /// Schedule a debounced partial sweep for one community. Further
    /// triggers for the same community inside the debounce window coalesce
    /// into the already pending sweep.
    pub async fn trigger(self: &Arc<Self>, community: CommunityId) {
        {
            let mut pending = self.pending.lock().await;
            if !pending.insert(community.clone()) {
                return;
            }
        }

        let svc = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(svc.config.debounce_delay).await;
            svc.pending.lock().await.remove(&community);
            svc.reconcile_one(&community).await;
        });
    }

    /// One pass over every community in the store.
    pub async fn sweep_all(&self) {
        let entries = self.store.all_entries().await;
        debug!(communities = entries.len(), "starting full sweep");
        for (community, _) in entries {
            self.reconcile_one(&community).await;
        }
    }

    /// Reconcile every counter of one community, in store insertion order.
    /// One entry's failure never aborts the rest.
    pub async fn reconcile_one(&self, community: &CommunityId) -> Vec<SweepOutcome> {
        let Some(configs) = self.store.get(community).await else {
            return Vec::new();
        };

        let mut outcomes = Vec::with_capacity(configs.len());
        let mut pruned = false;
        for config in &configs {
            let outcome = self.reconcile_counter(community, config).await;
            match outcome {
                SweepOutcome::Skipped => {
                    if self.note_miss(&config.channel_id).await {
                        self.store
                            .remove_channel(community, &config.channel_id)
                            .await;
                        pruned = true;
                        info!(
                            community = %community,
                            channel = %config.channel_id,
                            sweeps = self.config.prune_after_misses,
                            "pruned counter whose channel stayed missing"
                        );
                    }
                },
                SweepOutcome::Failed => {},
                SweepOutcome::Unchanged | SweepOutcome::Updated => {
                    self.misses.lock().await.remove(&config.channel_id);
                },
            }
            outcomes.push(outcome);
        }

        if pruned {
            persist_best_effort(&self.store, self.gateway.as_ref(), self.snapshot.as_ref())
                .await;
        }
        outcomes
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn sweep_loop(self: &Arc<Self>) {
        loop {
            if !*self.running.read().await {
                break;
            }

            self.sweep_all().await;

            tokio::select! {
                () = tokio::time::sleep(self.config.sweep_interval) => {},
                () = self.wake.notified() => {
                    debug!("sweep loop woken by notify");
                },
            }
        }
    }

    async fn reconcile_counter(
        &self,
        community: &CommunityId,
        config: &CounterConfig,
    ) -> SweepOutcome {
        let channel = match self.gateway.get_channel(community, &config.channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                debug!(channel = %config.channel_id, "counter channel missing, skipping");
                return SweepOutcome::Skipped;
            },
            Err(e) => {
                warn!(
                    channel = %config.channel_id,
                    error = %e,
                    "failed to look up counter channel"
                );
                return SweepOutcome::Failed;
            },
        };

        let members = match self.gateway.fetch_membership(community).await {
            Ok(members) => members,
            Err(e) => {
                warn!(community = %community, error = %e, "failed to fetch membership");
                return SweepOutcome::Failed;
            },
        };

        let target = target_name(config.kind, evaluate(config.kind, &members));
        if channel.name == target {
            return SweepOutcome::Unchanged;
        }

        match self.gateway.rename_channel(&channel, &target).await {
            Ok(()) => {
                info!(channel = %config.channel_id, name = %target, "counter renamed");
                SweepOutcome::Updated
            },
            Err(e) => {
                warn!(
                    channel = %config.channel_id,
                    error = %e,
                    "failed to rename counter channel"
                );
                SweepOutcome::Failed
            },
        }
    }

    /// Record a missing-channel sighting. Returns true once the channel
    /// has been missing for enough consecutive sweeps to prune.
    async fn note_miss(&self, channel: &ChannelId) -> bool {
        let mut misses = self.misses.lock().await;
        let count = misses.entry(channel.clone()).or_insert(0);
        *count += 1;
        if *count >= self.config.prune_after_misses {
            misses.remove(channel);
            true
        } else {
            false
        }
    }
}
