//! Process lifecycle: startup sequencing, the event loop, and the
//! shutdown flush.

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    headcount_engine::{ProvisionService, ReconcileConfig, ReconcileService, persist_best_effort},
    headcount_platform::{CommunityGateway, EventReceiver, GatewayEvent},
    headcount_store::{ConfigStore, FileSnapshot, SnapshotStore},
    tokio::task::JoinHandle,
    tracing::{info, warn},
};

use crate::commands;

/// Startup configuration resolved from the CLI.
pub struct AppConfig {
    /// Snapshot file location; `None` uses the default data dir.
    pub snapshot_path: Option<PathBuf>,
    pub reconcile: ReconcileConfig,
    /// Interval of the periodic persistence timer. Decoupled from the
    /// sweep interval so persistence cost doesn't scale with sweep
    /// frequency.
    pub persist_interval: Duration,
}

/// A started headcount instance.
pub struct App {
    gateway: Arc<dyn CommunityGateway>,
    store: Arc<ConfigStore>,
    snapshot: Arc<dyn SnapshotStore>,
    provision: Arc<ProvisionService>,
    reconciler: Arc<ReconcileService>,
    persist_handle: Option<JoinHandle<()>>,
}

impl App {
    /// Load the store, register the command schema, and start the sweep
    /// and persistence timers.
    pub async fn start(config: AppConfig, gateway: Arc<dyn CommunityGateway>) -> Result<Self> {
        let snapshot: Arc<dyn SnapshotStore> = Arc::new(match config.snapshot_path {
            Some(path) => FileSnapshot::new(path),
            None => FileSnapshot::default_path().context("resolving snapshot path")?,
        });

        let store = Arc::new(ConfigStore::load_from(snapshot.as_ref()).await);
        info!(
            communities = store.community_count().await,
            "configuration store loaded"
        );

        gateway
            .register_commands(&commands::command_specs())
            .await
            .context("registering command schema")?;

        let provision = Arc::new(ProvisionService::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            Arc::clone(&snapshot),
        ));
        let reconciler = ReconcileService::with_config(
            Arc::clone(&gateway),
            Arc::clone(&store),
            Arc::clone(&snapshot),
            config.reconcile,
        );
        reconciler.start().await;

        let persist_handle = {
            let store = Arc::clone(&store);
            let gateway = Arc::clone(&gateway);
            let snapshot = Arc::clone(&snapshot);
            let interval = config.persist_interval;
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    persist_best_effort(&store, gateway.as_ref(), snapshot.as_ref()).await;
                }
            })
        };

        Ok(Self {
            gateway,
            store,
            snapshot,
            provision,
            reconciler,
            persist_handle: Some(persist_handle),
        })
    }

    /// Consume gateway events until the stream closes or a termination
    /// signal arrives.
    pub async fn run(&self, events: &mut EventReceiver) {
        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("gateway event stream closed");
                        break;
                    },
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("termination signal received");
                    break;
                },
            }
        }
    }

    pub async fn handle_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::MemberAdded { community }
            | GatewayEvent::MemberRemoved { community }
            | GatewayEvent::PresenceUpdated { community } => {
                self.reconciler.trigger(community).await;
            },
            GatewayEvent::Command { invocation, reply } => {
                let text = commands::dispatch(&self.provision, invocation).await;
                if reply.send(text).is_err() {
                    warn!("command requester went away before the reply");
                }
            },
        }
    }

    /// Stop timers and flush the store. Flush failure is logged and never
    /// blocks shutdown.
    pub async fn shutdown(&mut self) {
        self.reconciler.stop().await;
        if let Some(handle) = self.persist_handle.take() {
            handle.abort();
        }
        persist_best_effort(&self.store, self.gateway.as_ref(), self.snapshot.as_ref()).await;
        info!("shutdown flush complete");
    }
}
