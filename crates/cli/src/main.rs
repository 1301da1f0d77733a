//! headcount — live counter channels for chat communities.

mod app;
mod commands;

use std::{sync::Arc, time::Duration};

use {
    clap::{Parser, Subcommand},
    headcount_counters::CounterKind,
    headcount_engine::ReconcileConfig,
    headcount_platform::{
        CommunityGateway, EventReceiver, EventSender, GatewayEvent, sim::SimGateway,
    },
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::app::{App, AppConfig};

#[derive(Parser)]
#[command(name = "headcount", about = "Headcount — live counter channels for chat communities")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Snapshot file path (overrides the default ~/.headcount/counters.json).
    #[arg(long, global = true, env = "HEADCOUNT_SNAPSHOT")]
    snapshot: Option<std::path::PathBuf>,

    /// Seconds between full sweeps over every community.
    #[arg(long, default_value_t = 300)]
    sweep_interval_secs: u64,

    /// Milliseconds to debounce event-triggered partial sweeps.
    #[arg(long, default_value_t = 1000)]
    debounce_ms: u64,

    /// Seconds between periodic snapshot writes.
    #[arg(long, default_value_t = 600)]
    persist_interval_secs: u64,

    /// Run against the in-process simulated platform instead of a real
    /// gateway session.
    #[arg(long, default_value_t = false)]
    sim: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// List available counter types.
    Types,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn app_config(cli: &Cli) -> AppConfig {
    AppConfig {
        snapshot_path: cli.snapshot.clone(),
        reconcile: ReconcileConfig {
            sweep_interval: Duration::from_secs(cli.sweep_interval_secs),
            debounce_delay: Duration::from_millis(cli.debounce_ms),
            ..ReconcileConfig::default()
        },
        persist_interval: Duration::from_secs(cli.persist_interval_secs),
    }
}

/// Build the platform session. Only the in-process simulator ships with
/// the binary; a real chat-platform backend plugs in through
/// [`CommunityGateway`].
async fn build_gateway(cli: &Cli) -> anyhow::Result<(Arc<dyn CommunityGateway>, EventReceiver)> {
    if !cli.sim {
        anyhow::bail!(
            "no platform backend configured; run with --sim to use the in-process simulator"
        );
    }

    let gateway = Arc::new(SimGateway::demo().await);
    let (tx, rx) = tokio::sync::mpsc::channel(64);
    spawn_churn(Arc::clone(&gateway), tx);
    info!("running against the simulated platform");
    Ok((gateway, rx))
}

/// Periodically flip a member's presence in the simulator and emit the
/// matching gateway event, so sim runs exercise the debounced sweep path.
fn spawn_churn(gateway: Arc<SimGateway>, tx: EventSender) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(10)).await;
            if let Some(community) = gateway.churn().await {
                let _ = tx.send(GatewayEvent::PresenceUpdated { community }).await;
            }
        }
    });
}

fn print_types() {
    println!("Available counter types:");
    for kind in CounterKind::ALL {
        println!("  {:<16} {}", kind.as_str(), kind.label());
    }
}

/// Top-level supervisory boundary: any fault below is logged, the store
/// gets a best-effort flush, and the process exits deterministically.
async fn run(cli: Cli) -> i32 {
    let (gateway, mut events) = match build_gateway(&cli).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "failed to start gateway session");
            return 1;
        },
    };

    let mut app = match App::start(app_config(&cli), gateway).await {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "startup failed");
            return 1;
        },
    };

    app.run(&mut events).await;
    app.shutdown().await;
    0
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command.take() {
        Some(Commands::Types) => print_types(),
        Some(Commands::Run) | None => {
            let code = run(cli).await;
            std::process::exit(code);
        },
    }
}
