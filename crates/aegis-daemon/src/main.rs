//! # aegis-daemon
//!
//! The Aegis gateway daemon: loads the policy directory, starts hot-reload
//! watching, sweeps expired approvals, and serves the HTTP surface described
//! in SPEC_FULL.md §6.

mod config;
mod routes;
mod state;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aegis_adapter::{MockFilesAdapter, MockPaymentsAdapter, RoutingAdapter};
use aegis_approval::ApprovalStore;
use aegis_audit::{DecisionRing, Telemetry, TracingTelemetry};
use aegis_gateway::DispatchOrchestrator;
use aegis_policy::PolicyIndex;
use aegis_watcher::TracingReloadObserver;
use config::DaemonConfig;
use state::AppState;

/// Log output format: plain text for a terminal, JSON lines for production.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Aegis least-privilege gateway daemon.
#[derive(Parser)]
#[command(name = "aegis-daemon", about = "Least-privilege policy gateway daemon")]
struct Cli {
    /// Overrides POLICY_DIR.
    #[arg(long)]
    policy_dir: Option<std::path::PathBuf>,

    /// Overrides PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

const APPROVAL_SWEEP_INTERVAL_SECS: u64 = 30;

fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env()
        .add_directive("aegis_daemon=info".parse().unwrap())
        .add_directive("aegis_gateway=info".parse().unwrap())
        .add_directive("aegis_watcher=info".parse().unwrap())
        .add_directive("aegis_policy=info".parse().unwrap())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .init();
        }
    }

    let mut config = DaemonConfig::from_env();
    if let Some(policy_dir) = cli.policy_dir {
        config.policy_dir = policy_dir;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let initial = match aegis_policy::load_and_merge(&config.policy_dir) {
        Ok((set, warnings)) => {
            for warning in &warnings {
                tracing::warn!(source = %warning.source_path, reason = %warning.reason, "policy file dropped");
            }
            tracing::info!(
                fingerprint = %set.version_fingerprint,
                agents = set.agents.len(),
                "initial policy load succeeded"
            );
            set
        }
        Err(e) => {
            tracing::error!(error = %e, policy_dir = %config.policy_dir.display(), "fatal: could not load initial policy set");
            return ExitCode::from(1);
        }
    };

    let index = Arc::new(PolicyIndex::new(initial));
    let approvals = Arc::new(ApprovalStore::new(chrono::Duration::seconds(config.approval_ttl_seconds)));
    let ring = Arc::new(DecisionRing::new(config.decision_ring_size));

    if config.otel_endpoint.is_some() {
        tracing::warn!("OTEL_ENDPOINT is set but OTLP export is not implemented; falling back to tracing output");
    }
    let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry);

    let adapter_root = config.policy_dir.join("..").join("files");
    let adapter = Arc::new(
        RoutingAdapter::new()
            .with_route("payments", Arc::new(MockPaymentsAdapter))
            .with_route("files", Arc::new(MockFilesAdapter::new(&adapter_root))),
    );

    let orchestrator = Arc::new(DispatchOrchestrator::new(
        Arc::clone(&index),
        Arc::clone(&approvals),
        Arc::clone(&ring),
        telemetry,
        adapter,
    ));

    let watch_observer: Arc<dyn aegis_watcher::ReloadObserver> = Arc::new(TracingReloadObserver);
    let _watcher = match aegis_watcher::spawn(config.policy_dir.clone(), Arc::clone(&index), watch_observer) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::error!(error = %e, "could not start policy watcher; hot reload disabled");
            None
        }
    };

    let sweep_approvals = Arc::clone(&approvals);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(APPROVAL_SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            let swept = sweep_approvals.sweep_expired();
            if swept > 0 {
                tracing::info!(swept, "expired pending approvals swept");
            }
        }
    });

    let state = AppState {
        orchestrator,
        index,
        approvals,
        ring,
        request_timeout: Duration::from_secs(30),
    };
    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "could not bind HTTP listener");
            return ExitCode::from(2);
        }
    };

    tracing::info!(port = config.port, policy_dir = %config.policy_dir.display(), "aegis-daemon ready");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
