//! Trigger relay entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** from flags and environment, and validate it.
//! 2. **Wire observability**: a `tracing-subscriber` JSON or pretty layer and,
//!    when configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: the build server trigger, the mapping
//!    source, and the [`relay::TriggerRelay`] that owns store and scheduler.
//! 4. **Load the mapping once.** A failure here is fatal; afterwards refresh
//!    failures only keep the previous table.
//! 5. **Serve** until Ctrl-C or SIGTERM, then stop the refresh loop.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use jenkins::JenkinsTrigger;
use mapping_source::MappingSource;
use relay::{DebounceScheduler, MappingStore, TriggerRelay};
use routing::{KeyResolver, RelayError};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(e) = &result {
        error!(error = ?e, "trigger relay stopped");
    }

    telemetry.shutdown();
    result
}

async fn run(config: CliConfig) -> anyhow::Result<()> {
    config.validate()?;

    let trigger = JenkinsTrigger::new(config.jenkins_config())
        .map_err(|e| RelayError::Configuration { message: e.to_string() })?;
    info!(project = trigger.project_url(), "build server configured");

    let source = MappingSource::from_location(
        config.mapping_file.clone(),
        config.mapping_url.clone(),
        config.mapping_insecure,
    )
    .map_err(|e| RelayError::Configuration { message: e.to_string() })?;

    let relay = Arc::new(TriggerRelay::new(
        KeyResolver::new(config.file_matching, config.semantic_repo.clone()),
        MappingStore::new(Box::new(source), config.file_matching),
        DebounceScheduler::new(config.quiet_period(), Arc::new(trigger)),
    ));

    relay.refresh_now().await.map_err(RelayError::StartupLoad)?;

    let (stop_refresh, refresh_stopped) = watch::channel(false);
    let refresh = tokio::spawn(Arc::clone(&relay).run_refresh_loop(config.refresh_interval(), refresh_stopped));

    let socket = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    let served = listener::serve(socket, Arc::clone(&relay), shutdown_signal()).await;

    let _ = stop_refresh.send(true);
    if let Err(e) = refresh.await {
        warn!(error = %e, "mapping refresh task ended abnormally");
    }

    let pending = relay.scheduler().pending_count();
    if pending > 0 {
        info!(pending, "dropping pending triggers");
    }

    served.context("listener failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown requested");
}
