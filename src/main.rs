use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};

mod cli;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod ui;

use cli::Cli;
use config::CleanupConfig;
use domain::ExitStatus;
use error::{CleanupError, ConfigError, ConnectError};
use infrastructure::connector::{self, ClusterConnection};
use services::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    match run(cli).await {
        Ok(status) => status.into(),
        Err(e) => report_startup_failure(&e).into(),
    }
}

/// Load configuration, apply flag overrides and connect
async fn prepare(cli: &Cli) -> Result<(CleanupConfig, ClusterConnection), CleanupError> {
    let mut config = CleanupConfig::load(cli.config.as_deref())?;
    if let Some(namespace) = &cli.release_namespace {
        config = config.with_release_namespace(namespace.as_str());
    }
    if let Some(timeout) = cli.uninstall_timeout {
        config = config.with_uninstall_timeout(timeout);
    }
    config
        .validate()
        .map_err(|errors| ConfigError::Invalid { errors })?;

    let kubeconfig = cli
        .kubeconfig
        .as_deref()
        .ok_or(ConnectError::MissingCredentials)?;
    let connection = connector::open(kubeconfig, &config).await?;
    Ok((config, connection))
}

async fn run(cli: Cli) -> Result<ExitStatus> {
    let (config, connection) = prepare(&cli).await.context("Startup failed")?;

    ui::print_header("Service Catalog cleanup");
    info!(
        "Removing {} release(s) from {}",
        config.release_names.len(),
        config.release_namespace
    );

    let orchestrator = Orchestrator::new(&config);
    let report = tokio::select! {
        report = orchestrator.run(connection.cluster(), &connection) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            ui::print_warning(
                "Interrupted, cluster-side operations already issued are not rolled back",
            );
            return Ok(ExitStatus::Interrupted);
        }
    };

    ui::print_summary(&report);
    Ok(report.exit_status())
}

/// Print a startup error; every startup error is fatal
fn report_startup_failure(e: &anyhow::Error) -> ExitStatus {
    error!("{:#}", e);
    ui::print_error(&format!("{:#}", e));
    if is_credential_failure(e) {
        ui::print_warning("Check that KUBECONFIG (or --kubeconfig) names a readable kubeconfig");
    }
    ExitStatus::Fatal
}

fn is_credential_failure(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<CleanupError>(),
        Some(CleanupError::Connect(connect)) if connect.is_credential_error()
    )
}
