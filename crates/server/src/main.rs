use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reclaim_aws::{StsIdentityVerifier, aws_registry};
use reclaim_gateway::{RemediationRequest, ScanRequest, Sweeper};
use reclaim_server::api::AppState;
use reclaim_server::config::ReclaimConfig;
use reclaim_server::store_factory::create_credential_store;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Reclaim: find and remove idle cloud resources.
#[derive(Parser, Debug)]
#[command(name = "reclaim", version, about = "Idle cloud resource scanner")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "reclaim.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default).
    Serve,
    /// Print the technique catalog as JSON.
    Techniques,
    /// Scan one technique and print the report as JSON.
    Scan {
        /// Technique id, e.g. `ebs`.
        technique: String,
        /// Region to scan instead of the configured default.
        #[arg(long)]
        region: Option<String>,
    },
    /// Remediate resources by id and print the report as JSON.
    ///
    /// Runs as a dry run unless `--execute` is given.
    Remediate {
        technique: String,
        /// Resource ids, reported in this order.
        resource_ids: Vec<String>,
        /// Actually delete/terminate/release the resources.
        #[arg(long)]
        execute: bool,
        #[arg(long)]
        region: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ReclaimConfig::load(&cli.config)?;
    reclaim_server::telemetry::init(&config.logging);

    if !cli.config.exists() {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let credentials = create_credential_store(&config.credentials)?;
    let sweeper = Arc::new(
        Sweeper::builder()
            .registry(aws_registry())
            .credentials(credentials.clone())
            .default_region(config.scan.region.clone())
            .endpoint_url(config.scan.endpoint_url.clone())
            .concurrency(config.scan.remediation_concurrency)
            .build()?,
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {}
        Commands::Techniques => {
            print_json(&sweeper.techniques())?;
            return Ok(());
        }
        Commands::Scan { technique, region } => {
            let report = sweeper.scan(&technique, ScanRequest { region }).await?;
            print_json(&report)?;
            return Ok(());
        }
        Commands::Remediate {
            technique,
            resource_ids,
            execute,
            region,
        } => {
            let request = RemediationRequest {
                resource_ids,
                dry_run: !execute,
                region,
            };
            let report = sweeper.remediate(&technique, request).await?;
            print_json(&report)?;
            return Ok(());
        }
    }

    let verifier =
        Arc::new(StsIdentityVerifier::new().with_endpoint_url(config.scan.endpoint_url.clone()));
    let state = AppState {
        sweeper,
        credentials,
        verifier,
    };
    let app = reclaim_server::api::router(state);

    // CLI overrides take precedence.
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "reclaim listening");

    // On a signal, stop accepting connections and give in-flight requests
    // (a remediation batch can take a while) the configured grace period.
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let stop = Arc::new(Notify::new());
    let stopped = Arc::clone(&stop);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { stopped.notified().await })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        () = shutdown_signal() => {
            stop.notify_one();
            match tokio::time::timeout(shutdown_timeout, server.as_mut()).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    timeout_secs = config.server.shutdown_timeout_seconds,
                    "shutdown timeout exceeded, dropping in-flight requests"
                ),
            }
        }
    }

    info!("reclaim shut down");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
