//! Connectivity monitor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   sysfs poller ──PlatformEvent──┐
//!                                 ▼
//!   ticker ──▶ scheduler ──▶ prober ──HEAD──▶ check URL
//!                 │
//!                 ▼
//!            status tracker ──changed──▶ subscription registry ──▶ callbacks
//!                 │
//!                 ▼
//!            admin HTTP (/status, /check, /health)
//! ```
//!
//! Startup order: config → logging → metrics → background runner → scheduler
//! → admin server. A background runner failure aborts startup.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use connectivity_monitor::admin::{self, AdminState};
use connectivity_monitor::config::{load_config, MonitorConfig};
use connectivity_monitor::lifecycle::{wait_for_signal, Shutdown};
use connectivity_monitor::observability::{logging, metrics};
use connectivity_monitor::platform::{NetworkPlatform, SysfsPlatform};
use connectivity_monitor::probe::HttpTransport;
use connectivity_monitor::runner::LocalHost;
use connectivity_monitor::subscription::{StatusEvent, SubscriberError};
use connectivity_monitor::Monitor;

#[derive(Parser)]
#[command(name = "connectivity-monitor")]
#[command(about = "Watches network reachability and reports status changes", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the check URL from the configuration
    #[arg(long)]
    check_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(url) = args.check_url {
        config.check.url = url;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "connectivity-monitor starting");
    tracing::info!(
        url = %config.check.url,
        interval_ms = config.check.interval_ms,
        max_consecutive_errors = config.check.max_consecutive_errors,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let platform = Arc::new(SysfsPlatform::new(&config.platform.net_root));
    tokio::spawn(platform.clone().run(config.platform.poll_interval(), shutdown.subscribe()));

    let transport = Arc::new(HttpTransport::new()?);
    let platform_handle: Arc<dyn NetworkPlatform> = platform;
    let host = Arc::new(LocalHost::new());
    let monitor = Arc::new(Monitor::new(&config, transport, platform_handle, host)?);

    if let Err(e) = monitor.start().await {
        tracing::error!(error = %e, "Connectivity monitor failed to start");
        shutdown.trigger();
        return Err(e.into());
    }

    monitor
        .subscribe(|event: &StatusEvent| -> Result<(), SubscriberError> {
            tracing::info!(
                status = %event.status(),
                online = event.status().is_online(),
                "Connectivity status"
            );
            Ok(())
        })
        .await;

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let router = admin::setup_admin_router(
            AdminState { monitor: monitor.clone() },
            config.admin.request_timeout(),
        );
        Some(tokio::spawn(admin::serve(listener, router, shutdown.subscribe())))
    } else {
        None
    };

    wait_for_signal().await;
    tracing::info!("Shutdown signal received");

    shutdown.trigger();
    monitor.shutdown().await;
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::warn!(error = %e, "Admin server error"),
            Err(e) => tracing::warn!(error = %e, "Admin server task failed"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
