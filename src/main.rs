use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roomsense::config::Settings;
use roomsense::ingest::{self, Hub};
use roomsense::query::QueryService;
use roomsense::{api, report, source};

#[derive(Parser, Debug)]
#[command(name = "roomsense")]
#[command(about = "Ingestion and query hub for smart-home environmental telemetry")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host (overrides settings)
    #[arg(long)]
    broker_host: Option<String>,

    /// MQTT broker port (overrides settings)
    #[arg(long)]
    broker_port: Option<u16>,

    /// Query API listen address (overrides settings)
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roomsense=info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(host) = args.broker_host {
        settings.mqtt.host = host;
    }
    if let Some(port) = args.broker_port {
        settings.mqtt.port = port;
    }
    if let Some(listen) = args.listen {
        settings.api.listen_addr = listen;
    }

    let hub = Hub::new(
        settings.thresholds.clone(),
        settings.store.retention(),
        settings.store.alert_retain,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (inbound, mqtt_task) = source::mqtt::spawn(settings.mqtt.clone(), shutdown_rx.clone());
    let api_task = tokio::spawn(api::serve(
        QueryService::new(&hub),
        settings.api.clone(),
        shutdown_rx.clone(),
    ));
    let report_task = tokio::spawn(report::run(
        hub.clone(),
        Duration::from_secs(settings.report.interval_secs),
        shutdown_rx.clone(),
    ));
    let mut ingest_task = tokio::spawn(ingest::run(
        hub.clone(),
        settings.ingest.clone(),
        inbound,
        shutdown_rx,
    ));

    info!("roomsense hub started");

    // Run until interrupted or the pipeline stops on its own (which, short
    // of the broker channel closing, means a store failure).
    let early_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            None
        }
        res = &mut ingest_task => Some(res),
    };

    let _ = shutdown_tx.send(true);

    let ingest_result = match early_result {
        Some(res) => res,
        None => ingest_task.await,
    };

    let _ = mqtt_task.await;
    let _ = report_task.await;
    if let Ok(Err(e)) = api_task.await {
        error!(error = %e, "query API error");
    }

    match ingest_result {
        Ok(Ok(())) => {
            info!("roomsense hub stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "ingestion pipeline failed");
            Err(e.into())
        }
        Err(e) => Err(anyhow::anyhow!("ingestion task panicked: {e}")),
    }
}
