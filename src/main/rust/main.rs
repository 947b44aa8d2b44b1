use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use jvs_streamer::{
    resolve_device_address, serve_metrics, Config, ConsoleStatusSink, CoordinatorHandle,
    GStreamerEngine, HttpControlPlane, PrometheusReporter, SessionCoordinator, SessionRuntime,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging, RUST_LOG wins over --verbose
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting JVS streamer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    gstreamer::init()?;
    info!("GStreamer initialized");

    PrometheusReporter::init_metrics()?;
    info!("Metrics initialized");

    let device_address = match config.device_address {
        Some(addr) => addr,
        None => resolve_device_address()?,
    };
    let control_plane_config = config.to_control_plane_config(device_address)?;
    let media = config.to_media_config()?;

    info!("-------------------------------------------------------");
    info!("JVS streamer ready");
    info!("   Server:  {}", control_plane_config.streams_url());
    info!("   Device:  {}", control_plane_config.device_rtsp_url());
    info!("   Mode:    {}", control_plane_config.mode());
    info!("   Encode:  {}", control_plane_config.encoding().as_str());
    info!("   Metrics: http://0.0.0.0:{}/metrics", config.metrics_port);
    info!("-------------------------------------------------------");

    let mode = control_plane_config.mode();
    let status = Arc::new(ConsoleStatusSink::new());
    let (coordinator, completions) = SessionCoordinator::new(
        media,
        mode,
        Arc::new(HttpControlPlane::new(control_plane_config)),
        status.clone(),
        Arc::new(PrometheusReporter::new()),
    );
    let (handle, runtime) =
        SessionRuntime::spawn(coordinator, completions, config.shutdown_grace());

    let metrics_port = config.metrics_port;
    let metrics_handle = handle.clone();
    tokio::spawn(async move {
        serve_metrics(metrics_port, metrics_handle).await;
    });
    info!("Metrics server started on port {}", config.metrics_port);

    let engine = GStreamerEngine::new(Arc::new(handle.clone()));
    handle.bind_engine(Box::new(engine))?;

    println!("{}", status.render());
    println!("Commands: <Enter> toggle, start, stop, status, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !run_command(&handle, line.trim()).await {
                        break;
                    }
                    println!("{}", status.render());
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read console input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received (Ctrl+C)");
                break;
            }
        }
    }

    if let Err(e) = handle.shutdown().await {
        warn!("Session runtime already gone: {}", e);
    }
    runtime.await?;

    info!("Streamer stopped gracefully");
    Ok(())
}

/// Returns false when the console asked to quit
async fn run_command(handle: &CoordinatorHandle, command: &str) -> bool {
    let outcome = match command {
        "" => handle.start().await,
        "start" => {
            if handle.is_running().await {
                println!("Already streaming");
                Ok(())
            } else {
                handle.start().await
            }
        }
        "stop" => handle.stop().await,
        "status" => match handle.snapshot().await {
            Ok(snapshot) => {
                println!(
                    "state={} stream_id={:?} session={} transitions={}",
                    snapshot.state, snapshot.stream_id, snapshot.id, snapshot.transitions
                );
                if let Some(last) = snapshot.last_transition {
                    println!(
                        "last: {} -> {} {:.1}s ago ({})",
                        last.from,
                        last.to,
                        last.timestamp.elapsed().as_secs_f64(),
                        last.reason.as_deref().unwrap_or("no reason")
                    );
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        "quit" | "exit" => return false,
        other => {
            println!("Unknown command: {}", other);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        warn!("{}", e);
    }
    true
}
