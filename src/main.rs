use anyhow::Result;
use std::sync::Arc;
use telemetry_sampler::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        interval_ms = app_config.sampling.interval_ms,
        window_capacity = app_config.sampling.window_capacity,
        "starting"
    );

    // No OS input hook or window probe is linked into this binary; embedders
    // pass an InputRecorder / WindowProbe here.
    let sources = sources::build(&app_config.metrics, None, None);
    let bridge = Arc::new(bridge::PublicationBridge::new());
    let control = scheduler::SchedulerControl::new();

    let (scheduler_shutdown_tx, scheduler_shutdown_rx) = tokio::sync::oneshot::channel();
    let scheduler_handle = scheduler::spawn(
        scheduler::SchedulerDeps {
            sources,
            bridge: bridge.clone(),
            control: control.clone(),
            shutdown_rx: scheduler_shutdown_rx,
        },
        scheduler::SchedulerConfig::from_app(&app_config),
    );

    let (display_shutdown_tx, display_shutdown_rx) = tokio::sync::oneshot::channel();
    let display_handle = display::spawn(
        bridge.clone(),
        app_config.display.clone(),
        display_shutdown_rx,
    );

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");

    let _ = scheduler_shutdown_tx.send(());
    if let Err(e) = scheduler_handle.await {
        tracing::warn!(error = %e, "scheduler task failed");
    }
    let _ = display_shutdown_tx.send(());
    match display_handle.await {
        Ok(log) => {
            if let Some(path) = &app_config.display.export_path {
                match log.export_csv(path) {
                    Ok(rows) => tracing::info!(path = %path.display(), rows, "telemetry log exported"),
                    Err(e) => tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        operation = "export_csv",
                        "telemetry log export failed"
                    ),
                }
            }
            tracing::info!(
                log_entries = log.len(),
                ticks_published = control.stats().ticks_published(),
                source_failures = control.stats().source_failures(),
                "stopped"
            );
        }
        Err(e) => tracing::warn!(error = %e, "display task failed"),
    }

    Ok(())
}
