//! Drowsiness Monitor
//!
//! Wires the decision engine to its collaborators: frame source, actuator
//! board and notification channels.

pub mod config;
pub mod session;
pub mod source;

pub use config::{LoggingConfig, MonitorConfig, NoFacePolicy};
pub use session::{Session, SessionStats};
pub use source::{Frame, JsonLinesSource, SourceError};

use alerting::{spawn_worker, NotificationDispatcher};
use anyhow::{anyhow, Context};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::io::AsyncRead;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow!("invalid log level '{}'", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.context("Failed to set tracing subscriber")
}

/// Serve Prometheus metrics if an address is configured
pub fn install_metrics(addr: Option<SocketAddr>) -> anyhow::Result<()> {
    if let Some(addr) = addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Serving metrics on http://{}/metrics", addr);
    }
    Ok(())
}

/// Run the decision loop until the source ends or Ctrl-C
pub async fn run<R>(config: MonitorConfig, mut source: JsonLinesSource<R>) -> anyhow::Result<SessionStats>
where
    R: AsyncRead + Unpin,
{
    config.detection.validate()?;
    info!(
        "Detection: threshold {}, alarm after {}ms closed, release after {}ms open, no face -> {:?}",
        config.detection.closed_threshold,
        config.detection.closed_min_ms,
        config.detection.open_min_ms,
        config.no_face,
    );

    let dispatcher = NotificationDispatcher::from_config(&config.notifications.resolve());
    if dispatcher.channel_count() == 0 {
        info!("Remote notifications disabled (no channel enabled)");
    }
    let (notifier, worker) = spawn_worker(dispatcher, config.notifications.queue_capacity);

    let actuator = actuator::connect(&config.actuator).await;
    let mut session = Session::new(config.detection.clone(), config.no_face, actuator, notifier);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            frame = source.next_frame() => match frame {
                Ok(Some(frame)) => {
                    session.process(frame).await;
                }
                Ok(None) => {
                    info!("End of input");
                    break;
                }
                Err(SourceError::Parse { line, reason }) => {
                    warn!("Skipping frame on line {}: {}", line, reason);
                }
                Err(e) => return Err(e.into()),
            },
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let stats = session.finish();
    // All handles are gone now; wait for queued notifications to go out
    if let Err(e) = worker.await {
        warn!("Notification worker ended abnormally: {}", e);
    }

    info!(
        "Session finished: {} frames ({} without face), {} alarms, {} releases",
        stats.frames, stats.frames_without_face, stats.onsets, stats.releases
    );
    Ok(stats)
}
