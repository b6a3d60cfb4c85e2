//! stereo-sync - stereo relay daemon for the MiRo robot
//!
//! ## Protocol Architecture
//!
//! - **TCP inbound (port 5560)**: producers push raw images, camera info and
//!   velocity messages
//! - **TCP outbound (port 5561)**: subscribers receive relabeled streams, `/tf`
//!   and odometry
//!
//! Both ports use the same topic-tagged framing (see `streaming::wire`).

use std::env;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stereo_sync::core::types::now_us;
use stereo_sync::streaming::{TcpPublisher, TopicRouter, accept_loop, create_serializer};
use stereo_sync::{AppConfig, Error, RelayService, Result, StereoRelay};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `stereo-sync <path>` (positional)
/// - `stereo-sync --config <path>` (flag-based)
/// - `stereo-sync -c <path>` (short flag)
///
/// Defaults to `/etc/stereo-sync.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/stereo-sync.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = AppConfig::load_or_default(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("stereo-sync v{} starting...", env!("CARGO_PKG_VERSION"));
    if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
    } else {
        log::warn!("Config {} not found, using built-in defaults", config_path);
    }
    log::info!("  Inbound: {}", config.network.inbound_address);
    log::info!("  Publish: {}", config.network.publish_address);
    log::info!("  Wire format: {:?}", config.network.wire_format);
    log::info!("  Reference stamp: {:?}", config.sync.reference_stamp);
    log::info!(
        "  Odometry: scale={}, initial_heading={:.4}rad, stamp={:?}",
        config.odometry.velocity_scale,
        config.odometry.initial_heading,
        config.odometry.stamp_source
    );
    log::info!(
        "  Frames: map={}, body={}, mount={}, sensor={}",
        config.frames.map,
        config.frames.body,
        config.frames.mount,
        config.frames.sensor
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let serializer = create_serializer(config.network.wire_format);
    let publisher = TcpPublisher::bind(
        &config.network.publish_address,
        config.network.queue_capacity,
        serializer,
    )?;

    let service = Arc::new(RelayService::new(
        StereoRelay::new(&config, now_us())?,
        TopicRouter::new(config.topics.clone()),
        serializer,
        publisher.handle(),
    ));

    let bind_addr = &config.network.inbound_address;
    let listener = TcpListener::bind(bind_addr)
        .map_err(|e| Error::Other(format!("Failed to bind to {}: {}", bind_addr, e)))?;
    log::info!("Accepting producers on {}", bind_addr);
    log::info!("stereo-sync running. Press Ctrl-C to stop.");

    accept_loop(listener, Arc::clone(&service), running)?;

    log::info!("Shutting down...");
    let dropped = publisher.handle().dropped_count();
    if dropped > 0 {
        log::warn!("Publisher queue overflowed, {} messages dropped", dropped);
    }
    publisher.stop();
    drop(publisher);

    let integrator = service.relay().integrator();
    let integrator = integrator.lock();
    let pose = integrator.pose();
    log::info!(
        "Velocity samples: {} integrated, {} clamped, {} rejected",
        integrator.sample_count(),
        integrator.clamped_count(),
        integrator.rejected_count()
    );
    log::info!(
        "stereo-sync stopped ({} records relayed, final pose x={:.3} y={:.3} heading={:.3})",
        service.relayed_count(),
        pose.x,
        pose.y,
        pose.heading
    );
    Ok(())
}
