//! pcl-voxel - point cloud decimation daemon
//!
//! Receives filtered clouds on the inbound port (5562), decimates them with a
//! voxel grid and publishes the result to subscribers on port 5563.

use pcl_voxel::{DownsampleService, Error, PclConfig, Result, VoxelGrid};
use std::env;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stereo_sync::streaming::{TcpPublisher, accept_loop, create_serializer};

/// Parse config path from command line arguments.
///
/// Supports `pcl-voxel <path>`, `pcl-voxel --config <path>` and
/// `pcl-voxel -c <path>`. Defaults to `/etc/pcl-voxel.toml`.
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

    "/etc/pcl-voxel.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = PclConfig::load_or_default(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("pcl-voxel v{} starting...", env!("CARGO_PKG_VERSION"));
    if Path::new(&config_path).exists() {
        log::info!("Using config: {}", config_path);
    } else {
        log::warn!("Config {} not found, using built-in defaults", config_path);
    }
    log::info!(
        "  Topics: {} -> {}",
        config.topics.input,
        config.topics.output
    );
    log::info!(
        "  Leaf size: {:?}, min points per voxel: {}",
        config.filter.leaf_size,
        config.filter.min_points_per_voxel
    );

    let grid = VoxelGrid::new(config.filter)?;

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

    let service = Arc::new(DownsampleService::new(
        grid,
        config.topics.clone(),
        serializer,
        publisher.handle(),
    ));

    let listener = TcpListener::bind(&config.network.inbound_address)?;
    log::info!("Accepting clouds on {}", config.network.inbound_address);

    accept_loop(listener, Arc::clone(&service), running)?;

    log::info!("Shutting down...");
    let dropped = publisher.handle().dropped_count();
    if dropped > 0 {
        log::warn!("Publisher queue overflowed, {} clouds dropped", dropped);
    }
    drop(publisher);
    log::info!("pcl-voxel stopped ({} clouds)", service.cloud_count());
    Ok(())
}
