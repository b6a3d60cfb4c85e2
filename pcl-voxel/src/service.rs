//! Frame handler that decimates each inbound cloud and republishes it.

use crate::cloud::PointCloud;
use crate::config::TopicConfig;
use crate::voxel_grid::VoxelGrid;
use std::sync::atomic::{AtomicU64, Ordering};
use stereo_sync::streaming::{FrameHandler, PublisherHandle, Serializer};

pub struct DownsampleService {
    grid: VoxelGrid,
    topics: TopicConfig,
    serializer: Serializer,
    publisher: PublisherHandle,
    clouds: AtomicU64,
}

impl DownsampleService {
    pub fn new(
        grid: VoxelGrid,
        topics: TopicConfig,
        serializer: Serializer,
        publisher: PublisherHandle,
    ) -> Self {
        Self {
            grid,
            topics,
            serializer,
            publisher,
            clouds: AtomicU64::new(0),
        }
    }

    /// Clouds decimated so far.
    pub fn cloud_count(&self) -> u64 {
        self.clouds.load(Ordering::Relaxed)
    }
}

impl FrameHandler for DownsampleService {
    fn handle_frame(&self, topic: &str, payload: &[u8]) -> stereo_sync::Result<()> {
        if topic != self.topics.input {
            log::debug!("Ignoring frame on unknown topic {}", topic);
            return Ok(());
        }

        let cloud: PointCloud = self.serializer.deserialize(payload)?;
        let downsampled = self.grid.filter(&cloud);
        log::debug!(
            "Downsampled {} -> {} points ({:.1}%)",
            cloud.len(),
            downsampled.len(),
            if cloud.is_empty() {
                100.0
            } else {
                downsampled.len() as f64 / cloud.len() as f64 * 100.0
            }
        );

        self.publisher.publish(&self.topics.output, &downsampled)?;
        self.clouds.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
