//! Stereo relay combining timestamp arbitration, relabeling and odometry.
//!
//! # Usage
//!
//! ```ignore
//! use stereo_sync::{AppConfig, StereoRelay};
//!
//! let relay = StereoRelay::new(&AppConfig::default(), now_us())?;
//!
//! // From any receiver thread
//! for message in relay.handle(inbound) {
//!     router.publish(&message, &publisher)?;
//! }
//! ```
//!
//! The right image stream is the timing reference. Left images and both
//! camera infos are stamped with the latest reference instant; velocity
//! messages drive the pose integrator and yield the TF pair plus odometry.

use crate::config::{AppConfig, FrameConfig, StampSource};
use crate::core::types::{TfMessage, VelocityMessage, VelocitySample, now_us};
use crate::error::Result;
use crate::odometry::{PoseIntegrator, TransformEmitter};
use crate::streaming::{
    FrameHandler, Inbound, Outbound, PublisherHandle, Serializer, Side, TopicRouter,
};
use crate::sync::{TimestampArbiter, relabel};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared relay state. All methods take `&self`; safe to call from any thread.
pub struct StereoRelay {
    arbiter: Arc<TimestampArbiter>,
    integrator: Arc<Mutex<PoseIntegrator>>,
    emitter: TransformEmitter,
    frames: FrameConfig,
    reference_stamp: StampSource,
    velocity_stamp: StampSource,
    fallback_logged: AtomicBool,
}

impl StereoRelay {
    /// Create a relay whose integrator measures its first `dt` from `start_us`.
    ///
    /// Fails with `InvalidParameter` if the odometry constants are unusable.
    pub fn new(config: &AppConfig, start_us: u64) -> Result<Self> {
        config.odometry.validate()?;
        let integrator = PoseIntegrator::new((&config.odometry).into(), start_us)?;
        Ok(Self {
            arbiter: Arc::new(TimestampArbiter::new()),
            integrator: Arc::new(Mutex::new(integrator)),
            emitter: TransformEmitter::new(config.frames.clone(), &config.odometry),
            frames: config.frames.clone(),
            reference_stamp: config.sync.reference_stamp,
            velocity_stamp: config.odometry.stamp_source,
            fallback_logged: AtomicBool::new(false),
        })
    }

    /// Process one inbound record using the wall clock.
    pub fn handle(&self, inbound: Inbound) -> Vec<Outbound> {
        self.handle_at(inbound, now_us())
    }

    /// Process one inbound record received at `received_us`.
    pub fn handle_at(&self, inbound: Inbound, received_us: u64) -> Vec<Outbound> {
        match inbound {
            Inbound::Image(Side::Right, image) => {
                let stamp = select_stamp(self.reference_stamp, image.header.stamp_us, received_us);
                self.arbiter.observe_reference(stamp);
                log::trace!("Reference instant {}us", stamp);
                vec![Outbound::Image(
                    Side::Right,
                    relabel(&image, &self.frames.image, stamp),
                )]
            }
            Inbound::Image(Side::Left, image) => {
                let stamp = self.canonical_stamp(received_us);
                vec![Outbound::Image(
                    Side::Left,
                    relabel(&image, &self.frames.image, stamp),
                )]
            }
            Inbound::CameraInfo(side, info) => {
                let frame_id = match side {
                    Side::Right => &self.frames.right_camera_info,
                    Side::Left => &self.frames.left_camera_info,
                };
                let stamp = self.canonical_stamp(received_us);
                vec![Outbound::CameraInfo(side, relabel(&info, frame_id, stamp))]
            }
            Inbound::Velocity(message) => self.handle_velocity(&message, received_us),
        }
    }

    fn handle_velocity(&self, message: &VelocityMessage, received_us: u64) -> Vec<Outbound> {
        let stamp = select_stamp(self.velocity_stamp, message.header.stamp_us, received_us);
        let sample = VelocitySample::new(
            message.twist.linear.x,
            message.twist.angular.z,
            stamp,
        );

        let step = self.integrator.lock().integrate(&sample);
        if step.clamped || step.rejected {
            log::debug!(
                "Velocity sample at {}us left the pose unchanged (clamped={}, rejected={})",
                stamp,
                step.clamped,
                step.rejected
            );
        }

        let emission = self.emitter.emit(&step.pose, stamp, message.twist);
        vec![
            Outbound::Transforms(TfMessage {
                transforms: vec![emission.body, emission.mount],
            }),
            Outbound::Odometry(emission.odometry),
        ]
    }

    /// Latest reference instant, or `now_us` before the first right image.
    fn canonical_stamp(&self, now_us: u64) -> u64 {
        match self.arbiter.current() {
            Some(stamp) => stamp,
            None => {
                if !self.fallback_logged.swap(true, Ordering::Relaxed) {
                    log::debug!("No reference image yet, stamping with wall clock");
                }
                now_us
            }
        }
    }

    /// Shared handle to the timestamp arbiter.
    pub fn arbiter(&self) -> Arc<TimestampArbiter> {
        Arc::clone(&self.arbiter)
    }

    /// Shared handle to the pose integrator.
    pub fn integrator(&self) -> Arc<Mutex<PoseIntegrator>> {
        Arc::clone(&self.integrator)
    }
}

/// Producers that omit the header stamp send zero; those fall back to receipt time.
fn select_stamp(source: StampSource, message_us: u64, received_us: u64) -> u64 {
    match source {
        StampSource::Message if message_us != 0 => message_us,
        _ => received_us,
    }
}

/// Glue between the inbound receivers, the relay and the publisher.
pub struct RelayService {
    relay: StereoRelay,
    router: TopicRouter,
    serializer: Serializer,
    publisher: PublisherHandle,
    relayed: AtomicU64,
}

impl RelayService {
    pub fn new(
        relay: StereoRelay,
        router: TopicRouter,
        serializer: Serializer,
        publisher: PublisherHandle,
    ) -> Self {
        Self {
            relay,
            router,
            serializer,
            publisher,
            relayed: AtomicU64::new(0),
        }
    }

    pub fn relay(&self) -> &StereoRelay {
        &self.relay
    }

    /// Records published so far.
    pub fn relayed_count(&self) -> u64 {
        self.relayed.load(Ordering::Relaxed)
    }
}

impl FrameHandler for RelayService {
    fn handle_frame(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let Some(inbound) = self.router.decode(topic, payload, &self.serializer)? else {
            return Ok(());
        };

        for message in self.relay.handle(inbound) {
            self.router.publish(&message, &self.publisher)?;
            let relayed = self.relayed.fetch_add(1, Ordering::Relaxed) + 1;
            if relayed % 1000 == 0 {
                log::debug!("Relayed {} records", relayed);
            }
        }
        Ok(())
    }
}
