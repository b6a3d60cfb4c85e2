//! Relay Scenario Tests
//!
//! Drives `StereoRelay` with synthetic inbound streams and checks what would
//! be published:
//! - Frame labels on images and camera info
//! - Timestamp propagation from the right image stream
//! - Dead-reckoned transforms for straight and rotating motion
//!
//! Run with: `cargo test --test relay_scenarios`

use approx::assert_relative_eq;
use stereo_sync::AppConfig;
use stereo_sync::StereoRelay;
use stereo_sync::core::math::rpy_from_quaternion;
use stereo_sync::core::types::{
    CameraInfo, Header, Image, TransformRecord, Twist, Vector3, VelocityMessage,
};
use stereo_sync::streaming::{Inbound, Outbound, Side};

const SECOND: u64 = 1_000_000;
const INITIAL_HEADING: f64 = 1.57 - 1.57 / 4.0;

// ============================================================================
// Helpers
// ============================================================================

fn relay() -> StereoRelay {
    StereoRelay::new(&AppConfig::default(), 0).unwrap()
}

fn image(stamp_us: u64) -> Image {
    Image {
        header: Header::new(stamp_us, ""),
        height: 240,
        width: 320,
        encoding: "rgb8".to_string(),
        is_bigendian: 0,
        step: 960,
        data: vec![128; 16],
    }
}

fn velocity(linear_x: f64, angular_z: f64, stamp_us: u64) -> Inbound {
    Inbound::Velocity(VelocityMessage {
        header: Header::new(stamp_us, ""),
        twist: Twist {
            linear: Vector3::new(linear_x, 0.0, 0.0),
            angular: Vector3::new(0.0, 0.0, angular_z),
        },
    })
}

fn single(out: Vec<Outbound>) -> Outbound {
    assert_eq!(out.len(), 1, "expected exactly one output");
    out.into_iter().next().unwrap()
}

fn body_transform(out: &[Outbound]) -> &TransformRecord {
    match out.first() {
        Some(Outbound::Transforms(tf)) => &tf.transforms[0],
        other => panic!("expected transforms, got {:?}", other),
    }
}

// ============================================================================
// Timestamp and frame label propagation
// ============================================================================

#[test]
fn test_right_image_stamp_reaches_camera_info() {
    let relay = relay();

    relay.handle_at(Inbound::Image(Side::Right, image(0)), 10 * SECOND);
    let out = single(relay.handle_at(
        Inbound::CameraInfo(Side::Right, CameraInfo::default()),
        11 * SECOND,
    ));

    let Outbound::CameraInfo(Side::Right, info) = out else {
        panic!("expected right camera info");
    };
    assert_eq!(info.header.stamp_us, 10 * SECOND);
    assert_eq!(info.header.frame_id, "right");
}

#[test]
fn test_frame_labels() {
    let relay = relay();

    let right = single(relay.handle_at(Inbound::Image(Side::Right, image(0)), SECOND));
    let left = single(relay.handle_at(Inbound::Image(Side::Left, image(0)), SECOND + 5));
    let right_info = single(relay.handle_at(
        Inbound::CameraInfo(Side::Right, CameraInfo::default()),
        SECOND + 6,
    ));
    let left_info = single(relay.handle_at(
        Inbound::CameraInfo(Side::Left, CameraInfo::default()),
        SECOND + 7,
    ));

    match (right, left, right_info, left_info) {
        (
            Outbound::Image(Side::Right, r),
            Outbound::Image(Side::Left, l),
            Outbound::CameraInfo(Side::Right, ri),
            Outbound::CameraInfo(Side::Left, li),
        ) => {
            assert_eq!(r.header.frame_id, "stereo");
            assert_eq!(l.header.frame_id, "stereo");
            assert_eq!(ri.header.frame_id, "right");
            assert_eq!(li.header.frame_id, "stereo");

            // All four share the reference instant
            for stamp in [
                r.header.stamp_us,
                l.header.stamp_us,
                ri.header.stamp_us,
                li.header.stamp_us,
            ] {
                assert_eq!(stamp, SECOND);
            }
        }
        other => panic!("unexpected outputs {:?}", other),
    }
}

#[test]
fn test_latest_reference_wins() {
    let relay = relay();
    relay.handle_at(Inbound::Image(Side::Right, image(0)), SECOND);
    relay.handle_at(Inbound::Image(Side::Right, image(0)), 3 * SECOND);

    let Outbound::Image(_, left) =
        single(relay.handle_at(Inbound::Image(Side::Left, image(0)), 4 * SECOND))
    else {
        panic!("expected left image");
    };
    assert_eq!(left.header.stamp_us, 3 * SECOND);
}

#[test]
fn test_image_payload_untouched() {
    let relay = relay();
    let input = image(42);
    let Outbound::Image(_, out) =
        single(relay.handle_at(Inbound::Image(Side::Left, input.clone()), SECOND))
    else {
        panic!("expected image");
    };
    assert_eq!(out.data, input.data);
    assert_eq!(out.encoding, input.encoding);
    assert_eq!(out.step, input.step);
}

// ============================================================================
// Dead reckoning through the relay
// ============================================================================

#[test]
fn test_straight_motion_scenario() {
    let relay = relay();
    let out = relay.handle_at(velocity(230.0, 0.0, SECOND), 0);

    let body = body_transform(&out);
    assert_relative_eq!(body.translation.x, INITIAL_HEADING.cos(), epsilon = 1e-12);
    assert_relative_eq!(body.translation.y, INITIAL_HEADING.sin(), epsilon = 1e-12);
    let (_, _, yaw) = rpy_from_quaternion(&body.rotation);
    assert_relative_eq!(yaw, INITIAL_HEADING, epsilon = 1e-9);
}

#[test]
fn test_rotation_scenario() {
    let relay = relay();
    let out = relay.handle_at(velocity(500.0, 0.2, SECOND / 2), 0);

    let body = body_transform(&out);
    assert_eq!(body.translation, Vector3::zero());
    let (_, _, yaw) = rpy_from_quaternion(&body.rotation);
    assert_relative_eq!(yaw, INITIAL_HEADING + 0.1, epsilon = 1e-9);
}

#[test]
fn test_out_of_order_velocity_does_not_move_pose() {
    let relay = relay();
    relay.handle_at(velocity(230.0, 0.0, 2 * SECOND), 0);
    let before = relay.integrator().lock().pose();

    relay.handle_at(velocity(230.0, 0.0, SECOND), 0);
    let integrator = relay.integrator();
    let integrator = integrator.lock();
    assert_eq!(integrator.pose(), before);
    assert_eq!(integrator.clamped_count(), 1);
}

#[test]
fn test_mount_transform_static_across_updates() {
    let relay = relay();
    let first = relay.handle_at(velocity(230.0, 0.0, SECOND), 0);
    let second = relay.handle_at(velocity(0.0, 1.0, 3 * SECOND), 0);

    let mount = |out: &[Outbound]| match out.first() {
        Some(Outbound::Transforms(tf)) => tf.transforms[1].clone(),
        other => panic!("expected transforms, got {:?}", other),
    };
    let a = mount(&first);
    let b = mount(&second);
    assert_eq!(a.translation, b.translation);
    assert_eq!(a.rotation, b.rotation);
    assert_eq!(a.parent_frame, "miro_robot__miro_head__eyelid_lh");
    assert_ne!(a.stamp_us, b.stamp_us);
}

#[test]
fn test_odometry_pinned_to_mount() {
    let relay = relay();
    let out = relay.handle_at(velocity(230.0, 0.0, 5 * SECOND), 0);

    match &out[..] {
        [Outbound::Transforms(tf), Outbound::Odometry(odom)] => {
            assert_eq!(odom.pose.position, Vector3::new(0.0, 0.0, 0.25));
            assert_eq!(odom.pose.orientation, tf.transforms[1].rotation);
            assert_eq!(odom.header.frame_id, "map");
            assert_eq!(odom.child_frame_id, "stereo");
            assert_eq!(odom.header.stamp_us, 5 * SECOND);
        }
        other => panic!("unexpected outputs {:?}", other),
    }
}
