//! Header rewrite for relayed records.

use crate::core::types::Stamped;

/// Copy of `record` with its frame and stamp replaced.
///
/// Every other field, including the header sequence number, is preserved
/// unchanged.
pub fn relabel<T: Stamped + Clone>(record: &T, frame_id: &str, stamp_us: u64) -> T {
    let mut out = record.clone();
    let header = out.header_mut();
    header.stamp_us = stamp_us;
    header.frame_id.clear();
    header.frame_id.push_str(frame_id);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CameraInfo, Header, Image, RegionOfInterest};

    fn sample_image() -> Image {
        Image {
            header: Header {
                seq: 17,
                stamp_us: 5,
                frame_id: String::new(),
            },
            height: 2,
            width: 3,
            encoding: "rgb8".to_string(),
            is_bigendian: 0,
            step: 9,
            data: (0..18).collect(),
        }
    }

    fn sample_camera_info() -> CameraInfo {
        CameraInfo {
            header: Header::new(9, "yaml"),
            height: 240,
            width: 320,
            distortion_model: "plumb_bob".to_string(),
            d: vec![0.1, -0.2, 0.0, 0.0, 0.0],
            k: [300.0, 0.0, 160.0, 0.0, 300.0, 120.0, 0.0, 0.0, 1.0],
            r: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            p: [
                300.0, 0.0, 160.0, -30.0, 0.0, 300.0, 120.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            ],
            binning_x: 1,
            binning_y: 1,
            roi: RegionOfInterest {
                x_offset: 60,
                y_offset: 0,
                height: 240,
                width: 140,
                do_rectify: false,
            },
        }
    }

    #[test]
    fn test_overwrites_header_only() {
        let input = sample_image();
        let out = relabel(&input, "stereo", 1_234);

        assert_eq!(out.header.frame_id, "stereo");
        assert_eq!(out.header.stamp_us, 1_234);
        assert_eq!(out.header.seq, input.header.seq);
        assert_eq!(out.data, input.data);
        assert_eq!(out.encoding, input.encoding);
        assert_eq!((out.height, out.width, out.step), (2, 3, 9));
    }

    #[test]
    fn test_input_untouched() {
        let input = sample_camera_info();
        let _ = relabel(&input, "right", 77);
        assert_eq!(input, sample_camera_info());
    }

    #[test]
    fn test_idempotent() {
        let input = sample_camera_info();
        let once = relabel(&input, "right", 77);
        let twice = relabel(&once, "right", 77);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_calibration_preserved() {
        let input = sample_camera_info();
        let mut out = relabel(&input, "stereo", 1);
        out.header = input.header.clone();
        assert_eq!(out, input);
    }
}
