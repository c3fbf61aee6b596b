use crate::backend_interface::detection::DetectionBox;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a frame or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: f32,
    pub height: f32,
}

impl Resolution {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        (self.height > 0.0).then(|| self.width / self.height)
    }
}

/// Maps detection coordinates from detector resolution to display resolution.
///
/// Each axis scales independently. Callers that preserve the source aspect
/// ratio get uniform scaling; callers that do not get the distortion they
/// asked for.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateScaler {
    sx: f32,
    sy: f32,
}

impl CoordinateScaler {
    /// Identity scale until the source dimensions are known.
    pub fn new(source: Resolution, display: Resolution) -> Self {
        if source.width <= 0.0 || source.height <= 0.0 {
            return Self { sx: 1.0, sy: 1.0 };
        }
        Self {
            sx: display.width / source.width,
            sy: display.height / source.height,
        }
    }

    pub fn scale_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.sx, y * self.sy)
    }

    pub fn scale_box(&self, detection: &DetectionBox) -> DetectionBox {
        DetectionBox {
            x1: detection.x1 * self.sx,
            y1: detection.y1 * self.sy,
            x2: detection.x2 * self.sx,
            y2: detection.y2 * self.sy,
            class_name: detection.class_name.clone(),
            confidence: detection.confidence,
            track_id: detection.track_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection() -> DetectionBox {
        DetectionBox {
            x1: 10.0,
            y1: 20.0,
            x2: 110.0,
            y2: 220.0,
            class_name: "car".into(),
            confidence: 0.5,
            track_id: None,
        }
    }

    #[test]
    fn equal_dimensions_scale_as_identity() {
        let dims = Resolution::new(640.0, 480.0);
        let scaler = CoordinateScaler::new(dims, dims);
        assert_eq!(scaler.scale_box(&detection()), detection());
    }

    #[test]
    fn doubling_display_dimensions_doubles_coordinates() {
        let scaler = CoordinateScaler::new(
            Resolution::new(640.0, 480.0),
            Resolution::new(1280.0, 960.0),
        );
        let scaled = scaler.scale_box(&detection());
        assert_eq!(scaled.x1, 20.0);
        assert_eq!(scaled.y1, 40.0);
        assert_eq!(scaled.x2, 220.0);
        assert_eq!(scaled.y2, 440.0);
    }

    #[test]
    fn unknown_source_dimensions_fall_back_to_identity() {
        let scaler =
            CoordinateScaler::new(Resolution::new(0.0, 0.0), Resolution::new(1280.0, 960.0));
        assert_eq!(scaler.scale_point(12.0, 34.0), (12.0, 34.0));
    }

    #[test]
    fn axes_scale_independently() {
        let scaler = CoordinateScaler::new(
            Resolution::new(100.0, 100.0),
            Resolution::new(200.0, 50.0),
        );
        assert_eq!(scaler.scale_point(10.0, 10.0), (20.0, 5.0));
    }
}
