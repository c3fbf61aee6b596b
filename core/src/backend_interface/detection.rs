use crate::prelude::SampledSequence;
use serde::{Deserialize, Serialize};

/// Recognized-object box in detector-resolution pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_name: String,
    pub confidence: f32,
    pub track_id: Option<u64>,
}

impl DetectionBox {
    /// Overlay label text: class, confidence to two places, optional track id.
    pub fn label(&self) -> String {
        match self.track_id {
            Some(id) => format!("{} {:.2} (ID: {})", self.class_name, self.confidence, id),
            None => format!("{} {:.2}", self.class_name, self.confidence),
        }
    }
}

/// Detection as it appears on the wire: coordinates packed into an array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireDetection {
    pub class_name: String,
    pub confidence: f32,
    #[serde(rename = "box", default)]
    pub coords: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u64>,
}

impl WireDetection {
    /// Unpacks the coordinate array. A box with the wrong coordinate count
    /// is dropped here, individually, so the rest of the frame survives.
    pub fn into_detection(self) -> Option<DetectionBox> {
        if self.coords.len() != 4 {
            return None;
        }
        Some(DetectionBox {
            x1: self.coords[0],
            y1: self.coords[1],
            x2: self.coords[2],
            y2: self.coords[3],
            class_name: self.class_name,
            confidence: self.confidence,
            track_id: self.track_id,
        })
    }
}

/// All boxes recognized in one sampled video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub boxes: Vec<DetectionBox>,
}

/// Ordered detection frames, one per sampled frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSequence {
    frames: Vec<DetectionFrame>,
}

impl ResultSequence {
    pub fn new(frames: Vec<DetectionFrame>) -> Self {
        Self { frames }
    }

    /// Decodes the backend's nested array form, dropping malformed boxes.
    pub fn from_wire(wire: Vec<Vec<WireDetection>>) -> Self {
        let frames = wire
            .into_iter()
            .map(|frame| DetectionFrame {
                boxes: frame
                    .into_iter()
                    .filter_map(WireDetection::into_detection)
                    .collect(),
            })
            .collect();
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&DetectionFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[DetectionFrame] {
        &self.frames
    }

    /// Class labels in observation order, deduplicated.
    pub fn observed_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for frame in &self.frames {
            for detection in &frame.boxes {
                if !labels.iter().any(|label| label == &detection.class_name) {
                    labels.push(detection.class_name.clone());
                }
            }
        }
        labels
    }
}

impl SampledSequence for ResultSequence {
    fn sample_len(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(class: &str, coords: Vec<f32>) -> WireDetection {
        WireDetection {
            class_name: class.into(),
            confidence: 0.9,
            coords,
            track_id: None,
        }
    }

    #[test]
    fn malformed_box_is_skipped_without_dropping_the_frame() {
        let sequence = ResultSequence::from_wire(vec![vec![
            wire("person", vec![0.0, 0.0, 10.0, 10.0]),
            wire("car", vec![1.0, 2.0, 3.0]),
            wire("person", vec![5.0, 5.0, 9.0, 9.0]),
        ]]);
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.frame(0).unwrap().boxes.len(), 2);
    }

    #[test]
    fn label_includes_track_id_when_present() {
        let mut detection = wire("person", vec![0.0, 0.0, 1.0, 1.0])
            .into_detection()
            .unwrap();
        assert_eq!(detection.label(), "person 0.90");
        detection.track_id = Some(7);
        assert_eq!(detection.label(), "person 0.90 (ID: 7)");
    }

    #[test]
    fn observed_labels_keep_first_seen_order() {
        let sequence = ResultSequence::from_wire(vec![
            vec![wire("car", vec![0.0; 4]), wire("person", vec![0.0; 4])],
            vec![wire("car", vec![0.0; 4]), wire("bench", vec![0.0; 4])],
        ]);
        assert_eq!(sequence.observed_labels(), vec!["car", "person", "bench"]);
    }
}
