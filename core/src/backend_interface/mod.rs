pub mod detection;
pub mod status;

pub use detection::{DetectionBox, DetectionFrame, ResultSequence, WireDetection};
pub use status::{HeatmapAnalysis, JobStatus, RawStatusResponse, ResultPayload, VideoInfo};
