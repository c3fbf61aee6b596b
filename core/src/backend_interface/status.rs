use crate::backend_interface::detection::{ResultSequence, WireDetection};
use crate::mapping::Resolution;
use crate::prelude::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw `task_status` response before normalization.
///
/// The backend sends `status` either as a bare string (pending, revoked,
/// failure text) or as a dictionary of progress fields. Everything dynamic
/// is decoded here, once; downstream code only sees [`JobStatus`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusResponse {
    pub state: String,
    #[serde(default)]
    pub status: Option<RawStatusBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawStatusBody {
    Message(String),
    Detail(Box<RawStatusDetail>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatusDetail {
    #[serde(default)]
    pub percent: Option<f32>,
    #[serde(default, alias = "status")]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<Vec<WireDetection>>>,
    #[serde(default)]
    pub object_frequency: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub use_heatmap: Option<bool>,
    #[serde(default)]
    pub heatmap_frames: Option<Vec<String>>,
    #[serde(default)]
    pub heatmap_analysis: Option<HeatmapAnalysis>,
    #[serde(default, alias = "preprocessed_width")]
    pub width: Option<u32>,
    #[serde(default, alias = "preprocessed_height")]
    pub height: Option<u32>,
}

/// Summary statistics of the heatmap pass, reported with final results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapAnalysis {
    #[serde(default)]
    pub peak_movement_time: f64,
    #[serde(default)]
    pub average_intensity: f64,
    #[serde(default)]
    pub movement_duration: f64,
    #[serde(default)]
    pub total_duration: f64,
}

/// Result fields carried by Progress and Success responses.
#[derive(Debug, Clone, Default)]
pub struct ResultPayload {
    pub results: Option<ResultSequence>,
    pub object_frequency: Option<BTreeMap<String, u64>>,
    pub heatmap_frames: Vec<String>,
    pub heatmap_analysis: Option<HeatmapAnalysis>,
    pub use_heatmap: bool,
    pub detector_resolution: Option<Resolution>,
}

impl ResultPayload {
    fn from_detail(detail: RawStatusDetail) -> Self {
        let detector_resolution = match (detail.width, detail.height) {
            (Some(width), Some(height)) => Some(Resolution::new(width as f32, height as f32)),
            _ => None,
        };
        Self {
            results: detail.results.map(ResultSequence::from_wire),
            object_frequency: detail.object_frequency,
            heatmap_frames: detail.heatmap_frames.unwrap_or_default(),
            heatmap_analysis: detail.heatmap_analysis,
            use_heatmap: detail.use_heatmap.unwrap_or(false),
            detector_resolution,
        }
    }
}

/// Normalized job status. Success, Failure, and Cancelled are terminal.
#[derive(Debug, Clone, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Progress {
        percent: u8,
        message: String,
        payload: ResultPayload,
    },
    Success {
        payload: ResultPayload,
    },
    Failure {
        message: String,
    },
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Success { .. } | JobStatus::Failure { .. } | JobStatus::Cancelled
        )
    }

    pub fn percent(&self) -> Option<u8> {
        match self {
            JobStatus::Progress { percent, .. } => Some(*percent),
            JobStatus::Success { .. } => Some(100),
            _ => None,
        }
    }

    pub fn state_label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Progress { .. } => "running",
            JobStatus::Success { .. } => "finished",
            JobStatus::Failure { .. } => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl RawStatusResponse {
    pub fn decode(self) -> SyncResult<JobStatus> {
        let (message, detail) = match self.status {
            Some(RawStatusBody::Message(text)) => (text, RawStatusDetail::default()),
            Some(RawStatusBody::Detail(detail)) => {
                (detail.message.clone().unwrap_or_default(), *detail)
            }
            None => (String::new(), RawStatusDetail::default()),
        };

        match self.state.as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "STARTED" | "PROGRESS" => {
                let percent = detail
                    .percent
                    .map(|value| value.clamp(0.0, 100.0).round() as u8)
                    .unwrap_or(0);
                Ok(JobStatus::Progress {
                    percent,
                    message,
                    payload: ResultPayload::from_detail(detail),
                })
            }
            "SUCCESS" => Ok(JobStatus::Success {
                payload: ResultPayload::from_detail(detail),
            }),
            "FAILURE" => Ok(JobStatus::Failure { message }),
            "REVOKED" => Ok(JobStatus::Cancelled),
            other => Err(SyncError::Decode(format!("unknown task state {other:?}"))),
        }
    }
}

/// Playback endpoints for a finished job, consumed as opaque URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub hls_url: Option<String>,
    pub stream_url: String,
    pub mime_type: String,
}
