use crate::generator::scenario::ScenarioConfig;
use crate::generator::synthetic;
use log::info;
use overlaycore::backend_interface::WireDetection;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

/// One synthetic job advancing through the task lifecycle.
struct SimJob {
    percent: u8,
    polled: bool,
    revoked: bool,
    use_heatmap: bool,
    frames: Vec<Vec<WireDetection>>,
    heatmap_frames: Vec<String>,
    object_frequency: BTreeMap<String, u64>,
}

/// Drives every submitted job through Pending, Progress, and a terminal
/// state, one step per status poll. Responses use the same wire shapes
/// the real backend emits, so the viewer's decoder is exercised end to
/// end.
pub struct JobEngine {
    config: ScenarioConfig,
    jobs: HashMap<String, SimJob>,
    next_id: usize,
}

impl JobEngine {
    pub fn new(config: ScenarioConfig) -> Self {
        Self {
            config,
            jobs: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn submit(&mut self, use_heatmap: bool) -> anyhow::Result<String> {
        let id = format!("job-{:04}", self.next_id);
        self.next_id += 1;

        let heatmap_frames = if use_heatmap {
            synthetic::build_heatmap_frames(&self.config)?
        } else {
            Vec::new()
        };

        self.jobs.insert(
            id.clone(),
            SimJob {
                percent: 0,
                polled: false,
                revoked: false,
                use_heatmap,
                frames: synthetic::build_result_frames(&self.config),
                heatmap_frames,
                object_frequency: synthetic::object_frequency(&self.config),
            },
        );
        info!("submitted {} (heatmap: {})", id, use_heatmap);
        Ok(id)
    }

    /// Flags a job for cancellation; reported on the next poll.
    pub fn revoke(&mut self, id: &str) -> bool {
        match self.jobs.get_mut(id) {
            Some(job) => {
                job.revoked = true;
                info!("revoked {}", id);
                true
            }
            None => false,
        }
    }

    /// Builds the raw status response, advancing the job one step.
    pub fn poll(&mut self, id: &str) -> Value {
        let step = self.config.normalized_step();
        let Some(job) = self.jobs.get_mut(id) else {
            // Unknown ids report Pending, matching the real result backend.
            return json!({"state": "PENDING", "status": "Pending..."});
        };

        if job.revoked {
            return json!({"state": "REVOKED", "status": "Task was cancelled by user"});
        }

        if !job.polled {
            job.polled = true;
            return json!({"state": "PENDING", "status": "Pending..."});
        }

        job.percent = job.percent.saturating_add(step).min(100);
        let total = job.frames.len();

        if job.percent < 100 {
            let visible = total * job.percent as usize / 100;
            json!({
                "state": "PROGRESS",
                "status": {
                    "percent": job.percent,
                    "status": format!("Processing frame {visible}"),
                    "results": &job.frames[..visible],
                    "width": self.config.detector_width,
                    "height": self.config.detector_height,
                }
            })
        } else {
            json!({
                "state": "SUCCESS",
                "status": {
                    "percent": 100,
                    "status": "Processing complete",
                    "results": &job.frames,
                    "object_frequency": &job.object_frequency,
                    "use_heatmap": job.use_heatmap,
                    "heatmap_frames": &job.heatmap_frames,
                    "heatmap_analysis": {
                        "peak_movement_time": total as f64 * 0.8,
                        "average_intensity": 52.0,
                        "movement_duration": total as f64 * 0.9,
                        "total_duration": total as f64,
                    },
                    "width": self.config.detector_width,
                    "height": self.config.detector_height,
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlaycore::backend_interface::{JobStatus, RawStatusResponse};

    fn decode(value: Value) -> JobStatus {
        serde_json::from_value::<RawStatusResponse>(value)
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn job_advances_from_pending_to_success() {
        let mut engine = JobEngine::new(ScenarioConfig::default());
        let id = engine.submit(false).unwrap();

        assert!(matches!(decode(engine.poll(&id)), JobStatus::Pending));
        let mut polls = 0;
        loop {
            let status = decode(engine.poll(&id));
            polls += 1;
            assert!(polls < 20, "job never finished");
            match status {
                JobStatus::Progress { percent, .. } => assert!(percent < 100),
                JobStatus::Success { payload } => {
                    assert_eq!(payload.results.unwrap().len(), 10);
                    assert!(payload.object_frequency.is_some());
                    break;
                }
                other => panic!("unexpected status {other:?}"),
            }
        }
    }

    #[test]
    fn progress_reveals_a_growing_prefix() {
        let mut engine = JobEngine::new(ScenarioConfig::default());
        let id = engine.submit(false).unwrap();
        engine.poll(&id);

        let first = decode(engine.poll(&id));
        let second = decode(engine.poll(&id));
        let visible = |status: &JobStatus| match status {
            JobStatus::Progress { payload, .. } => {
                payload.results.as_ref().map(|seq| seq.len()).unwrap_or(0)
            }
            _ => panic!("expected progress"),
        };
        assert!(visible(&second) > visible(&first));
    }

    #[test]
    fn revoked_job_reports_cancelled_on_next_poll() {
        let mut engine = JobEngine::new(ScenarioConfig::default());
        let id = engine.submit(false).unwrap();
        engine.poll(&id);
        engine.poll(&id);
        assert!(engine.revoke(&id));
        assert!(matches!(decode(engine.poll(&id)), JobStatus::Cancelled));
    }

    #[test]
    fn unknown_job_reports_pending() {
        let mut engine = JobEngine::new(ScenarioConfig::default());
        assert!(matches!(decode(engine.poll("nope")), JobStatus::Pending));
        assert!(!engine.revoke("nope"));
    }

    #[test]
    fn heatmap_frames_are_only_built_when_requested() {
        let mut engine = JobEngine::new(ScenarioConfig {
            sample_frames: 2,
            percent_step: 100,
            ..Default::default()
        });
        let plain = engine.submit(false).unwrap();
        let heat = engine.submit(true).unwrap();
        for id in [&plain, &heat] {
            engine.poll(id);
        }
        let plain_status = decode(engine.poll(&plain));
        let heat_status = decode(engine.poll(&heat));
        match (plain_status, heat_status) {
            (JobStatus::Success { payload: a }, JobStatus::Success { payload: b }) => {
                assert!(a.heatmap_frames.is_empty());
                assert_eq!(b.heatmap_frames.len(), 2);
                assert!(b.use_heatmap);
            }
            other => panic!("expected two successes, got {other:?}"),
        }
    }
}
