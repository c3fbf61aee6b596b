use crate::backend_interface::detection::ResultSequence;
use crate::backend_interface::status::{HeatmapAnalysis, JobStatus, ResultPayload};
use crate::mapping::{CoordinateScaler, Resolution};
use crate::palette::ColorAllocator;
use crate::polling::poller::{PollDirective, TaskStatusPoller};
use crate::telemetry::MetricsRecorder;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One submitted job and everything its views read.
#[derive(Debug)]
pub struct Job {
    id: String,
    pub poller: TaskStatusPoller,
    results: Arc<ResultSequence>,
    pub palette: ColorAllocator,
    pub object_frequency: BTreeMap<String, u64>,
    pub heatmap_frames: Vec<String>,
    pub heatmap_analysis: Option<HeatmapAnalysis>,
    pub use_heatmap: bool,
    pub detector_resolution: Option<Resolution>,
}

impl Job {
    fn new(id: String) -> Self {
        Self {
            poller: TaskStatusPoller::new(id.clone()),
            id,
            results: Arc::new(ResultSequence::default()),
            palette: ColorAllocator::new(),
            object_frequency: BTreeMap::new(),
            heatmap_frames: Vec::new(),
            heatmap_analysis: None,
            use_heatmap: false,
            detector_resolution: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Shared handle to the current sequence. Poll responses replace the
    /// whole Arc, so a draw tick sees either the fully-old or fully-new
    /// results, never a half-written one.
    pub fn results(&self) -> Arc<ResultSequence> {
        Arc::clone(&self.results)
    }

    pub fn scaler_for(&self, display: Resolution) -> CoordinateScaler {
        let source = self
            .detector_resolution
            .unwrap_or(Resolution::new(0.0, 0.0));
        CoordinateScaler::new(source, display)
    }

    fn merge_payload(&mut self, payload: ResultPayload) {
        if let Some(results) = payload.results {
            for label in results.observed_labels() {
                self.palette.ensure(&label);
            }
            self.results = Arc::new(results);
        }
        if let Some(frequency) = payload.object_frequency {
            self.object_frequency = frequency;
        }
        if !payload.heatmap_frames.is_empty() {
            self.heatmap_frames = payload.heatmap_frames;
        }
        if payload.heatmap_analysis.is_some() {
            self.heatmap_analysis = payload.heatmap_analysis;
        }
        if payload.detector_resolution.is_some() {
            self.detector_resolution = payload.detector_resolution;
        }
        self.use_heatmap |= payload.use_heatmap;
    }

    /// A revoked job takes its partial results with it.
    fn clear_partial(&mut self) {
        self.results = Arc::new(ResultSequence::default());
        self.object_frequency.clear();
        self.heatmap_frames.clear();
        self.heatmap_analysis = None;
    }
}

/// Owned store of all submitted jobs, keyed by job id.
///
/// The renderer reads colors, the allocator writes them, and the poller
/// writes results; routing every update through this store keeps those
/// writers from racing each other through shared mutable state.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: BTreeMap<String, Job>,
    metrics: MetricsRecorder,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a submitted job. Re-inserting an id is a no-op so an
    /// accidental double submission cannot spawn a second poller.
    pub fn insert(&mut self, id: &str) -> &mut Job {
        self.jobs
            .entry(id.to_string())
            .or_insert_with(|| Job::new(id.to_string()))
    }

    /// Drops the job and with it the poller and status state.
    pub fn remove(&mut self, id: &str) -> Option<Job> {
        self.jobs.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn jobs_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.values_mut()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Folds a decoded poll response into the job. Partial results merge
    /// immediately (progressive reveal); a Success merges the final
    /// payload; an observed Cancelled clears everything merged so far.
    pub fn apply_status(&mut self, id: &str, status: JobStatus) -> Option<PollDirective> {
        let job = self.jobs.get_mut(id)?;
        if job.poller.is_terminal() {
            return Some(job.poller.on_response(&status));
        }
        let directive = job.poller.on_response(&status);
        match status {
            JobStatus::Progress { payload, .. } | JobStatus::Success { payload } => {
                job.merge_payload(payload);
            }
            JobStatus::Cancelled => job.clear_partial(),
            JobStatus::Pending | JobStatus::Failure { .. } => {}
        }
        self.metrics.record_poll();
        Some(directive)
    }

    /// Transient poll failure; recorded but never terminal.
    pub fn apply_error(&mut self, id: &str, message: impl Into<String>) -> Option<PollDirective> {
        let job = self.jobs.get_mut(id)?;
        self.metrics.record_poll_error();
        Some(job.poller.on_error(message))
    }

    pub fn set_color_override(&mut self, id: &str, label: &str, hue: f32) {
        if let Some(job) = self.jobs.get_mut(id) {
            job.palette.set_override(label, hue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend_interface::detection::WireDetection;

    fn frames(count: usize) -> Vec<Vec<WireDetection>> {
        (0..count)
            .map(|i| {
                vec![WireDetection {
                    class_name: if i % 2 == 0 { "person" } else { "car" }.into(),
                    confidence: 0.9,
                    coords: vec![0.0, 0.0, 10.0, 10.0],
                    track_id: None,
                }]
            })
            .collect()
    }

    fn progress(percent: u8, count: usize) -> JobStatus {
        JobStatus::Progress {
            percent,
            message: String::new(),
            payload: ResultPayload {
                results: Some(ResultSequence::from_wire(frames(count))),
                ..ResultPayload::default()
            },
        }
    }

    #[test]
    fn partial_results_are_visible_before_success() {
        let mut store = JobStore::new();
        store.insert("job-1");

        let directive = store.apply_status("job-1", progress(40, 4)).unwrap();
        assert_eq!(directive, PollDirective::Continue);
        assert_eq!(store.get("job-1").unwrap().results().len(), 4);
    }

    #[test]
    fn progressive_reveal_ends_with_full_results_and_stopped_polling() {
        let mut store = JobStore::new();
        store.insert("job-1");

        store.apply_status("job-1", progress(40, 4));
        store.apply_status("job-1", progress(70, 7));
        let final_status = JobStatus::Success {
            payload: ResultPayload {
                results: Some(ResultSequence::from_wire(frames(10))),
                ..ResultPayload::default()
            },
        };
        let directive = store.apply_status("job-1", final_status).unwrap();

        assert_eq!(directive, PollDirective::Stop);
        let job = store.get("job-1").unwrap();
        assert_eq!(job.results().len(), 10);
        assert!(!job.poller.is_active());
    }

    #[test]
    fn observed_cancellation_clears_merged_partials() {
        let mut store = JobStore::new();
        store.insert("job-1");
        store.apply_status("job-1", progress(40, 4));
        store.get_mut("job-1").unwrap().poller.note_cancel_requested();

        let directive = store.apply_status("job-1", JobStatus::Cancelled).unwrap();
        assert_eq!(directive, PollDirective::Stop);
        let job = store.get("job-1").unwrap();
        assert!(job.results().is_empty());
        assert!(job.object_frequency.is_empty());
    }

    #[test]
    fn newly_observed_labels_are_colored_at_merge_time() {
        let mut store = JobStore::new();
        store.insert("job-1");
        store.apply_status("job-1", progress(40, 4));

        let job = store.get("job-1").unwrap();
        assert!(job.palette.get("person").is_some());
        assert!(job.palette.get("car").is_some());
    }

    #[test]
    fn color_override_survives_later_merges() {
        let mut store = JobStore::new();
        store.insert("job-1");
        store.apply_status("job-1", progress(40, 4));
        store.set_color_override("job-1", "person", 300.0);
        store.apply_status("job-1", progress(70, 7));

        let job = store.get("job-1").unwrap();
        assert_eq!(job.palette.get("person").unwrap().hue, 300.0);
    }

    #[test]
    fn reinserting_a_job_id_is_a_no_op() {
        let mut store = JobStore::new();
        store.insert("job-1");
        store.apply_status("job-1", progress(40, 4));
        store.insert("job-1");
        assert_eq!(store.get("job-1").unwrap().results().len(), 4);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removing_a_job_destroys_its_state() {
        let mut store = JobStore::new();
        store.insert("job-1");
        store.apply_status("job-1", progress(40, 4));
        assert!(store.remove("job-1").is_some());
        assert!(store.apply_status("job-1", progress(50, 5)).is_none());
    }

    #[test]
    fn results_are_replaced_wholesale_not_mutated() {
        let mut store = JobStore::new();
        store.insert("job-1");
        store.apply_status("job-1", progress(40, 4));
        let old_handle = store.get("job-1").unwrap().results();
        store.apply_status("job-1", progress(70, 7));
        // The handle taken before the merge still sees the old sequence.
        assert_eq!(old_handle.len(), 4);
        assert_eq!(store.get("job-1").unwrap().results().len(), 7);
    }
}
