use base64::Engine;
use iced::time::Instant;
use iced::widget::canvas;
use iced::widget::image::Handle;
use log::warn;
use overlaycore::backend_interface::HeatmapAnalysis;
use overlaycore::mapping::Resolution;
use overlaycore::playback::{FramePlan, HeatmapSequencer, OverlayPlanner, SourceLadder};

/// Canvas pixel width; height follows the source aspect ratio.
pub const DISPLAY_WIDTH: f32 = 640.0;

/// Per-job view state: the playback clock, the draw plan, and the decoded
/// heatmap overlay frames. Result data itself lives in the job store.
pub struct JobSession {
    pub id: String,
    pub playing: bool,
    pub position: f64,
    pub duration: f64,
    pub plan: Option<FramePlan>,
    pub planner: OverlayPlanner,
    pub cache: canvas::Cache,
    pub sequencer: HeatmapSequencer,
    pub heatmap_handles: Vec<Handle>,
    pub heatmap_source: Option<Resolution>,
    pub current_heatmap: Option<usize>,
    pub ladder: Option<SourceLadder>,
    pub started: Instant,
    last_tick: Option<Instant>,
}

impl JobSession {
    pub fn new(id: String) -> Self {
        Self {
            id,
            playing: false,
            position: 0.0,
            duration: 0.0,
            plan: None,
            planner: OverlayPlanner::new(),
            cache: canvas::Cache::default(),
            sequencer: HeatmapSequencer::default(),
            heatmap_handles: Vec::new(),
            heatmap_source: None,
            current_heatmap: None,
            ladder: None,
            started: Instant::now(),
            last_tick: None,
        }
    }

    /// Playback duration in seconds. The backend reports the real
    /// duration with the heatmap analysis; until then one sampled frame
    /// counts as one second, which keeps the mapping exercised while the
    /// clock is provisional.
    pub fn sync_duration(&mut self, sample_count: usize, analysis: Option<&HeatmapAnalysis>) {
        self.duration = match analysis {
            Some(analysis) if analysis.total_duration > 0.0 => analysis.total_duration,
            _ => sample_count as f64,
        };
    }

    /// Advances the playback clock from the previous redraw tick.
    pub fn advance_clock(&mut self, now: Instant) {
        if self.playing {
            if let Some(last) = self.last_tick {
                self.position += now.duration_since(last).as_secs_f64();
                if self.duration > 0.0 && self.position >= self.duration {
                    self.position = self.duration;
                    self.playing = false;
                }
            }
        }
        self.last_tick = Some(now);
    }

    /// Returns whether the session is now playing.
    pub fn toggle_playback(&mut self) -> bool {
        self.playing = !self.playing;
        if self.playing && self.duration > 0.0 && self.position >= self.duration {
            self.position = 0.0;
        }
        self.last_tick = None;
        self.playing
    }

    /// Jump the clock and force the next tick to redraw, even when the
    /// mapped index does not change numerically.
    pub fn seek(&mut self, position: f64) {
        self.position = position.clamp(0.0, self.duration.max(0.0));
        self.planner.reset();
        self.sequencer.reset();
        self.cache.clear();
    }

    /// Decodes the base64 JPEG overlay frames up front, before playback
    /// drives them. A frame that fails to decode is dropped with a
    /// warning; a fully undecodable sequence counts as a playback error
    /// against the source ladder.
    pub fn load_heatmap_frames(&mut self, encoded: &[String]) {
        if !self.heatmap_handles.is_empty() || encoded.is_empty() {
            return;
        }
        let mut handles = Vec::with_capacity(encoded.len());
        for (index, frame) in encoded.iter().enumerate() {
            let bytes = match base64::engine::general_purpose::STANDARD.decode(frame) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("job {}: heatmap frame {index} is not valid base64: {err}", self.id);
                    continue;
                }
            };
            match image::load_from_memory(&bytes) {
                Ok(decoded) => {
                    if self.heatmap_source.is_none() {
                        self.heatmap_source = Some(Resolution::new(
                            decoded.width() as f32,
                            decoded.height() as f32,
                        ));
                    }
                    handles.push(Handle::from_bytes(bytes));
                }
                Err(err) => {
                    warn!("job {}: heatmap frame {index} failed to decode: {err}", self.id)
                }
            }
        }
        if handles.is_empty() {
            if let Some(ladder) = &mut self.ladder {
                ladder.on_error();
            }
        } else {
            self.sequencer = HeatmapSequencer::new(handles.len());
            self.heatmap_handles = handles;
        }
    }

    /// Canvas pixel size from the source aspect ratio and the fixed
    /// display width.
    pub fn display_size(&self, detector: Option<Resolution>) -> Resolution {
        let source = self
            .heatmap_source
            .or(detector)
            .unwrap_or(Resolution::new(0.0, 0.0));
        HeatmapSequencer::canvas_size(source, DISPLAY_WIDTH)
    }

    pub fn current_heatmap_handle(&self) -> Option<&Handle> {
        self.current_heatmap
            .and_then(|index| self.heatmap_handles.get(index))
    }
}
