use crate::mapping::Resolution;
use crate::prelude::SampledSequence;

/// Outcome of one sequencer tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequencerStep {
    /// No frames loaded; nothing to show.
    Idle,
    /// Mapped index unchanged; keep the current image.
    Hold(usize),
    /// Mapped index moved; show this frame.
    Advance(usize),
}

/// Tracks the current index into a preloaded heatmap overlay sequence.
///
/// Same nearest-frame correspondence as the detection results, over an
/// independently sized image list. The sequencer only hands out indices;
/// the caller owns the decoded images and draws whichever one is current.
#[derive(Debug, Default)]
pub struct HeatmapSequencer {
    frame_count: usize,
    last_index: Option<usize>,
}

impl HeatmapSequencer {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            last_index: None,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Advances the sequencer to the frame mapped from `position`.
    pub fn tick(&mut self, position: f64, duration: f64) -> SequencerStep {
        let Some(index) = self.index_at(position, duration) else {
            return SequencerStep::Idle;
        };
        if self.last_index == Some(index) {
            return SequencerStep::Hold(index);
        }
        self.last_index = Some(index);
        SequencerStep::Advance(index)
    }

    /// Forgets the current index so the next tick redraws. Call on seek.
    pub fn reset(&mut self) {
        self.last_index = None;
    }

    /// Canvas pixel size for a caller-supplied display width, preserving
    /// the source aspect ratio. On-screen layout size is the caller's
    /// concern and set independently.
    pub fn canvas_size(source: Resolution, display_width: f32) -> Resolution {
        match source.aspect_ratio() {
            Some(ratio) if ratio > 0.0 => Resolution::new(display_width, display_width / ratio),
            _ => Resolution::new(display_width, display_width * 9.0 / 16.0),
        }
    }
}

impl SampledSequence for HeatmapSequencer {
    fn sample_len(&self) -> usize {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_then_holds() {
        let mut sequencer = HeatmapSequencer::new(10);
        assert_eq!(sequencer.tick(15.0, 30.0), SequencerStep::Advance(5));
        assert_eq!(sequencer.tick(15.5, 30.0), SequencerStep::Hold(5));
        assert_eq!(sequencer.tick(18.0, 30.0), SequencerStep::Advance(6));
    }

    #[test]
    fn empty_sequence_stays_idle() {
        let mut sequencer = HeatmapSequencer::new(0);
        assert_eq!(sequencer.tick(5.0, 30.0), SequencerStep::Idle);
    }

    #[test]
    fn reset_forces_a_redraw_of_the_same_index() {
        let mut sequencer = HeatmapSequencer::new(10);
        sequencer.tick(15.0, 30.0);
        sequencer.reset();
        assert_eq!(sequencer.tick(15.0, 30.0), SequencerStep::Advance(5));
    }

    #[test]
    fn canvas_size_preserves_source_aspect_ratio() {
        let size = HeatmapSequencer::canvas_size(Resolution::new(1920.0, 1080.0), 640.0);
        assert_eq!(size.width, 640.0);
        assert_eq!(size.height, 360.0);
    }

    #[test]
    fn canvas_size_falls_back_to_wide_aspect_for_unknown_source() {
        let size = HeatmapSequencer::canvas_size(Resolution::new(0.0, 0.0), 320.0);
        assert_eq!(size.width, 320.0);
        assert_eq!(size.height, 180.0);
    }

    #[test]
    fn sequence_length_is_independent_of_result_length() {
        let mut sequencer = HeatmapSequencer::new(4);
        assert_eq!(sequencer.tick(29.9, 30.0), SequencerStep::Advance(3));
    }
}
