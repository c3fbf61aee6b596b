pub mod heatmap;
pub mod overlay;
pub mod source;

pub use heatmap::{HeatmapSequencer, SequencerStep};
pub use overlay::{FramePlan, OverlayPlanner, PlanOutcome, PlannedBox};
pub use source::{PlaybackSource, SourceLadder};
