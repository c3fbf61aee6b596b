use crate::backend_interface::detection::ResultSequence;
use crate::mapping::{CoordinateScaler, FrameIndexMapper};
use crate::palette::ColorAllocator;
use crate::telemetry::LogManager;

/// One box ready to draw: display-space rectangle, label text, class color.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub hex: String,
}

/// Everything a canvas needs to redraw one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub index: usize,
    pub boxes: Vec<PlannedBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// Index and palette unchanged since the last draw; keep the canvas.
    Skip,
    Draw(FramePlan),
}

/// Per-tick planner behind the overlay canvas.
///
/// Recomputes the sampled-frame index on every tick but only emits a new
/// plan when the index or the color map changed, bounding per-tick work.
/// A seek must call [`OverlayPlanner::reset`] so the next tick redraws even
/// if the numeric index happens to be unchanged.
#[derive(Debug, Default)]
pub struct OverlayPlanner {
    last_drawn: Option<usize>,
    last_palette_revision: u64,
    logger: LogManager,
}

impl OverlayPlanner {
    pub fn new() -> Self {
        Self {
            last_drawn: None,
            last_palette_revision: 0,
            logger: LogManager::for_component("overlay"),
        }
    }

    pub fn plan(
        &mut self,
        position: f64,
        duration: f64,
        results: &ResultSequence,
        scaler: &CoordinateScaler,
        palette: &mut ColorAllocator,
    ) -> PlanOutcome {
        let mapper = FrameIndexMapper::new(results.len(), duration);
        let Some(index) = mapper.map(position) else {
            // Metadata not loaded yet; soft-skip and retry next tick.
            return PlanOutcome::Skip;
        };

        let palette_revision = palette.revision();
        if self.last_drawn == Some(index) && self.last_palette_revision == palette_revision {
            return PlanOutcome::Skip;
        }

        let Some(frame) = results.frame(index) else {
            return PlanOutcome::Skip;
        };

        let boxes = frame
            .boxes
            .iter()
            .map(|detection| {
                let hex = palette.ensure(&detection.class_name).hex.clone();
                let scaled = scaler.scale_box(detection);
                PlannedBox {
                    x: scaled.x1.min(scaled.x2),
                    y: scaled.y1.min(scaled.y2),
                    width: (scaled.x2 - scaled.x1).abs(),
                    height: (scaled.y2 - scaled.y1).abs(),
                    label: detection.label(),
                    hex,
                }
            })
            .collect();

        self.last_drawn = Some(index);
        self.last_palette_revision = palette.revision();
        self.logger
            .record_debug(&format!("plan frame {} at t={:.2}", index, position));

        PlanOutcome::Draw(FramePlan { index, boxes })
    }

    /// Forgets the last drawn index. Call on seek and on source change.
    pub fn reset(&mut self) {
        self.last_drawn = None;
    }
}
