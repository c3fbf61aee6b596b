use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke, Text};
use iced::{mouse, Color, Point, Rectangle, Renderer, Size, Theme};
use overlaycore::playback::FramePlan;

const LABEL_TEXT_SIZE: f32 = 12.0;
const LABEL_BAR_HEIGHT: f32 = 16.0;
const BOX_STROKE_WIDTH: f32 = 2.0;

/// Overlay canvas program. Geometry is cached; the update loop clears the
/// cache only when the planner emits a new frame plan, so unchanged ticks
/// cost nothing here.
pub struct OverlayCanvas<'a> {
    pub cache: &'a canvas::Cache,
    pub plan: Option<&'a FramePlan>,
    /// Whether a bitmap element is composited beneath this canvas.
    pub has_backdrop: bool,
}

pub fn color_from_hex(hex: &str) -> Color {
    let value = hex.strip_prefix('#').unwrap_or(hex);
    if value.len() != 6 {
        return Color::WHITE;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&value[range], 16).unwrap_or(255)
    };
    Color::from_rgb8(channel(0..2), channel(2..4), channel(4..6))
}

impl<'a, Message> canvas::Program<Message> for OverlayCanvas<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self.cache.draw(renderer, bounds.size(), |frame: &mut Frame| {
            if !self.has_backdrop {
                frame.fill_rectangle(
                    Point::ORIGIN,
                    bounds.size(),
                    Color::from_rgb(0.05, 0.05, 0.05),
                );
            }

            let Some(plan) = self.plan else {
                return;
            };

            for planned in &plan.boxes {
                let color = color_from_hex(&planned.hex);
                let rect = Path::rectangle(
                    Point::new(planned.x, planned.y),
                    Size::new(planned.width, planned.height),
                );
                frame.stroke(
                    &rect,
                    Stroke::default()
                        .with_width(BOX_STROKE_WIDTH)
                        .with_color(color),
                );

                let label_width =
                    planned.label.len() as f32 * LABEL_TEXT_SIZE * 0.62 + 6.0;
                let label_top = (planned.y - LABEL_BAR_HEIGHT).max(0.0);
                frame.fill_rectangle(
                    Point::new(planned.x, label_top),
                    Size::new(label_width, LABEL_BAR_HEIGHT),
                    color,
                );
                frame.fill_text(Text {
                    content: planned.label.clone(),
                    position: Point::new(planned.x + 3.0, label_top + 2.0),
                    color: Color::WHITE,
                    size: LABEL_TEXT_SIZE.into(),
                    ..Text::default()
                });
            }
        });

        vec![geometry]
    }
}
