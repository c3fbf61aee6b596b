pub mod frame_index;
pub mod scale;

pub use frame_index::FrameIndexMapper;
pub use scale::{CoordinateScaler, Resolution};
