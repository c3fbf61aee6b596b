pub mod allocator;

pub use allocator::{allocate_hue, hue_to_hex, ClassColorEntry, ColorAllocator};
