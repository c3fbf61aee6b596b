//! Synchronization core for the detection overlay viewer.
//!
//! The modules keep a playing video, a sequence of sampled detection
//! results, and optional heatmap overlays mutually synchronized while a
//! polled backend job is still producing them. Everything here is driven
//! by explicit inputs rather than timers, sockets, or GUI handles, so the
//! state machines can be exercised directly.

pub mod backend_interface;
pub mod mapping;
pub mod palette;
pub mod playback;
pub mod polling;
pub mod prelude;
pub mod telemetry;

pub use prelude::{SampledSequence, SyncError, SyncResult};
