use crate::mapping::FrameIndexMapper;

/// Common error type for decode and synchronization failures.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("decode failure: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Trait for ordered sequences sampled at a fixed interval from a video.
///
/// Detection results and heatmap overlays share the same nearest-frame
/// correspondence: index i holds for playback time near `i / len * duration`.
pub trait SampledSequence {
    /// Number of sampled entries, not decoded video frames.
    fn sample_len(&self) -> usize;

    /// Maps a playback timestamp to the nearest sample index.
    fn index_at(&self, position: f64, duration: f64) -> Option<usize> {
        FrameIndexMapper::new(self.sample_len(), duration).map(position)
    }
}
