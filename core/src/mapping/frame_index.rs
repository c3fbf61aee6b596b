/// Maps continuous playback time to a sampled-result index.
///
/// Results are sampled at a fixed interval independent of the real frame
/// rate, so the timestamp ratio is the only available correspondence:
/// `index = clamp(floor(t * N / duration), 0, N - 1)`.
#[derive(Debug, Clone, Copy)]
pub struct FrameIndexMapper {
    sample_count: usize,
    duration: f64,
}

impl FrameIndexMapper {
    pub fn new(sample_count: usize, duration: f64) -> Self {
        Self {
            sample_count,
            duration,
        }
    }

    /// Nearest sample index for a playback position, or None when the
    /// sequence is empty or the duration is not yet known.
    pub fn map(&self, position: f64) -> Option<usize> {
        if self.sample_count == 0 || self.duration <= 0.0 {
            return None;
        }
        let ratio = self.sample_count as f64 / self.duration;
        let index = (position.max(0.0) * ratio).floor() as usize;
        Some(index.min(self.sample_count - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_of_thirty_seconds_maps_to_index_five() {
        let mapper = FrameIndexMapper::new(10, 30.0);
        assert_eq!(mapper.map(15.0), Some(5));
    }

    #[test]
    fn mapping_is_monotonic_and_bounded() {
        let mapper = FrameIndexMapper::new(7, 12.5);
        let mut last = 0;
        let mut t = 0.0;
        while t <= 20.0 {
            let index = mapper.map(t).unwrap();
            assert!(index >= last);
            assert!(index <= 6);
            last = index;
            t += 0.1;
        }
    }

    #[test]
    fn negative_positions_clamp_to_first_sample() {
        let mapper = FrameIndexMapper::new(4, 8.0);
        assert_eq!(mapper.map(-3.0), Some(0));
    }

    #[test]
    fn empty_sequence_or_unknown_duration_yields_none() {
        assert_eq!(FrameIndexMapper::new(0, 10.0).map(1.0), None);
        assert_eq!(FrameIndexMapper::new(5, 0.0).map(1.0), None);
    }

    #[test]
    fn position_past_the_end_maps_to_last_sample() {
        let mapper = FrameIndexMapper::new(10, 30.0);
        assert_eq!(mapper.map(30.0), Some(9));
        assert_eq!(mapper.map(90.0), Some(9));
    }
}
