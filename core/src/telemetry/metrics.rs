use std::sync::Mutex;

/// Counters for the two recurring triggers: status polls and draw ticks.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub polls: usize,
    pub poll_errors: usize,
    pub frames_drawn: usize,
    pub frames_skipped: usize,
}

#[derive(Debug, Default)]
struct Metrics {
    polls: usize,
    poll_errors: usize,
    frames_drawn: usize,
    frames_skipped: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.polls += 1;
        }
    }

    pub fn record_poll_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.poll_errors += 1;
        }
    }

    pub fn record_frame_drawn(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_drawn += 1;
        }
    }

    pub fn record_frame_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_skipped += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                polls: metrics.polls,
                poll_errors: metrics.poll_errors,
                frames_drawn: metrics.frames_drawn,
                frames_skipped: metrics.frames_skipped,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let recorder = MetricsRecorder::new();
        recorder.record_poll();
        recorder.record_poll();
        recorder.record_poll_error();
        recorder.record_frame_drawn();
        recorder.record_frame_skipped();

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.polls, 2);
        assert_eq!(snapshot.poll_errors, 1);
        assert_eq!(snapshot.frames_drawn, 1);
        assert_eq!(snapshot.frames_skipped, 1);
    }
}
