use crate::backend_interface::status::JobStatus;
use crate::telemetry::LogManager;
use std::time::Duration;

/// Canonical status poll period. The backend is poll-only; responses
/// slower than this are handled by the in-flight flag, not the timer.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// What the driving timer should do after a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDirective {
    Continue,
    Stop,
}

/// Poller lifecycle, stripped of result payloads (the job store owns those).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollerPhase {
    #[default]
    Pending,
    Running {
        percent: u8,
        message: String,
    },
    Succeeded,
    Failed {
        message: String,
    },
    Cancelled,
}

impl PollerPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollerPhase::Succeeded | PollerPhase::Failed { .. } | PollerPhase::Cancelled
        )
    }

    fn from_status(status: &JobStatus) -> Self {
        match status {
            JobStatus::Pending => PollerPhase::Pending,
            JobStatus::Progress {
                percent, message, ..
            } => PollerPhase::Running {
                percent: *percent,
                message: message.clone(),
            },
            JobStatus::Success { .. } => PollerPhase::Succeeded,
            JobStatus::Failure { message } => PollerPhase::Failed {
                message: message.clone(),
            },
            JobStatus::Cancelled => PollerPhase::Cancelled,
        }
    }
}

/// Finite-state poller for one backend job.
///
/// The owning timer fires at [`POLL_INTERVAL`]; this type decides whether a
/// request may actually go out and folds each response into the phase. All
/// transitions happen in [`TaskStatusPoller::on_response`], so the FSM is
/// testable without timers or a network.
#[derive(Debug)]
pub struct TaskStatusPoller {
    job_id: String,
    phase: PollerPhase,
    in_flight: bool,
    active: bool,
    cancel_requested: bool,
    last_error: Option<String>,
    logger: LogManager,
}

impl TaskStatusPoller {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            phase: PollerPhase::Pending,
            in_flight: false,
            active: true,
            cancel_requested: false,
            last_error: None,
            logger: LogManager::for_component("poller"),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn phase(&self) -> &PollerPhase {
        &self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// True while the timer should keep firing for this job.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Gate before issuing a status request. Refuses while a request is
    /// already outstanding or once a terminal state was observed, so slow
    /// responses cannot stack concurrent polls.
    pub fn begin_request(&mut self) -> bool {
        if !self.active || self.in_flight || self.phase.is_terminal() {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Folds a decoded status response into the phase.
    pub fn on_response(&mut self, status: &JobStatus) -> PollDirective {
        self.in_flight = false;
        self.last_error = None;

        if self.phase.is_terminal() {
            // Terminal is terminal; a late response changes nothing.
            return PollDirective::Stop;
        }

        self.phase = PollerPhase::from_status(status);
        if self.phase.is_terminal() {
            self.active = false;
            self.logger.record(&format!(
                "job {} reached terminal state {}",
                self.job_id,
                status.state_label()
            ));
            PollDirective::Stop
        } else {
            PollDirective::Continue
        }
    }

    /// A transient network error: surface it, keep the timer running.
    pub fn on_error(&mut self, message: impl Into<String>) -> PollDirective {
        self.in_flight = false;
        if self.phase.is_terminal() {
            return PollDirective::Stop;
        }
        let message = message.into();
        self.logger
            .record_warn(&format!("poll error for {}: {}", self.job_id, message));
        self.last_error = Some(message);
        PollDirective::Continue
    }

    /// Marks that a cancellation request was sent. Advisory only: the
    /// phase moves to Cancelled when a later response reports it, never
    /// synchronously, to avoid racing an in-flight success.
    pub fn note_cancel_requested(&mut self) {
        self.cancel_requested = true;
    }

    /// `elapsed * (100 / percent) - elapsed`, from wall-clock elapsed time
    /// and the last reported percent. Not smoothed; it may jump.
    pub fn estimated_remaining(&self, elapsed: Duration) -> Option<Duration> {
        match &self.phase {
            PollerPhase::Running { percent, .. } if *percent > 0 => {
                let total = elapsed.mul_f64(100.0 / f64::from(*percent));
                Some(total.saturating_sub(elapsed))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend_interface::status::ResultPayload;

    fn progress(percent: u8) -> JobStatus {
        JobStatus::Progress {
            percent,
            message: format!("Processing frame {percent}"),
            payload: ResultPayload::default(),
        }
    }

    fn success() -> JobStatus {
        JobStatus::Success {
            payload: ResultPayload::default(),
        }
    }

    #[test]
    fn begin_request_refuses_while_one_is_in_flight() {
        let mut poller = TaskStatusPoller::new("job-1");
        assert!(poller.begin_request());
        assert!(!poller.begin_request());
        poller.on_response(&progress(10));
        assert!(poller.begin_request());
    }

    #[test]
    fn no_requests_after_a_terminal_state() {
        let mut poller = TaskStatusPoller::new("job-1");
        poller.begin_request();
        assert_eq!(poller.on_response(&success()), PollDirective::Stop);
        assert!(!poller.is_active());
        assert!(!poller.begin_request());
    }

    #[test]
    fn failure_is_terminal_with_no_retry() {
        let mut poller = TaskStatusPoller::new("job-1");
        let directive = poller.on_response(&JobStatus::Failure {
            message: "model not found".into(),
        });
        assert_eq!(directive, PollDirective::Stop);
        assert_eq!(
            poller.phase(),
            &PollerPhase::Failed {
                message: "model not found".into()
            }
        );
        assert!(!poller.begin_request());
    }

    #[test]
    fn late_responses_after_terminal_are_ignored() {
        let mut poller = TaskStatusPoller::new("job-1");
        poller.on_response(&success());
        assert_eq!(poller.on_response(&progress(50)), PollDirective::Stop);
        assert_eq!(poller.phase(), &PollerPhase::Succeeded);
    }

    #[test]
    fn network_errors_keep_the_timer_running() {
        let mut poller = TaskStatusPoller::new("job-1");
        poller.begin_request();
        let directive = poller.on_error("connection refused");
        assert_eq!(directive, PollDirective::Continue);
        assert_eq!(poller.last_error(), Some("connection refused"));
        assert!(poller.begin_request());
    }

    #[test]
    fn cancel_is_advisory_until_observed() {
        let mut poller = TaskStatusPoller::new("job-1");
        poller.on_response(&progress(40));
        poller.note_cancel_requested();
        assert!(!poller.is_terminal());
        assert!(poller.is_active());
        assert_eq!(poller.on_response(&JobStatus::Cancelled), PollDirective::Stop);
        assert_eq!(poller.phase(), &PollerPhase::Cancelled);
    }

    #[test]
    fn estimated_remaining_follows_the_percent_formula() {
        let mut poller = TaskStatusPoller::new("job-1");
        poller.on_response(&progress(25));
        let remaining = poller.estimated_remaining(Duration::from_secs(30)).unwrap();
        assert_eq!(remaining, Duration::from_secs(90));
    }

    #[test]
    fn estimated_remaining_is_unknown_at_zero_percent() {
        let mut poller = TaskStatusPoller::new("job-1");
        poller.on_response(&progress(0));
        assert_eq!(poller.estimated_remaining(Duration::from_secs(10)), None);
    }
}
