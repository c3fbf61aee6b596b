pub mod poller;
pub mod store;

pub use poller::{PollDirective, PollerPhase, TaskStatusPoller, POLL_INTERVAL};
pub use store::{Job, JobStore};
