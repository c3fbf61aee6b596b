use log::{debug, info, warn};

/// Thin component-tagged wrapper over the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_component(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        if self.component.is_empty() {
            info!("{}", message);
        } else {
            info!("[{}] {}", self.component, message);
        }
    }

    pub fn record_warn(&self, message: &str) {
        if self.component.is_empty() {
            warn!("{}", message);
        } else {
            warn!("[{}] {}", self.component, message);
        }
    }

    pub fn record_debug(&self, message: &str) {
        if self.component.is_empty() {
            debug!("{}", message);
        } else {
            debug!("[{}] {}", self.component, message);
        }
    }
}
