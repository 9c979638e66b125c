//! Alerting collaborator
//!
//! The orchestrator raises exactly one alert per failed run. Delivery is up to
//! the implementation and must not fail the caller, so `notify` returns
//! nothing.

use tracing::error;

pub const VALIDATION_ALERT_SUBJECT: &str = "ETL Validation Errors";
pub const FAILURE_ALERT_SUBJECT: &str = "ETL Failure";

pub trait Alerter: Send + Sync {
    fn notify(&self, subject: &str, body: &str);
}

/// Writes alerts to the error log, tagged with the intended recipient
#[derive(Debug, Clone)]
pub struct LogAlerter {
    recipient: String,
}

impl LogAlerter {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }
}

impl Alerter for LogAlerter {
    fn notify(&self, subject: &str, body: &str) {
        error!(recipient = %self.recipient, "ALERT: {} -> {}", subject, body);
    }
}
