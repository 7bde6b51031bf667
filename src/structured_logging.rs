//! Structured logging for flow invocations

use uuid::Uuid;

/// Logger carrying the correlation id of one flow invocation
#[derive(Debug, Clone)]
pub struct FlowLogger {
    context_id: String,
    operation: &'static str,
}

impl FlowLogger {
    pub fn new(operation: &'static str) -> Self {
        Self {
            context_id: Uuid::new_v4().to_string(),
            operation,
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn log_start(&self, subject: &str) {
        tracing::info!(
            context_id = %self.context_id,
            operation = self.operation,
            subject = %subject,
            "Flow started"
        );
    }

    pub fn log_step(&self, step: &str, detail: &str) {
        tracing::debug!(
            context_id = %self.context_id,
            operation = self.operation,
            step = %step,
            detail = %detail,
            "Flow step"
        );
    }

    pub fn log_rejected(&self, category: &str, message: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            operation = self.operation,
            category = %category,
            message = %message,
            "Flow rejected"
        );
    }

    pub fn log_success(&self, signature: Option<&str>, caveat: Option<&str>, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            operation = self.operation,
            signature = ?signature,
            caveat = ?caveat,
            latency_ms = %latency_ms,
            "Flow succeeded"
        );
    }

    pub fn log_failure(&self, category: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            context_id = %self.context_id,
            operation = self.operation,
            category = %category,
            error = %error,
            latency_ms = %latency_ms,
            "Flow failed"
        );
    }

    /// Program log lines from a failed simulation or execution
    pub fn log_program_logs(&self, logs: &[String]) {
        for line in logs {
            tracing::debug!(
                context_id = %self.context_id,
                operation = self.operation,
                line = %line,
                "Program log"
            );
        }
    }
}
