use crate::decode::DecodeError;
use crate::fee::FeeError;
use crate::ledger::LedgerError;
use crate::pda::AddressError;
use crate::submission::SubmissionError;
use crate::tx_builder::AssemblyError;
use crate::types::InputError;
use thiserror::Error;

/// Everything a flow can fail with; rendered into the result envelope
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Missing or malformed caller input
    #[error("{0}")]
    Validation(String),

    /// Ledger state rules the operation out
    #[error("{0}")]
    Precondition(String),

    #[error("Failed to decode account: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transaction simulation failed: {message}")]
    Simulation { message: String, logs: Vec<String> },

    /// Broadcast or pipeline failure
    #[error("{0}")]
    Submission(String),

    /// The transaction landed and failed
    #[error("Transaction failed: {message}")]
    Confirmation { message: String, logs: Vec<String> },

    #[error("Address derivation failed: {0}")]
    Address(#[from] AddressError),

    #[error("Fee computation failed: {0}")]
    Fee(#[from] FeeError),

    #[error("Transaction assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Ledger request failed: {0}")]
    Ledger(#[from] LedgerError),
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        FlowError::Precondition(message.into())
    }

    pub fn category(&self) -> &'static str {
        match self {
            FlowError::Validation(_) => "validation",
            FlowError::Precondition(_) => "precondition",
            FlowError::Decode(_) => "decode",
            FlowError::Simulation { .. } => "simulation",
            FlowError::Submission(_) => "submission",
            FlowError::Confirmation { .. } => "confirmation",
            FlowError::Address(_) => "address",
            FlowError::Fee(_) => "fee",
            FlowError::Assembly(_) => "assembly",
            FlowError::Ledger(_) => "ledger",
        }
    }

    pub fn logs(&self) -> &[String] {
        match self {
            FlowError::Simulation { logs, .. } | FlowError::Confirmation { logs, .. } => logs,
            _ => &[],
        }
    }
}

impl From<InputError> for FlowError {
    fn from(err: InputError) -> Self {
        FlowError::Validation(err.to_string())
    }
}

impl From<SubmissionError> for FlowError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Simulation { message, logs } => FlowError::Simulation { message, logs },
            SubmissionError::Confirmation { message, logs, .. } => {
                FlowError::Confirmation { message, logs }
            }
            SubmissionError::Ledger(e) => FlowError::Ledger(e),
            other => FlowError::Submission(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletError;

    #[test]
    fn test_precondition_message_is_bare() {
        assert_eq!(
            FlowError::precondition("Balance not enough").to_string(),
            "Balance not enough"
        );
    }

    #[test]
    fn test_submission_errors_keep_logs() {
        let err: FlowError = SubmissionError::Simulation {
            message: "custom program error: 0x1771".into(),
            logs: vec!["Program log: Error: RefundAmountTooLow".into()],
        }
        .into();
        assert_eq!(err.category(), "simulation");
        assert_eq!(err.logs().len(), 1);

        let err: FlowError = SubmissionError::Signing(WalletError::Rejected).into();
        assert_eq!(err.category(), "submission");
        assert!(err.logs().is_empty());
        assert_eq!(err.to_string(), "Wallet signing failed: User rejected the request");
    }

    #[test]
    fn test_input_error_is_validation() {
        let err: FlowError = InputError::Missing("Token name").into();
        assert_eq!(err, FlowError::Validation("Token name is required".into()));
    }
}
