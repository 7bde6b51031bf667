//! Error types for transaction assembly

use crate::pda::AddressError;
use thiserror::Error;

/// Failures while turning validated inputs into an unsigned transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    /// An address could not be derived
    #[error("Address derivation failed: {0}")]
    Address(#[from] AddressError),

    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild { program: String, reason: String },

    /// Instruction list violates the required ordering
    #[error("Invalid instruction order: {0}")]
    InvalidInstructionOrder(String),

    /// The lookup table account is missing or malformed
    #[error("Address lookup table error: {0}")]
    LookupTable(String),

    /// Message compilation failed (too many accounts, bad lookup table)
    #[error("Message compile error: {0}")]
    MessageCompile(String),

    /// Serialized transaction exceeds the network packet limit
    #[error("Transaction too large: {size} bytes (maximum {max})")]
    TransactionTooLarge { size: usize, max: usize },
}

impl AssemblyError {
    /// Assembly is deterministic, so only a freshly fetched lookup table can change the outcome
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LookupTable(_))
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::InstructionBuild { .. } => "instruction",
            Self::InvalidInstructionOrder(_) => "validation",
            Self::LookupTable(_) => "lookup_table",
            Self::MessageCompile(_) => "compile",
            Self::TransactionTooLarge { .. } => "size",
        }
    }
}

// Convenience constructors for common error scenarios
impl AssemblyError {
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidInstructionOrder(reason.into())
    }
}
