use solana_client::client_error::ClientError;
use thiserror::Error;

/// Errors talking to the ledger RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transport-level errors (network, connection)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Errors returned by the RPC server itself
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimitExceeded { endpoint: String },

    #[error("Blockhash not found (endpoint: {endpoint})")]
    BlockhashNotFound { endpoint: String },

    #[error("Transaction expired (endpoint: {endpoint})")]
    TransactionExpired { endpoint: String },

    #[error("Account not found: {account}")]
    AccountNotFound { account: String },

    #[error("Insufficient funds (endpoint: {endpoint})")]
    InsufficientFunds { endpoint: String },

    /// The ledger already holds a transaction with this signature
    #[error("This transaction has already been processed (endpoint: {endpoint})")]
    AlreadyProcessed { endpoint: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Transport { .. }
            | LedgerError::Timeout { .. }
            | LedgerError::RateLimitExceeded { .. }
            | LedgerError::BlockhashNotFound { .. } => true,
            LedgerError::RpcResponse { code, .. } => {
                matches!(code, Some(c) if (500..600).contains(c))
            }
            LedgerError::TransactionExpired { .. }
            | LedgerError::AccountNotFound { .. }
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::AlreadyProcessed { .. }
            | LedgerError::InvalidResponse(_) => false,
        }
    }

    pub fn is_already_processed(&self) -> bool {
        matches!(self, LedgerError::AlreadyProcessed { .. })
    }

    pub fn category(&self) -> &'static str {
        match self {
            LedgerError::Transport { .. } => "transport",
            LedgerError::Timeout { .. } => "timeout",
            LedgerError::RpcResponse { .. } => "rpc_response",
            LedgerError::RateLimitExceeded { .. } => "rate_limit",
            LedgerError::BlockhashNotFound { .. } => "blockhash",
            LedgerError::TransactionExpired { .. } => "expired",
            LedgerError::AccountNotFound { .. } => "account_not_found",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::AlreadyProcessed { .. } => "already_processed",
            LedgerError::InvalidResponse(_) => "invalid_response",
        }
    }

    /// Create from ClientError with context
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        Self::classify(&err.to_string(), endpoint)
    }

    /// Classify a raw error message the way the RPC client reports it
    pub fn classify(message: &str, endpoint: &str) -> Self {
        let lower = message.to_lowercase();
        let endpoint = endpoint.to_string();

        if is_already_processed_message(&lower) {
            LedgerError::AlreadyProcessed { endpoint }
        } else if lower.contains("blockhash not found") {
            LedgerError::BlockhashNotFound { endpoint }
        } else if lower.contains("transaction expired") || lower.contains("block height exceeded") {
            LedgerError::TransactionExpired { endpoint }
        } else if lower.contains("account not found") || lower.contains("could not find account") {
            LedgerError::AccountNotFound {
                account: "unknown".to_string(),
            }
        } else if lower.contains("insufficient funds") || lower.contains("insufficient lamports") {
            LedgerError::InsufficientFunds { endpoint }
        } else if lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("429")
        {
            LedgerError::RateLimitExceeded { endpoint }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            LedgerError::Timeout {
                endpoint,
                timeout_ms: 30_000,
            }
        } else if lower.contains("connection") || lower.contains("dns") {
            LedgerError::Transport {
                endpoint,
                message: message.to_string(),
            }
        } else {
            let code = lower
                .split("code:")
                .nth(1)
                .and_then(|s| s.split_whitespace().next())
                .and_then(|s| s.trim_end_matches(',').parse::<i64>().ok());
            LedgerError::RpcResponse {
                endpoint,
                message: message.to_string(),
                code,
            }
        }
    }
}

/// Matches both the RPC message and the debug form of the transaction error
pub fn is_already_processed_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("already been processed") || lower.contains("alreadyprocessed")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "http://localhost:8899";

    #[test]
    fn test_already_processed_classification() {
        let err = LedgerError::classify(
            "Transaction simulation failed: This transaction has already been processed",
            ENDPOINT,
        );
        assert!(err.is_already_processed());
        assert!(!err.is_retryable());
        assert!(is_already_processed_message("Err(AlreadyProcessed)"));
    }

    #[test]
    fn test_retryable_classes() {
        assert!(LedgerError::classify("Blockhash not found", ENDPOINT).is_retryable());
        assert!(LedgerError::classify("HTTP status 429 Too Many Requests", ENDPOINT).is_retryable());
        assert!(LedgerError::classify("operation timed out", ENDPOINT).is_retryable());
        assert!(!LedgerError::classify("insufficient lamports 10, need 20", ENDPOINT).is_retryable());
    }

    #[test]
    fn test_server_error_code_extracted() {
        let err = LedgerError::classify("RPC failure code: 503 unavailable", ENDPOINT);
        assert!(matches!(err, LedgerError::RpcResponse { code: Some(503), .. }));
        assert!(err.is_retryable());
        assert_eq!(err.category(), "rpc_response");
    }
}
