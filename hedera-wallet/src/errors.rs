use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalletError {
    // Extension errors
    ExtensionNotFound,
    NoAccountsAvailable,
    SigningFailed(String),

    // Ledger client errors
    ClientNotInitialized,
    SubmissionFailed(String),
    NetworkError(String),
    InvalidResponse(String),

    // Session errors
    WalletNotConnected,

    // Validation errors
    ValidationError(String),
    InvalidRecipientFormat(String),
    InvalidAmount(String),
    InsufficientBalance { requested: String, available: String },

    // Storage errors
    StorageError(String),

    // Application errors
    NotInitialized,

    // Anything raised by an external collaborator that has no better home
    External(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WalletError::ExtensionNotFound => write!(
                f,
                "HashPack wallet extension not found. Please install HashPack."
            ),
            WalletError::NoAccountsAvailable => write!(f, "No accounts found in wallet"),
            WalletError::SigningFailed(msg) => write!(f, "Signing failed: {}", msg),

            WalletError::ClientNotInitialized => write!(f, "Hedera client not initialized"),
            WalletError::SubmissionFailed(msg) => write!(f, "Transfer failed: {}", msg),
            WalletError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            WalletError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),

            WalletError::WalletNotConnected => write!(f, "Wallet not connected"),

            WalletError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            WalletError::InvalidRecipientFormat(recipient) => write!(
                f,
                "Invalid Hedera account ID format (e.g., 0.0.123456): {}",
                recipient
            ),
            WalletError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            WalletError::InsufficientBalance {
                requested,
                available,
            } => write!(
                f,
                "Insufficient balance: requested {}, available {}",
                requested, available
            ),

            WalletError::StorageError(msg) => write!(f, "Storage error: {}", msg),

            WalletError::NotInitialized => write!(f, "Wallet not initialized"),

            WalletError::External(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

pub type WalletResult<T> = Result<T, WalletError>;

// Helper macro for easy error creation
#[macro_export]
macro_rules! wallet_error {
    ($variant:ident, $msg:expr) => {
        $crate::errors::WalletError::$variant($msg.to_string())
    };
    ($variant:ident) => {
        $crate::errors::WalletError::$variant
    };
}

impl WalletError {
    /// True for errors raised before any external collaborator was contacted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WalletError::ExtensionNotFound
                | WalletError::ClientNotInitialized
                | WalletError::WalletNotConnected
                | WalletError::InvalidRecipientFormat(_)
                | WalletError::InvalidAmount(_)
                | WalletError::InsufficientBalance { .. }
                | WalletError::ValidationError(_)
        )
    }
}

// Conversion helpers
impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        WalletError::StorageError(error.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(error: serde_json::Error) -> Self {
        WalletError::ValidationError(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            WalletError::InvalidResponse(error.to_string())
        } else {
            WalletError::NetworkError(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(WalletError::WalletNotConnected.to_string(), "Wallet not connected");
        assert_eq!(
            WalletError::NoAccountsAvailable.to_string(),
            "No accounts found in wallet"
        );
        let err = WalletError::InvalidRecipientFormat("abc".into());
        assert!(err.to_string().contains("0.0.123456"));
    }

    #[test]
    fn macro_builds_variants() {
        let err = wallet_error!(SigningFailed, "user rejected");
        assert_eq!(err, WalletError::SigningFailed("user rejected".into()));
        let err = wallet_error!(ExtensionNotFound);
        assert_eq!(err, WalletError::ExtensionNotFound);
    }

    #[test]
    fn precondition_classification() {
        assert!(WalletError::WalletNotConnected.is_precondition());
        assert!(!WalletError::SubmissionFailed("x".into()).is_precondition());
        assert!(!WalletError::External("x".into()).is_precondition());
    }
}
