// lib.rs - Hedera wallet backend for the crowdfunding frontend

pub mod api;
pub mod app_state;
pub mod config_store;
pub mod errors;
pub mod extension;
pub mod ledger;
pub mod ledger_client;
pub mod service;
pub mod session;
pub mod storage;
pub mod transaction;
pub mod validation;

// Re-export common types
pub use api::types::*;
pub use app_state::{SharedWalletContext, WalletContext};
pub use config_store::{
    ConfigStore, Environment, HistoryConfig, NetworkConfig, NetworkEndpoints, SessionConfig,
    WalletConfig,
};
pub use errors::{WalletError, WalletResult};
pub use extension::{ExtensionConnection, ExtensionHandle, WalletExtension};
pub use ledger::{AccountId, Hbar, Network, TransactionId};
pub use ledger_client::{HttpLedgerClient, HttpLedgerConnector, LedgerClient, LedgerConnector};
pub use service::HederaWalletService;
pub use session::{SessionManager, SessionStore, WalletSession};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, WalletPaths};
pub use transaction::{
    HbarTransfer, SignedTransaction, TransferRecord, TransferStatus, TransferTransaction,
};
pub use validation::InputValidator;
