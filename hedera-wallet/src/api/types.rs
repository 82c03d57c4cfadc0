use serde::{Deserialize, Serialize};

use crate::config_store::WalletConfig;
use crate::session::WalletSession;
use crate::transaction::TransferRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub account_id: String,
    pub network: String,
    /// Decimal HBAR, absent until the first balance query.
    #[serde(default)]
    pub balance: Option<String>,
}

impl From<WalletSession> for WalletSummary {
    fn from(session: WalletSession) -> Self {
        Self {
            account_id: session.account_id.to_string(),
            network: session.network.as_str().to_string(),
            balance: session.balance.map(|b| b.as_string()),
        }
    }
}

impl From<&WalletSession> for WalletSummary {
    fn from(session: &WalletSession) -> Self {
        WalletSummary::from(session.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectWalletResponse {
    pub summary: WalletSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectWalletResponse {
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatusResponse {
    pub connected: bool,
    pub extension_available: bool,
    pub summary: Option<WalletSummary>,
    pub config: WalletConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    pub account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: String,
    pub tinybars: i64,
}

/// Form fields of the send dialog, as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub recipient: String,
    pub amount: String,
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub transaction_id: String,
    pub message: String,
    /// Balance after the post-transfer refresh.
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccountIdRequest {
    pub account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccountIdResponse {
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub id: String,
    pub transaction_id: Option<String>,
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
    pub status: String,
    pub timestamp: String,
}

impl From<TransferRecord> for TransactionInfo {
    fn from(record: TransferRecord) -> Self {
        Self {
            id: record.id,
            transaction_id: record.transaction_id.map(|id| id.to_string()),
            from_account: record.from.to_string(),
            to_account: record.to.to_string(),
            amount: record.amount.as_string(),
            status: record.status.as_str().to_string(),
            timestamp: record.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistoryResponse {
    pub transactions: Vec<TransactionInfo>,
    pub total_count: u64,
}
