/// HBAR transfer transactions and the records the wallet keeps about them
use crate::errors::{WalletError, WalletResult};
use crate::ledger::{AccountId, Hbar, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One leg of a transfer: a signed amount applied to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HbarTransfer {
    pub account_id: AccountId,
    pub amount: Hbar,
}

/// A crypto transfer transaction body, built before it is handed to the
/// wallet extension for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransferTransaction {
    transfers: Vec<HbarTransfer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memo: Option<String>,
}

impl TransferTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard two-leg transfer: debit `from`, credit `to`.
    pub fn between(from: AccountId, to: AccountId, amount: Hbar) -> WalletResult<Self> {
        if !amount.is_positive() {
            return Err(WalletError::InvalidAmount(
                "Amount must be greater than 0".to_string(),
            ));
        }
        if from == to {
            return Err(WalletError::ValidationError(
                "Cannot transfer to the sending account".to_string(),
            ));
        }

        let tx = TransferTransaction::new()
            .add_hbar_transfer(from, amount.negated())
            .add_hbar_transfer(to, amount);
        tx.validate()?;
        Ok(tx)
    }

    pub fn add_hbar_transfer(mut self, account_id: AccountId, amount: Hbar) -> Self {
        self.transfers.push(HbarTransfer { account_id, amount });
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn transfers(&self) -> &[HbarTransfer] {
        &self.transfers
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    pub fn debits(&self) -> impl Iterator<Item = &HbarTransfer> {
        self.transfers.iter().filter(|t| t.amount.is_negative())
    }

    pub fn credits(&self) -> impl Iterator<Item = &HbarTransfer> {
        self.transfers.iter().filter(|t| t.amount.is_positive())
    }

    /// Account paying for the transaction: the first debited account.
    pub fn payer(&self) -> Option<AccountId> {
        self.debits().next().map(|t| t.account_id)
    }

    /// Sum of all credited amounts.
    pub fn total_credited(&self) -> WalletResult<Hbar> {
        self.credits()
            .try_fold(Hbar::ZERO, |acc, t| acc.checked_add(&t.amount))
    }

    /// The ledger only accepts transfer lists that net to zero.
    pub fn validate(&self) -> WalletResult<()> {
        if self.transfers.is_empty() {
            return Err(WalletError::ValidationError(
                "Transfer list cannot be empty".to_string(),
            ));
        }

        if self.transfers.iter().any(|t| t.amount.is_zero()) {
            return Err(WalletError::ValidationError(
                "Transfer entries must be non-zero".to_string(),
            ));
        }

        // ACCOUNT_REPEATED_IN_ACCOUNT_AMOUNTS on the ledger
        let mut seen = HashSet::with_capacity(self.transfers.len());
        if let Some(repeated) = self.transfers.iter().find(|t| !seen.insert(t.account_id)) {
            return Err(WalletError::ValidationError(format!(
                "Account {} appears more than once in the transfer",
                repeated.account_id
            )));
        }

        let net = self
            .transfers
            .iter()
            .try_fold(Hbar::ZERO, |acc, t| acc.checked_add(&t.amount))?;
        if !net.is_zero() {
            return Err(WalletError::ValidationError(format!(
                "Transfer list is unbalanced by {} tinybars",
                net.tinybars()
            )));
        }

        Ok(())
    }

    /// Serialized body handed to the extension for signing.
    pub fn to_bytes(&self) -> WalletResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A transfer transaction together with the signed bytes returned by the
/// wallet extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub transaction: TransferTransaction,
    #[serde(with = "hex_bytes")]
    pub signed_bytes: Vec<u8>,
}

impl SignedTransaction {
    pub fn new(transaction: TransferTransaction, signed_bytes: Vec<u8>) -> Self {
        Self {
            transaction,
            signed_bytes,
        }
    }

    pub fn signed_hex(&self) -> String {
        hex::encode(&self.signed_bytes)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Transfer status as reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Success,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Success => "success",
            TransferStatus::Failed => "failed",
        }
    }

    /// Map a ledger result code (`SUCCESS`, `INSUFFICIENT_PAYER_BALANCE`, ...)
    pub fn from_result_code(code: &str) -> Self {
        match code {
            "SUCCESS" => TransferStatus::Success,
            "" | "UNKNOWN" => TransferStatus::Pending,
            _ => TransferStatus::Failed,
        }
    }
}

/// What the wallet knows about one transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Hbar,
    pub status: TransferStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
}

impl TransferRecord {
    /// Record for a transfer that has just been handed to the ledger.
    pub fn submitted(from: AccountId, to: AccountId, amount: Hbar) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from,
            to,
            amount,
            status: TransferStatus::Pending,
            timestamp: Utc::now(),
            transaction_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransferStatus::Pending
    }
}
