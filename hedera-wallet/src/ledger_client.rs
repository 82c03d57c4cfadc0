/// Ledger client for balance queries, transaction submission and history
///
/// The wallet talks to the ledger through [`LedgerClient`]. The default
/// implementation reads balances and history from a Hedera mirror node REST
/// API. Mirror nodes are read-only, so submitting transfers needs a
/// consensus-capable client supplied through a [`LedgerConnector`].
use crate::config_store::{NetworkConfig, NetworkEndpoints};
use crate::errors::{WalletError, WalletResult};
use crate::ledger::{AccountId, Hbar, Network, TransactionId};
use crate::transaction::{SignedTransaction, TransferRecord, TransferStatus};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Operations the wallet needs from a ledger network
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Network this client is bound to
    fn network(&self) -> Network;

    /// Current balance of an account
    async fn get_account_balance(&self, account_id: &AccountId) -> WalletResult<Hbar>;

    /// Submit a signed transaction, returning the ledger-assigned id
    async fn execute(&self, transaction: &SignedTransaction) -> WalletResult<TransactionId>;

    /// Most recent transfers touching an account, newest first
    async fn get_transaction_history(
        &self,
        account_id: &AccountId,
        limit: u32,
    ) -> WalletResult<Vec<TransferRecord>>;
}

/// Builds a ledger client bound to a network (`forTestnet` / `forMainnet`)
pub trait LedgerConnector: Send + Sync {
    fn for_network(&self, network: Network) -> WalletResult<Arc<dyn LedgerClient>>;
}

/// Read-only HTTP client for mirror node queries
pub struct HttpLedgerClient {
    client: Client,
    network: Network,
    mirror_url: String,
}

#[derive(Debug, Deserialize)]
struct MirrorBalancesResponse {
    #[serde(default)]
    balances: Vec<MirrorBalance>,
}

#[derive(Debug, Deserialize)]
struct MirrorBalance {
    account: String,
    balance: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MirrorTransactionsResponse {
    #[serde(default)]
    transactions: Vec<MirrorTransaction>,
}

#[derive(Debug, Deserialize)]
struct MirrorTransaction {
    transaction_id: String,
    consensus_timestamp: String,
    #[serde(default)]
    result: String,
    #[serde(default)]
    transfers: Vec<MirrorTransfer>,
}

#[derive(Debug, Deserialize)]
struct MirrorTransfer {
    account: String,
    amount: i64,
}

impl HttpLedgerClient {
    /// Create a new client for one network
    pub fn new(
        network: Network,
        endpoints: &NetworkEndpoints,
        timeout: Duration,
    ) -> WalletResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            WalletError::NetworkError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(HttpLedgerClient {
            client,
            network,
            mirror_url: endpoints.mirror_url.trim_end_matches('/').to_string(),
        })
    }

    async fn mirror_get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> WalletResult<T> {
        let url = format!("{}{}", self.mirror_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WalletError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn get_account_balance(&self, account_id: &AccountId) -> WalletResult<Hbar> {
        let path = format!("/api/v1/balances?account.id={}", account_id);
        let response: MirrorBalancesResponse = self.mirror_get(&path).await?;
        balance_from_mirror(account_id, response)
    }

    async fn execute(&self, transaction: &SignedTransaction) -> WalletResult<TransactionId> {
        log::warn!(
            "Refusing to submit transfer from {:?}: the {} mirror node is read-only",
            transaction.transaction.payer().map(|p| p.to_string()),
            self.network
        );
        Err(WalletError::SubmissionFailed(format!(
            "the {} mirror node cannot submit transactions, a consensus node client is required",
            self.network
        )))
    }

    async fn get_transaction_history(
        &self,
        account_id: &AccountId,
        limit: u32,
    ) -> WalletResult<Vec<TransferRecord>> {
        let path = format!(
            "/api/v1/transactions?account.id={}&transactiontype=CRYPTOTRANSFER&limit={}&order=desc",
            account_id,
            limit.clamp(1, 100)
        );
        let response: MirrorTransactionsResponse = self.mirror_get(&path).await?;
        Ok(records_from_mirror(response))
    }
}

fn balance_from_mirror(
    account_id: &AccountId,
    response: MirrorBalancesResponse,
) -> WalletResult<Hbar> {
    let wanted = account_id.to_string();
    let entry = response
        .balances
        .into_iter()
        .find(|b| b.account == wanted)
        .ok_or_else(|| {
            WalletError::InvalidResponse(format!("No balance reported for {}", wanted))
        })?;

    if entry.balance < 0 {
        return Err(WalletError::InvalidResponse(format!(
            "Negative balance reported for {}",
            wanted
        )));
    }

    Ok(Hbar::from_tinybars(entry.balance))
}

/// Turn mirror node transactions into transfer records.
///
/// Sender is the most-debited account; recipient is the most-credited other
/// account, so node and network fee credits are not mistaken for the
/// recipient. Entries that cannot be interpreted are skipped.
pub(crate) fn records_from_mirror(response: MirrorTransactionsResponse) -> Vec<TransferRecord> {
    response
        .transactions
        .into_iter()
        .filter_map(|tx| {
            let legs: Vec<(AccountId, i64)> = tx
                .transfers
                .iter()
                .filter_map(|t| AccountId::from_string(&t.account).ok().map(|a| (a, t.amount)))
                .collect();

            let (from, _) = legs
                .iter()
                .filter(|(_, amount)| *amount < 0)
                .min_by_key(|(_, amount)| *amount)?;
            let (to, credited) = legs
                .iter()
                .filter(|(account, amount)| *amount > 0 && account != from)
                .max_by_key(|(_, amount)| *amount)?;

            let transaction_id = TransactionId::from_string(&tx.transaction_id).ok();
            Some(TransferRecord {
                id: tx.transaction_id.clone(),
                from: *from,
                to: *to,
                amount: Hbar::from_tinybars(*credited),
                status: TransferStatus::from_result_code(&tx.result),
                timestamp: parse_consensus_timestamp(&tx.consensus_timestamp)
                    .unwrap_or_else(Utc::now),
                transaction_id,
            })
        })
        .collect()
}

fn parse_consensus_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let (seconds, nanos) = value.split_once('.').unwrap_or((value, "0"));
    let seconds = seconds.parse::<i64>().ok()?;
    let nanos = nanos.parse::<u32>().ok()?;
    Utc.timestamp_opt(seconds, nanos).single()
}

/// Connector producing [`HttpLedgerClient`]s from the network configuration
#[derive(Debug, Clone)]
pub struct HttpLedgerConnector {
    config: NetworkConfig,
}

impl HttpLedgerConnector {
    pub fn new(config: NetworkConfig) -> Self {
        Self { config }
    }
}

impl LedgerConnector for HttpLedgerConnector {
    fn for_network(&self, network: Network) -> WalletResult<Arc<dyn LedgerClient>> {
        let client = HttpLedgerClient::new(
            network,
            self.config.endpoints(network),
            self.config.request_timeout(),
        )?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror_transactions(json: serde_json::Value) -> MirrorTransactionsResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn balance_lookup_matches_account() {
        let response: MirrorBalancesResponse = serde_json::from_value(serde_json::json!({
            "timestamp": "1700000000.000000000",
            "balances": [{ "account": "0.0.1001", "balance": 2_000_000_000i64, "tokens": [] }]
        }))
        .unwrap();
        let balance = balance_from_mirror(&AccountId::new(0, 0, 1001), response).unwrap();
        assert_eq!(balance, Hbar::from_hbar(20).unwrap());

        let empty: MirrorBalancesResponse =
            serde_json::from_value(serde_json::json!({ "balances": [] })).unwrap();
        assert!(matches!(
            balance_from_mirror(&AccountId::new(0, 0, 1001), empty),
            Err(WalletError::InvalidResponse(_))
        ));
    }

    #[test]
    fn mirror_transfers_become_records() {
        let response = mirror_transactions(serde_json::json!({
            "transactions": [{
                "transaction_id": "0.0.1001-1700000000-000000001",
                "consensus_timestamp": "1700000001.500000000",
                "result": "SUCCESS",
                "name": "CRYPTOTRANSFER",
                "transfers": [
                    { "account": "0.0.3", "amount": 50_000 },
                    { "account": "0.0.98", "amount": 100_000 },
                    { "account": "0.0.1001", "amount": -1_050_150_000i64 },
                    { "account": "0.0.123456", "amount": 1_050_000_000i64 }
                ]
            }, {
                "transaction_id": "0.0.1001-1700000100-000000002",
                "consensus_timestamp": "1700000101.000000000",
                "result": "INSUFFICIENT_ACCOUNT_BALANCE",
                "transfers": [
                    { "account": "0.0.1001", "amount": -150_000 },
                    { "account": "0.0.98", "amount": 150_000 }
                ]
            }]
        }));

        let records = records_from_mirror(response);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.from, AccountId::new(0, 0, 1001));
        assert_eq!(first.to, AccountId::new(0, 0, 123456));
        assert_eq!(first.amount.tinybars(), 1_050_000_000);
        assert_eq!(first.status, TransferStatus::Success);
        assert_eq!(
            first.transaction_id.as_ref().unwrap().to_string(),
            "0.0.1001@1700000000.000000001"
        );
        assert_eq!(first.timestamp.timestamp(), 1_700_000_001);

        assert_eq!(records[1].status, TransferStatus::Failed);
        assert_eq!(records[1].to, AccountId::new(0, 0, 98));
    }

    #[test]
    fn uninterpretable_mirror_entries_are_skipped() {
        let response = mirror_transactions(serde_json::json!({
            "transactions": [{
                "transaction_id": "0.0.1-1-1",
                "consensus_timestamp": "1.0",
                "result": "SUCCESS",
                "transfers": [{ "account": "0.0.1", "amount": 10 }]
            }]
        }));
        assert!(records_from_mirror(response).is_empty());
    }

    #[tokio::test]
    async fn mirror_client_does_not_submit() {
        let connector = HttpLedgerConnector::new(NetworkConfig::default());
        let client = connector.for_network(Network::Testnet).unwrap();
        let tx = crate::transaction::TransferTransaction::between(
            AccountId::new(0, 0, 1001),
            AccountId::new(0, 0, 2),
            Hbar::from_tinybars(10),
        )
        .unwrap();
        let signed = SignedTransaction::new(tx, vec![1, 2, 3]);
        assert!(matches!(
            client.execute(&signed).await,
            Err(WalletError::SubmissionFailed(_))
        ));
    }

    #[test]
    fn connector_binds_requested_network() {
        let connector = HttpLedgerConnector::new(NetworkConfig::default());
        let client = connector.for_network(Network::Mainnet).unwrap();
        assert_eq!(client.network(), Network::Mainnet);
        let client = connector.for_network(Network::Testnet).unwrap();
        assert_eq!(client.network(), Network::Testnet);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires network access to the public testnet mirror node"]
    async fn test_real_balance_call() {
        let config = NetworkConfig::default();
        let client = HttpLedgerClient::new(
            Network::Testnet,
            config.endpoints(Network::Testnet),
            config.request_timeout(),
        )
        .unwrap();
        let result = client.get_account_balance(&AccountId::new(0, 0, 98)).await;
        assert!(result.is_ok(), "Balance call should succeed");
    }

    #[tokio::test]
    #[ignore = "requires network access to the public testnet mirror node"]
    async fn test_real_history_call() {
        let config = NetworkConfig::default();
        let client = HttpLedgerClient::new(
            Network::Testnet,
            config.endpoints(Network::Testnet),
            config.request_timeout(),
        )
        .unwrap();
        let result = client
            .get_transaction_history(&AccountId::new(0, 0, 98), 5)
            .await;
        assert!(result.is_ok(), "History call should succeed");
    }
}
