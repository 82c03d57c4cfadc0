use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{WalletError, WalletResult};
use crate::ledger::{AccountId, Hbar, Network, TransactionId};
use crate::ledger_client::LedgerClient;
use crate::storage::KeyValueStore;
use crate::transaction::{TransferRecord, TransferStatus};

/// Default key the session is persisted under.
pub const DEFAULT_SESSION_KEY: &str = "hedera-wallet-data";

/// Upper bound on transfers tracked in memory for one session.
pub const MAX_TRACKED_TRANSFERS: usize = 100;

/// A connected wallet as shown to the user and persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub account_id: AccountId,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Hbar>,
}

impl WalletSession {
    pub fn new(account_id: AccountId, network: Network, balance: Option<Hbar>) -> Self {
        Self {
            account_id,
            network,
            balance,
        }
    }
}

/// On-disk shape. `balance` is decimal HBAR for readers of the stored
/// session and goes through `f64`, which is exact only up to 2^53 tinybars;
/// `balanceTinybars` carries the exact value and wins when present.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    account_id: AccountId,
    network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    balance: Option<Hbar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    balance_tinybars: Option<i64>,
}

impl From<&WalletSession> for StoredSession {
    fn from(session: &WalletSession) -> Self {
        Self {
            account_id: session.account_id,
            network: session.network,
            balance: session.balance,
            balance_tinybars: session.balance.map(|b| b.tinybars()),
        }
    }
}

impl From<StoredSession> for WalletSession {
    fn from(stored: StoredSession) -> Self {
        let balance = stored
            .balance_tinybars
            .map(Hbar::from_tinybars)
            .or(stored.balance);
        WalletSession::new(stored.account_id, stored.network, balance)
    }
}

/// Persists the wallet session as JSON under a fixed key.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(backend, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored session, if any. Unreadable or malformed data counts as absent.
    pub fn load(&self) -> Option<WalletSession> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::error!("Error reading stored wallet data: {}", err);
                return None;
            }
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Some(stored.into()),
            Err(err) => {
                log::warn!("Ignoring malformed stored wallet data: {}", err);
                None
            }
        }
    }

    pub fn save(&self, session: &WalletSession) -> WalletResult<()> {
        let encoded = serde_json::to_string(&StoredSession::from(session))?;
        self.backend.set(&self.key, &encoded)
    }

    pub fn clear(&self) -> WalletResult<()> {
        self.backend.remove(&self.key)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("key", &self.key).finish()
    }
}

#[derive(Default)]
struct SessionState {
    client: Option<Arc<dyn LedgerClient>>,
    account_id: Option<AccountId>,
    network: Option<Network>,
    balance: Option<Hbar>,
    transfers: Vec<TransferRecord>,
}

/// Everything needed to act on behalf of the connected account.
#[derive(Clone)]
pub struct ConnectedAccount {
    pub client: Arc<dyn LedgerClient>,
    pub account_id: AccountId,
    pub network: Network,
    pub balance: Hbar,
}

/// Tracks the live connection: ledger client, account, cached balance and
/// transfers submitted during this session.
///
/// Locks are only held for the duration of a field update, never across an
/// await point.
#[derive(Clone, Default)]
pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        let state = self.state.read();
        state.client.is_some() && state.account_id.is_some()
    }

    /// Enter the connected state. Any previously tracked transfers belong to
    /// the old account and are dropped.
    pub fn establish(&self, client: Arc<dyn LedgerClient>, account_id: AccountId) {
        let mut state = self.state.write();
        state.network = Some(client.network());
        state.client = Some(client);
        state.account_id = Some(account_id);
        state.balance = None;
        state.transfers.clear();
    }

    /// Ledger client bound at connect time.
    pub fn client(&self) -> WalletResult<Arc<dyn LedgerClient>> {
        self.state
            .read()
            .client
            .clone()
            .ok_or(WalletError::ClientNotInitialized)
    }

    /// Client, account and last-known balance of the connected wallet.
    pub fn connected(&self) -> WalletResult<ConnectedAccount> {
        let state = self.state.read();
        match (&state.client, state.account_id, state.network) {
            (Some(client), Some(account_id), Some(network)) => Ok(ConnectedAccount {
                client: Arc::clone(client),
                account_id,
                network,
                balance: state.balance.unwrap_or(Hbar::ZERO),
            }),
            _ => Err(WalletError::WalletNotConnected),
        }
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.state.read().account_id
    }

    pub fn network(&self) -> Option<Network> {
        self.state.read().network
    }

    pub fn balance(&self) -> Option<Hbar> {
        self.state.read().balance
    }

    /// Update the cached balance if `account_id` is still the connected one.
    pub fn set_balance(&self, account_id: &AccountId, balance: Hbar) -> bool {
        let mut state = self.state.write();
        if state.account_id.as_ref() != Some(account_id) {
            return false;
        }
        state.balance = Some(balance.max(Hbar::ZERO));
        true
    }

    /// Session view of the live state.
    pub fn snapshot(&self) -> Option<WalletSession> {
        let state = self.state.read();
        match (state.account_id, state.network) {
            (Some(account_id), Some(network)) => {
                Some(WalletSession::new(account_id, network, state.balance))
            }
            _ => None,
        }
    }

    /// Track a submitted transfer, dropping the oldest ones past
    /// [`MAX_TRACKED_TRANSFERS`].
    pub fn track_transfer(&self, record: TransferRecord) {
        let mut state = self.state.write();
        state.transfers.push(record);
        let excess = state.transfers.len().saturating_sub(MAX_TRACKED_TRANSFERS);
        if excess > 0 {
            state.transfers.drain(..excess);
        }
    }

    /// Keep only the tracked transfers matching `keep`.
    pub fn retain_transfers<F>(&self, keep: F)
    where
        F: FnMut(&TransferRecord) -> bool,
    {
        self.state.write().transfers.retain(keep);
    }

    /// Record the submission outcome for a tracked transfer.
    pub fn resolve_transfer(
        &self,
        record_id: &str,
        outcome: Result<&TransactionId, TransferStatus>,
    ) {
        let mut state = self.state.write();
        if let Some(record) = state.transfers.iter_mut().find(|r| r.id == record_id) {
            match outcome {
                Ok(transaction_id) => record.transaction_id = Some(transaction_id.clone()),
                Err(status) => record.status = status,
            }
        }
    }

    /// Transfers submitted during this session, oldest first.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.state.read().transfers.clone()
    }

    /// Drop the client, account, balance and tracked transfers.
    pub fn clear(&self) {
        let mut state = self.state.write();
        *state = SessionState::default();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SessionManager")
            .field("account_id", &state.account_id)
            .field("network", &state.network)
            .field("balance", &state.balance)
            .field("transfers", &state.transfers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use crate::transaction::SignedTransaction;
    use async_trait::async_trait;

    struct StaticLedger(Network);

    #[async_trait]
    impl LedgerClient for StaticLedger {
        fn network(&self) -> Network {
            self.0
        }

        async fn get_account_balance(&self, _: &AccountId) -> WalletResult<Hbar> {
            Ok(Hbar::ZERO)
        }

        async fn execute(&self, _: &SignedTransaction) -> WalletResult<TransactionId> {
            Err(WalletError::SubmissionFailed("static".into()))
        }

        async fn get_transaction_history(
            &self,
            _: &AccountId,
            _: u32,
        ) -> WalletResult<Vec<TransferRecord>> {
            Ok(Vec::new())
        }
    }

    fn account(num: u64) -> AccountId {
        AccountId::new(0, 0, num)
    }

    #[test]
    fn store_round_trip_uses_frontend_shape() {
        let backend = MemoryKeyValueStore::new();
        let store = SessionStore::new(Arc::new(backend.clone()));
        let session = WalletSession::new(
            account(123456),
            Network::Testnet,
            Some(Hbar::from_hbar_f64(10.5).unwrap()),
        );
        store.save(&session).unwrap();

        let raw = backend.get(DEFAULT_SESSION_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "accountId": "0.0.123456",
                "network": "testnet",
                "balance": 10.5,
                "balanceTinybars": 1_050_000_000i64
            })
        );

        assert_eq!(store.load(), Some(session));
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn large_balances_survive_persistence_exactly() {
        let store = SessionStore::new(Arc::new(MemoryKeyValueStore::new()));
        // 2^53 + 1 tinybars is not representable as f64
        let balance = Hbar::from_tinybars(9_007_199_254_740_993);
        let session = WalletSession::new(account(1), Network::Mainnet, Some(balance));
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap().balance, Some(balance));
    }

    #[test]
    fn malformed_session_is_absent() {
        let backend = MemoryKeyValueStore::new();
        let store = SessionStore::new(Arc::new(backend.clone()));

        for raw in ["not json", "{}", r#"{"accountId":"abc","network":"testnet"}"#] {
            backend.set(DEFAULT_SESSION_KEY, raw).unwrap();
            assert_eq!(store.load(), None, "expected {:?} to be ignored", raw);
        }

        backend
            .set(DEFAULT_SESSION_KEY, r#"{"accountId":"0.0.7","network":"mainnet"}"#)
            .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.account_id, account(7));
        assert_eq!(loaded.balance, None);
    }

    #[test]
    fn manager_connect_and_clear_cycle() {
        let manager = SessionManager::new();
        assert!(!manager.is_connected());
        assert!(matches!(manager.client(), Err(WalletError::ClientNotInitialized)));
        assert!(matches!(manager.connected(), Err(WalletError::WalletNotConnected)));

        manager.establish(Arc::new(StaticLedger(Network::Mainnet)), account(5));
        assert!(manager.is_connected());
        assert_eq!(manager.network(), Some(Network::Mainnet));
        assert_eq!(manager.connected().unwrap().balance, Hbar::ZERO);

        assert!(manager.set_balance(&account(5), Hbar::from_hbar(3).unwrap()));
        assert!(!manager.set_balance(&account(6), Hbar::from_hbar(9).unwrap()));
        assert_eq!(
            manager.snapshot().unwrap().balance,
            Some(Hbar::from_hbar(3).unwrap())
        );

        manager.clear();
        assert!(!manager.is_connected());
        assert!(manager.snapshot().is_none());
    }

    #[test]
    fn tracked_transfers_follow_submission_outcome() {
        let manager = SessionManager::new();
        manager.establish(Arc::new(StaticLedger(Network::Testnet)), account(1));

        let ok = TransferRecord::submitted(account(1), account(2), Hbar::from_tinybars(5));
        let failed = TransferRecord::submitted(account(1), account(3), Hbar::from_tinybars(6));
        manager.track_transfer(ok.clone());
        manager.track_transfer(failed.clone());

        let tx_id = TransactionId::new(account(1), 100, 1);
        manager.resolve_transfer(&ok.id, Ok(&tx_id));
        manager.resolve_transfer(&failed.id, Err(TransferStatus::Failed));

        let transfers = manager.transfers();
        assert_eq!(transfers[0].transaction_id, Some(tx_id));
        assert_eq!(transfers[0].status, TransferStatus::Pending);
        assert_eq!(transfers[1].status, TransferStatus::Failed);

        manager.retain_transfers(|r| r.status != TransferStatus::Failed);
        assert_eq!(manager.transfers().len(), 1);

        manager.establish(Arc::new(StaticLedger(Network::Testnet)), account(9));
        assert!(manager.transfers().is_empty());
    }

    #[test]
    fn tracked_transfers_are_bounded() {
        let manager = SessionManager::new();
        manager.establish(Arc::new(StaticLedger(Network::Testnet)), account(1));

        let first = TransferRecord::submitted(account(1), account(2), Hbar::from_tinybars(1));
        manager.track_transfer(first.clone());
        for _ in 0..MAX_TRACKED_TRANSFERS {
            manager.track_transfer(TransferRecord::submitted(
                account(1),
                account(3),
                Hbar::from_tinybars(1),
            ));
        }

        let transfers = manager.transfers();
        assert_eq!(transfers.len(), MAX_TRACKED_TRANSFERS);
        assert!(transfers.iter().all(|r| r.id != first.id));
    }
}
