//! Wallet connection and transfer flow.
//!
//! [`HederaWalletService`] bridges frontend actions to the injected wallet
//! extension and a ledger client. It owns no keys: the extension signs, the
//! ledger is the source of truth for balances and transfer outcomes, and the
//! service only keeps the last-known view of both.

use std::sync::Arc;

use crate::config_store::Environment;
use crate::errors::{WalletError, WalletResult};
use crate::extension::{ExtensionHandle, WalletExtension};
use crate::ledger::{AccountId, Hbar, Network, TransactionId};
use crate::ledger_client::LedgerConnector;
use crate::session::{SessionManager, SessionStore, WalletSession};
use crate::transaction::{TransferRecord, TransferStatus, TransferTransaction};
use crate::validation::InputValidator;

/// Default number of history entries requested from the ledger.
pub const DEFAULT_HISTORY_LIMIT: u32 = 25;

#[derive(Clone)]
pub struct HederaWalletService {
    extension: ExtensionHandle,
    connector: Arc<dyn LedgerConnector>,
    store: SessionStore,
    session: SessionManager,
    validator: Arc<InputValidator>,
    history_limit: u32,
    environment: Environment,
}

impl HederaWalletService {
    pub fn new(
        extension: ExtensionHandle,
        connector: Arc<dyn LedgerConnector>,
        store: SessionStore,
    ) -> Self {
        Self {
            extension,
            connector,
            store,
            session: SessionManager::new(),
            validator: Arc::new(InputValidator::default()),
            history_limit: DEFAULT_HISTORY_LIMIT,
            environment: Environment::default(),
        }
    }

    /// Restrict the networks the wallet may bind to.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn install_extension(&self, extension: Arc<dyn WalletExtension>) {
        self.extension.install(extension);
    }

    pub fn remove_extension(&self) {
        self.extension.remove();
    }

    pub fn extension_available(&self) -> bool {
        self.extension.is_available()
    }

    /// Pair with the wallet extension and enter the connected state.
    pub async fn connect(&self) -> WalletResult<WalletSession> {
        let extension = self.extension.get()?;

        let connection = extension.connect_to_local_wallet().await.map_err(|err| {
            log::error!("Hedera wallet connection error: {}", err);
            err
        })?;

        let primary = connection
            .account_ids
            .first()
            .ok_or(WalletError::NoAccountsAvailable)?;
        let account_id = AccountId::from_string(primary).map_err(|_| {
            crate::wallet_error!(External, format!("Wallet reported invalid account id '{}'", primary))
        })?;
        let network = Network::from_reported(connection.network.as_deref());
        if !self.environment.allows_network(network) {
            return Err(WalletError::ValidationError(format!(
                "{} is not available in the {} environment",
                network,
                self.environment.as_str()
            )));
        }

        let client = self.connector.for_network(network)?;
        self.session.establish(client, account_id);

        let balance = self.get_balance(&account_id).await?;
        self.session.set_balance(&account_id, balance);

        let session = WalletSession::new(account_id, network, Some(balance));
        if let Err(err) = self.store.save(&session) {
            log::error!("Failed to persist wallet session for {}: {}", account_id, err);
            self.session.clear();
            return Err(err);
        }

        log::info!("Connected Hedera account {} on {}", account_id, network);
        Ok(session)
    }

    /// Balance of `account_id` in HBAR.
    ///
    /// Fails only when no client was built yet; query failures are logged and
    /// reported as zero so a connected wallet can always be displayed.
    pub async fn get_balance(&self, account_id: &AccountId) -> WalletResult<Hbar> {
        let client = self.session.client()?;
        match client.get_account_balance(account_id).await {
            Ok(balance) if balance.is_negative() => {
                log::warn!("Ledger reported negative balance for {}", account_id);
                Ok(Hbar::ZERO)
            }
            Ok(balance) => Ok(balance),
            Err(err) => {
                log::error!("Error fetching account balance for {}: {}", account_id, err);
                Ok(Hbar::ZERO)
            }
        }
    }

    /// Re-read the connected account's balance and persist it.
    pub async fn refresh_balance(&self) -> WalletResult<Hbar> {
        let connected = self.session.connected()?;
        let balance = self.get_balance(&connected.account_id).await?;

        if self.session.set_balance(&connected.account_id, balance) {
            if let Some(session) = self.session.snapshot() {
                if let Err(err) = self.store.save(&session) {
                    log::warn!("Failed to persist refreshed balance: {}", err);
                }
            }
        }

        Ok(balance)
    }

    /// Send `amount` from the connected account to `to_account_id`.
    ///
    /// Every local precondition is checked before the extension is asked to
    /// sign. The balance check uses the cached balance and is advisory only.
    pub async fn transfer(&self, to_account_id: &str, amount: Hbar) -> WalletResult<TransactionId> {
        self.transfer_with_memo(to_account_id, amount, None).await
    }

    /// [`HederaWalletService::transfer`] with an optional transaction memo.
    pub async fn transfer_with_memo(
        &self,
        to_account_id: &str,
        amount: Hbar,
        memo: Option<&str>,
    ) -> WalletResult<TransactionId> {
        let connected = self.session.connected()?;
        let extension = self.extension.get()?;
        let recipient =
            self.validator
                .validate_transfer(to_account_id, amount, connected.balance)?;

        let mut transaction =
            TransferTransaction::between(connected.account_id, recipient, amount)?;
        if let Some(memo) = memo.map(str::trim).filter(|m| !m.is_empty()) {
            self.validator.validate_memo(memo)?;
            transaction = transaction.with_memo(memo);
        }

        let record = TransferRecord::submitted(connected.account_id, recipient, amount);
        let record_id = record.id.clone();
        self.session.track_transfer(record);

        let signed = match extension.sign_transaction(&transaction).await {
            Ok(signed) => signed,
            Err(err) => {
                log::error!("Transfer signing error: {}", err);
                self.session
                    .resolve_transfer(&record_id, Err(TransferStatus::Failed));
                return Err(match err {
                    WalletError::SigningFailed(msg) => WalletError::SigningFailed(msg),
                    other => WalletError::SigningFailed(other.to_string()),
                });
            }
        };

        match connected.client.execute(&signed).await {
            Ok(transaction_id) => {
                self.session.resolve_transfer(&record_id, Ok(&transaction_id));
                log::info!(
                    "Submitted transfer of {} from {} to {}: {}",
                    amount,
                    connected.account_id,
                    recipient,
                    transaction_id
                );
                Ok(transaction_id)
            }
            Err(err) => {
                log::error!("Transfer error: {}", err);
                self.session
                    .resolve_transfer(&record_id, Err(TransferStatus::Failed));
                Err(match err {
                    WalletError::SubmissionFailed(msg) => WalletError::SubmissionFailed(msg),
                    other => WalletError::SubmissionFailed(other.to_string()),
                })
            }
        }
    }

    /// Convenience for callers holding a floating point HBAR amount.
    pub async fn transfer_hbar(&self, to_account_id: &str, amount: f64) -> WalletResult<TransactionId> {
        let amount = Hbar::from_hbar_f64(amount)?;
        self.transfer(to_account_id, amount).await
    }

    /// Recent transfers for `account_id`, newest first.
    ///
    /// Transfers submitted in this session that the ledger has not reported
    /// yet are listed first as pending. Ledger failures yield an empty ledger
    /// part rather than an error.
    pub async fn transaction_history(
        &self,
        account_id: &AccountId,
    ) -> WalletResult<Vec<TransferRecord>> {
        let client = self.session.client()?;
        let reported = match client
            .get_transaction_history(account_id, self.history_limit)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                log::error!("Error fetching transaction history for {}: {}", account_id, err);
                Vec::new()
            }
        };

        // failed or ledger-reported transfers need no local tracking
        self.session.retain_transfers(|local| {
            local.is_pending()
                && !reported.iter().any(|r| {
                    r.transaction_id.is_some() && r.transaction_id == local.transaction_id
                })
        });

        let mut history: Vec<TransferRecord> = self
            .session
            .transfers()
            .into_iter()
            .rev()
            .filter(|local| local.from == *account_id || local.to == *account_id)
            .collect();
        history.extend(reported);
        Ok(history)
    }

    /// Leave the connected state and forget the persisted session.
    pub fn disconnect(&self) {
        let account = self.session.account_id();
        self.session.clear();
        if let Err(err) = self.store.clear() {
            log::warn!("Failed to clear stored wallet data: {}", err);
        }
        if let Some(account) = account {
            log::info!("Disconnected Hedera account {}", account);
        }
    }

    /// Persisted session, without checking it against the extension.
    pub fn get_stored_session(&self) -> Option<WalletSession> {
        self.store.load()
    }

    /// Re-enter the persisted session, if any, and refresh its balance.
    pub async fn restore_session(&self) -> WalletResult<Option<WalletSession>> {
        let stored = match self.store.load() {
            Some(stored) => stored,
            None => return Ok(None),
        };

        if !self.environment.allows_network(stored.network) {
            log::warn!(
                "Ignoring stored {} session in the {} environment",
                stored.network,
                self.environment.as_str()
            );
            return Ok(None);
        }

        let client = self.connector.for_network(stored.network)?;
        self.session.establish(client, stored.account_id);
        if let Some(balance) = stored.balance {
            self.session.set_balance(&stored.account_id, balance);
        }

        let balance = self.get_balance(&stored.account_id).await?;
        self.session.set_balance(&stored.account_id, balance);

        let session = WalletSession::new(stored.account_id, stored.network, Some(balance));
        if let Err(err) = self.store.save(&session) {
            log::warn!("Failed to persist restored session: {}", err);
        }

        log::info!(
            "Restored Hedera account {} on {}",
            session.account_id,
            session.network
        );
        Ok(Some(session))
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn account_id(&self) -> Option<AccountId> {
        self.session.account_id()
    }

    pub fn network(&self) -> Option<Network> {
        self.session.network()
    }

    pub fn cached_balance(&self) -> Option<Hbar> {
        self.session.balance()
    }

    /// Live session view, `None` while disconnected.
    pub fn current_session(&self) -> Option<WalletSession> {
        self.session.snapshot()
    }

    /// Transfers submitted since connecting, oldest first.
    pub fn submitted_transfers(&self) -> Vec<TransferRecord> {
        self.session.transfers()
    }
}

impl std::fmt::Debug for HederaWalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HederaWalletService")
            .field("extension", &self.extension)
            .field("store", &self.store)
            .field("session", &self.session)
            .field("environment", &self.environment)
            .finish()
    }
}
