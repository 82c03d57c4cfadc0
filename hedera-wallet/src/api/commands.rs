//! Commands invoked by the frontend.
//!
//! Each command returns `Result<_, String>` carrying the user-visible
//! message of the underlying [`WalletError`].

use crate::api::types::{
    BalanceRequest, BalanceResponse, ConnectWalletResponse, DisconnectWalletResponse,
    TransactionHistoryResponse, TransactionInfo, TransferRequest, TransferResponse,
    ValidateAccountIdRequest, ValidateAccountIdResponse, WalletStatusResponse, WalletSummary,
};
use crate::app_state::SharedWalletContext;
use crate::errors::WalletError;
use crate::ledger::AccountId;
use crate::validation::InputValidator;

pub const EMPTY_FIELDS_MESSAGE: &str = "Please fill in all fields";

fn to_frontend_error(err: WalletError) -> String {
    err.to_string()
}

pub async fn connect_wallet(state: &SharedWalletContext) -> Result<ConnectWalletResponse, String> {
    let session = state
        .service()
        .connect()
        .await
        .map_err(to_frontend_error)?;

    Ok(ConnectWalletResponse {
        summary: WalletSummary::from(session),
    })
}

pub fn disconnect_wallet(state: &SharedWalletContext) -> DisconnectWalletResponse {
    state.service().disconnect();
    DisconnectWalletResponse { connected: false }
}

pub fn get_wallet_status(state: &SharedWalletContext) -> WalletStatusResponse {
    let service = state.service();
    let summary = service
        .current_session()
        .or_else(|| service.get_stored_session())
        .map(WalletSummary::from);

    WalletStatusResponse {
        connected: service.is_connected(),
        extension_available: service.extension_available(),
        summary,
        config: state.config(),
    }
}

/// Re-enter the stored session on application start.
pub async fn restore_wallet(state: &SharedWalletContext) -> Result<Option<WalletSummary>, String> {
    let restored = state.start().await.map_err(to_frontend_error)?;
    Ok(restored.map(WalletSummary::from))
}

pub async fn get_balance(
    state: &SharedWalletContext,
    request: BalanceRequest,
) -> Result<BalanceResponse, String> {
    let account_id = AccountId::from_string(request.account_id.trim()).map_err(to_frontend_error)?;
    let balance = state
        .service()
        .get_balance(&account_id)
        .await
        .map_err(to_frontend_error)?;

    Ok(BalanceResponse {
        account_id: account_id.to_string(),
        balance: balance.as_string(),
        tinybars: balance.tinybars(),
    })
}

pub async fn refresh_balance(state: &SharedWalletContext) -> Result<BalanceResponse, String> {
    let service = state.service();
    let balance = service.refresh_balance().await.map_err(to_frontend_error)?;
    let account_id = service
        .account_id()
        .ok_or_else(|| to_frontend_error(WalletError::WalletNotConnected))?;

    Ok(BalanceResponse {
        account_id: account_id.to_string(),
        balance: balance.as_string(),
        tinybars: balance.tinybars(),
    })
}

/// Submit the send form. The balance is refreshed after a successful
/// transfer; a failed refresh does not fail the command.
pub async fn send_transfer(
    state: &SharedWalletContext,
    request: TransferRequest,
) -> Result<TransferResponse, String> {
    let recipient = request.recipient.trim();
    let amount = request.amount.trim();
    if recipient.is_empty() || amount.is_empty() {
        return Err(EMPTY_FIELDS_MESSAGE.to_string());
    }

    let validator = InputValidator::default();
    let amount = validator.parse_amount(amount).map_err(to_frontend_error)?;

    let service = state.service();
    let transaction_id = service
        .transfer_with_memo(recipient, amount, request.memo.as_deref())
        .await
        .map_err(to_frontend_error)?;

    let balance = match service.refresh_balance().await {
        Ok(balance) => Some(balance.as_string()),
        Err(err) => {
            log::warn!("Balance refresh after transfer failed: {}", err);
            None
        }
    };

    Ok(TransferResponse {
        message: format!("Transfer successful! Transaction ID: {}", transaction_id),
        transaction_id: transaction_id.to_string(),
        balance,
    })
}

pub async fn get_transaction_history(
    state: &SharedWalletContext,
) -> Result<TransactionHistoryResponse, String> {
    let service = state.service();
    let account_id = service
        .account_id()
        .ok_or_else(|| to_frontend_error(WalletError::WalletNotConnected))?;

    let transactions: Vec<TransactionInfo> = service
        .transaction_history(&account_id)
        .await
        .map_err(to_frontend_error)?
        .into_iter()
        .map(TransactionInfo::from)
        .collect();

    Ok(TransactionHistoryResponse {
        total_count: transactions.len() as u64,
        transactions,
    })
}

pub fn validate_account_id(request: ValidateAccountIdRequest) -> ValidateAccountIdResponse {
    ValidateAccountIdResponse {
        is_valid: AccountId::is_valid(request.account_id.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_validation_command() {
        let check = |id: &str| {
            validate_account_id(ValidateAccountIdRequest {
                account_id: id.to_string(),
            })
            .is_valid
        };
        assert!(check("0.0.123456"));
        assert!(check(" 0.0.1 "));
        assert!(!check("0.0"));
        assert!(!check("abc"));
    }

    #[test]
    fn frontend_errors_are_user_messages() {
        assert_eq!(
            to_frontend_error(WalletError::WalletNotConnected),
            "Wallet not connected"
        );
    }
}
