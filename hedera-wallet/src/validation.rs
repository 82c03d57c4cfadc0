use crate::errors::{WalletError, WalletResult};
use crate::ledger::{AccountId, Hbar};
use regex::Regex;

/// Input validation utilities for the wallet
pub struct InputValidator {
    // Compiled regex patterns for performance
    account_id_pattern: Regex,
    amount_pattern: Regex,

    // Blacklisted patterns for security
    malicious_patterns: Vec<Regex>,
}

impl InputValidator {
    pub fn new() -> WalletResult<Self> {
        let account_id_pattern = Regex::new(r"^\d+\.\d+\.\d+$").map_err(|e| {
            WalletError::ValidationError(format!("Invalid account id regex: {}", e))
        })?;

        let amount_pattern = Regex::new(r"^\d*(\.\d{1,8})?$")
            .map_err(|e| WalletError::ValidationError(format!("Invalid amount regex: {}", e)))?;

        // Common malicious patterns to block
        let malicious_patterns = [
            r"(?i)<script",
            r"(?i)javascript:",
            r"(?i)data:text/html",
            r"(?i)vbscript:",
            r"(?i)onload=",
            r"(?i)onerror=",
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| {
                WalletError::ValidationError(format!("Invalid security regex: {}", e))
            })
        })
        .collect::<WalletResult<Vec<_>>>()?;

        Ok(InputValidator {
            account_id_pattern,
            amount_pattern,
            malicious_patterns,
        })
    }

    /// Validate a recipient account id
    ///
    /// Anything that is not `integer.integer.integer` is an
    /// `InvalidRecipientFormat`, including empty and suspicious input. Each
    /// part must fit in a `u64`; leading zeros are accepted.
    pub fn validate_account_id(&self, account_id: &str) -> WalletResult<AccountId> {
        let invalid = || WalletError::InvalidRecipientFormat(account_id.to_string());

        if account_id.is_empty() || self.check_basic_security(account_id).is_err() {
            return Err(invalid());
        }

        if !self.account_id_pattern.is_match(account_id) {
            return Err(invalid());
        }

        AccountId::from_string(account_id).map_err(|_| invalid())
    }

    /// Validate and parse an amount typed into a form
    pub fn parse_amount(&self, amount: &str) -> WalletResult<Hbar> {
        let amount = amount.trim();
        self.check_basic_security(amount)?;

        if amount.is_empty() {
            return Err(WalletError::InvalidAmount(
                "Amount cannot be empty".to_string(),
            ));
        }

        if !self.amount_pattern.is_match(amount) {
            return Err(WalletError::InvalidAmount(
                "Amount format is invalid".to_string(),
            ));
        }

        let parsed = Hbar::from_string(amount)?;
        self.validate_amount(parsed)?;
        Ok(parsed)
    }

    /// Validate that an amount can be sent
    pub fn validate_amount(&self, amount: Hbar) -> WalletResult<()> {
        if !amount.is_positive() {
            return Err(WalletError::InvalidAmount(
                "Amount must be greater than 0".to_string(),
            ));
        }

        if amount.tinybars() > Hbar::MAX_HBAR * Hbar::TINYBARS_PER_HBAR {
            return Err(WalletError::InvalidAmount("Amount too large".to_string()));
        }

        Ok(())
    }

    /// Check every transfer precondition that can be decided locally.
    ///
    /// Order matters for the reported error: amount, recipient syntax, then
    /// the balance check against the last known balance. The balance check is
    /// advisory, the ledger has the final say.
    pub fn validate_transfer(
        &self,
        recipient: &str,
        amount: Hbar,
        cached_balance: Hbar,
    ) -> WalletResult<AccountId> {
        self.validate_amount(amount)?;
        let recipient = self.validate_account_id(recipient)?;

        if amount > cached_balance {
            return Err(WalletError::InsufficientBalance {
                requested: amount.as_string(),
                available: cached_balance.as_string(),
            });
        }

        Ok(recipient)
    }

    /// Validate a transfer memo
    pub fn validate_memo(&self, memo: &str) -> WalletResult<()> {
        self.check_basic_security(memo)?;

        // Ledger limit on memo size
        if memo.len() > 100 {
            return Err(WalletError::ValidationError(
                "Memo must be at most 100 bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Basic security checks for all inputs
    fn check_basic_security(&self, input: &str) -> WalletResult<()> {
        if input.contains('\0') {
            return Err(WalletError::ValidationError(
                "Input contains null bytes".to_string(),
            ));
        }

        for pattern in &self.malicious_patterns {
            if pattern.is_match(input) {
                return Err(WalletError::ValidationError(
                    "Input contains potentially malicious content".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new().expect("Failed to create InputValidator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hbar(value: &str) -> Hbar {
        Hbar::from_string(value).unwrap()
    }

    #[test]
    fn test_account_id_validation() {
        let validator = InputValidator::default();

        assert_eq!(
            validator.validate_account_id("0.0.123456").unwrap(),
            AccountId::new(0, 0, 123456)
        );

        for bad in ["0.0", "0.0.x", "0x1234", "0.0.1.", "1.2.3.4", "-1.0.0"] {
            assert!(matches!(
                validator.validate_account_id(bad),
                Err(WalletError::InvalidRecipientFormat(_))
            ));
        }

        assert!(matches!(
            validator.validate_account_id(""),
            Err(WalletError::InvalidRecipientFormat(_))
        ));
    }

    #[test]
    fn test_account_id_numeric_bounds() {
        let validator = InputValidator::default();

        let padded = format!("0.0.{}1", "0".repeat(80));
        assert_eq!(
            validator.validate_account_id(&padded).unwrap(),
            AccountId::new(0, 0, 1)
        );

        let max = format!("0.0.{}", u64::MAX);
        assert_eq!(validator.validate_account_id(&max).unwrap().num, u64::MAX);

        // one past u64::MAX
        assert!(matches!(
            validator.validate_account_id("0.0.18446744073709551616"),
            Err(WalletError::InvalidRecipientFormat(_))
        ));
    }

    #[test]
    fn test_amount_parsing() {
        let validator = InputValidator::default();

        assert_eq!(validator.parse_amount("10.5").unwrap(), hbar("10.5"));
        assert_eq!(validator.parse_amount(" 1 ").unwrap(), hbar("1"));
        assert!(validator.parse_amount("0").is_err());
        assert!(validator.parse_amount("-5").is_err());
        assert!(validator.parse_amount("1.123456789").is_err());
        assert!(validator.parse_amount("1e5").is_err());
        assert!(validator.parse_amount("").is_err());
    }

    #[test]
    fn test_transfer_checks() {
        let validator = InputValidator::default();
        let balance = hbar("20");

        let recipient = validator
            .validate_transfer("0.0.123456", hbar("10.5"), balance)
            .unwrap();
        assert_eq!(recipient.num, 123456);

        // Spending the full balance is allowed
        assert!(validator
            .validate_transfer("0.0.123456", balance, balance)
            .is_ok());

        assert!(matches!(
            validator.validate_transfer("0.0.123456", hbar("20.00000001"), balance),
            Err(WalletError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            validator.validate_transfer("bad", hbar("1"), balance),
            Err(WalletError::InvalidRecipientFormat(_))
        ));
        assert!(matches!(
            validator.validate_transfer("0.0.1", Hbar::ZERO, balance),
            Err(WalletError::InvalidAmount(_))
        ));
        assert!(matches!(
            validator.validate_transfer("0.0.1", hbar("-1"), balance),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_malicious_input_rejected() {
        let validator = InputValidator::default();
        assert!(matches!(
            validator.validate_account_id("<script>alert(1)</script>"),
            Err(WalletError::InvalidRecipientFormat(_))
        ));
        assert!(matches!(
            validator.validate_account_id("javascript:0.0.1"),
            Err(WalletError::InvalidRecipientFormat(_))
        ));
        assert!(validator.validate_memo("javascript:void(0)").is_err());
        assert!(validator.validate_memo("for the solar farm round").is_ok());
        assert!(validator.validate_memo(&"x".repeat(101)).is_err());
    }
}
