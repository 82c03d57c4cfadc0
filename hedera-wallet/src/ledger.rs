/// Core Hedera ledger types used by the wallet flow
///
/// Account identifiers, networks, HBAR amounts and transaction identifiers.
/// Amounts are kept as integer tinybars so that debit/credit pairs stay exact.
use crate::errors::{WalletError, WalletResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static ACCOUNT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("account id regex must compile"));

/// A Hedera account identifier
///
/// Accounts are addressed as `shard.realm.num`, e.g. `0.0.123456`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        AccountId { shard, realm, num }
    }

    /// Parse an account id from its `shard.realm.num` form
    pub fn from_string(account_id: &str) -> WalletResult<Self> {
        let captures = ACCOUNT_ID_PATTERN
            .captures(account_id)
            .ok_or_else(|| WalletError::InvalidRecipientFormat(account_id.to_string()))?;

        let part = |idx: usize| -> WalletResult<u64> {
            captures[idx]
                .parse::<u64>()
                .map_err(|_| WalletError::InvalidRecipientFormat(account_id.to_string()))
        };

        Ok(AccountId {
            shard: part(1)?,
            realm: part(2)?,
            num: part(3)?,
        })
    }

    /// Check the account id syntax without building the value
    pub fn is_valid(account_id: &str) -> bool {
        Self::from_string(account_id).is_ok()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountId::from_string(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountId::from_string(&value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_string()
    }
}

/// Hedera networks a wallet can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Resolve the network tag reported by a wallet extension.
    ///
    /// A missing tag means testnet. Unknown tags also select testnet, which is
    /// the only non-mainnet client the wallet can build.
    pub fn from_reported(reported: Option<&str>) -> Self {
        match reported.map(|s| s.trim().to_ascii_lowercase()) {
            None => Network::Testnet,
            Some(tag) => match tag.as_str() {
                "mainnet" => Network::Mainnet,
                "testnet" | "" => Network::Testnet,
                other => {
                    log::warn!("Unknown network '{}' reported by wallet, using testnet", other);
                    Network::Testnet
                }
            },
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(WalletError::ValidationError(format!(
                "Unknown network '{}'",
                other
            ))),
        }
    }
}

/// An amount of HBAR
///
/// Uses fixed-point arithmetic: the value is held in tinybars, the smallest
/// unit (1 HBAR = 100_000_000 tinybars). Signed, because transfer entries
/// debit the sender with a negative amount. JSON carries the value as a
/// decimal HBAR number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Hbar {
    tinybars: i64,
}

impl Hbar {
    /// Number of decimal places of HBAR
    pub const DECIMALS: u8 = 8;
    /// Tinybars per HBAR (10^8)
    pub const TINYBARS_PER_HBAR: i64 = 100_000_000;
    /// Total supply is fixed at 50 billion HBAR
    pub const MAX_HBAR: i64 = 50_000_000_000;

    pub const ZERO: Hbar = Hbar { tinybars: 0 };

    /// Create amount from tinybars
    pub const fn from_tinybars(tinybars: i64) -> Self {
        Hbar { tinybars }
    }

    /// Create amount from whole HBAR
    pub fn from_hbar(hbar: i64) -> WalletResult<Self> {
        if hbar.abs() > Self::MAX_HBAR {
            return Err(WalletError::InvalidAmount("Amount too large".to_string()));
        }
        Ok(Hbar {
            tinybars: hbar * Self::TINYBARS_PER_HBAR,
        })
    }

    /// Create amount from a floating point HBAR value, rounding once to the
    /// nearest tinybar.
    pub fn from_hbar_f64(hbar: f64) -> WalletResult<Self> {
        if !hbar.is_finite() {
            return Err(WalletError::InvalidAmount(
                "Amount must be a finite number".to_string(),
            ));
        }
        if hbar.abs() > Self::MAX_HBAR as f64 {
            return Err(WalletError::InvalidAmount("Amount too large".to_string()));
        }

        let tinybars = (hbar * Self::TINYBARS_PER_HBAR as f64).round() as i64;
        Ok(Hbar { tinybars })
    }

    /// Create amount from a decimal string (exact, up to 8 decimals)
    pub fn from_string(amount_str: &str) -> WalletResult<Self> {
        let trimmed = amount_str.trim();
        if trimmed.is_empty() {
            return Err(WalletError::InvalidAmount(
                "Amount cannot be empty".to_string(),
            ));
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let parts: Vec<&str> = digits.split('.').collect();
        if parts.len() > 2
            || (parts[0].is_empty() && parts.len() == 1)
            || !parts[0].chars().all(|c| c.is_ascii_digit())
        {
            return Err(WalletError::InvalidAmount(
                "Invalid decimal format".to_string(),
            ));
        }

        let whole_part: i64 = if parts[0].is_empty() {
            0
        } else {
            parts[0]
                .parse()
                .map_err(|_| WalletError::InvalidAmount("Invalid number format".to_string()))?
        };

        let fractional_units: i64 = if parts.len() == 2 {
            let fractional_str = parts[1];
            if fractional_str.is_empty() || !fractional_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(WalletError::InvalidAmount(
                    "Invalid fractional part".to_string(),
                ));
            }
            if fractional_str.len() > Self::DECIMALS as usize {
                return Err(WalletError::InvalidAmount(
                    "Too many decimal places".to_string(),
                ));
            }

            let padded = format!("{:0<8}", fractional_str);
            padded
                .parse::<i64>()
                .map_err(|_| WalletError::InvalidAmount("Invalid fractional part".to_string()))?
        } else {
            0
        };

        if whole_part > Self::MAX_HBAR {
            return Err(WalletError::InvalidAmount("Amount too large".to_string()));
        }

        let tinybars = whole_part
            .checked_mul(Self::TINYBARS_PER_HBAR)
            .and_then(|w| w.checked_add(fractional_units))
            .ok_or_else(|| WalletError::InvalidAmount("Amount overflow".to_string()))?;

        Ok(Hbar {
            tinybars: if negative { -tinybars } else { tinybars },
        })
    }

    pub fn tinybars(&self) -> i64 {
        self.tinybars
    }

    /// Get amount as HBAR (may lose precision)
    pub fn as_hbar(&self) -> f64 {
        self.tinybars as f64 / Self::TINYBARS_PER_HBAR as f64
    }

    /// Get amount as a decimal string with full precision
    pub fn as_string(&self) -> String {
        let sign = if self.tinybars < 0 { "-" } else { "" };
        let abs = self.tinybars.unsigned_abs();
        let per = Self::TINYBARS_PER_HBAR as u64;
        let whole = abs / per;
        let fractional = abs % per;

        if fractional == 0 {
            format!("{}{}", sign, whole)
        } else {
            let frac_str = format!("{:08}", fractional)
                .trim_end_matches('0')
                .to_string();
            format!("{}{}.{}", sign, whole, frac_str)
        }
    }

    pub fn is_zero(&self) -> bool {
        self.tinybars == 0
    }

    pub fn is_positive(&self) -> bool {
        self.tinybars > 0
    }

    pub fn is_negative(&self) -> bool {
        self.tinybars < 0
    }

    pub fn negated(&self) -> Hbar {
        Hbar {
            tinybars: -self.tinybars,
        }
    }

    pub fn checked_add(&self, other: &Hbar) -> WalletResult<Hbar> {
        self.tinybars
            .checked_add(other.tinybars)
            .map(Hbar::from_tinybars)
            .ok_or_else(|| WalletError::InvalidAmount("Amount overflow in addition".to_string()))
    }

    pub fn checked_sub(&self, other: &Hbar) -> WalletResult<Hbar> {
        self.tinybars
            .checked_sub(other.tinybars)
            .map(Hbar::from_tinybars)
            .ok_or_else(|| {
                WalletError::InvalidAmount("Amount overflow in subtraction".to_string())
            })
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ℏ", self.as_string())
    }
}

impl FromStr for Hbar {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hbar::from_string(s)
    }
}

impl TryFrom<f64> for Hbar {
    type Error = WalletError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Hbar::from_hbar_f64(value)
    }
}

impl From<Hbar> for f64 {
    fn from(value: Hbar) -> Self {
        value.as_hbar()
    }
}

/// Identifier the ledger assigns to a submitted transaction
///
/// Canonical form is `<payer>@<seconds>.<nanos>`; the mirror node REST API
/// reports `<payer>-<seconds>-<nanos>`, which is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start_seconds: u64,
    pub valid_start_nanos: u32,
}

impl TransactionId {
    pub fn new(payer: AccountId, valid_start_seconds: u64, valid_start_nanos: u32) -> Self {
        TransactionId {
            payer,
            valid_start_seconds,
            valid_start_nanos,
        }
    }

    pub fn from_string(tx_id: &str) -> WalletResult<Self> {
        let invalid = || WalletError::InvalidResponse(format!("Invalid transaction id '{}'", tx_id));

        let (payer, seconds, nanos) = if let Some((payer, start)) = tx_id.split_once('@') {
            let (seconds, nanos) = start.split_once('.').ok_or_else(invalid)?;
            (payer, seconds, nanos)
        } else {
            let mut parts = tx_id.rsplitn(3, '-');
            let nanos = parts.next().ok_or_else(invalid)?;
            let seconds = parts.next().ok_or_else(invalid)?;
            let payer = parts.next().ok_or_else(invalid)?;
            (payer, seconds, nanos)
        };

        let payer = AccountId::from_string(payer).map_err(|_| invalid())?;
        let valid_start_seconds = seconds.parse::<u64>().map_err(|_| invalid())?;
        let valid_start_nanos = nanos.parse::<u32>().map_err(|_| invalid())?;
        if valid_start_nanos >= 1_000_000_000 {
            return Err(invalid());
        }

        Ok(TransactionId::new(
            payer,
            valid_start_seconds,
            valid_start_nanos,
        ))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.payer, self.valid_start_seconds, self.valid_start_nanos
        )
    }
}

impl FromStr for TransactionId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionId::from_string(s)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TransactionId::from_string(&value)
    }
}

impl From<TransactionId> for String {
    fn from(value: TransactionId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_parsing() {
        let id = AccountId::from_string("0.0.123456").unwrap();
        assert_eq!(id, AccountId::new(0, 0, 123456));
        assert_eq!(id.to_string(), "0.0.123456");

        for bad in ["", "0.0", "0.0.1.2", "a.b.c", "0.0.-1", " 0.0.1", "0..1", "0.0.1 "] {
            assert!(
                matches!(
                    AccountId::from_string(bad),
                    Err(WalletError::InvalidRecipientFormat(_))
                ),
                "expected rejection of {:?}",
                bad
            );
        }
    }

    #[test]
    fn account_id_serde_uses_string_form() {
        let id = AccountId::new(0, 0, 42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0.0.42\"");
        let back: AccountId = serde_json::from_str("\"0.0.42\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<AccountId>("\"nope\"").is_err());
    }

    #[test]
    fn network_resolution() {
        assert_eq!(Network::from_reported(None), Network::Testnet);
        assert_eq!(Network::from_reported(Some("mainnet")), Network::Mainnet);
        assert_eq!(Network::from_reported(Some("MAINNET")), Network::Mainnet);
        assert_eq!(Network::from_reported(Some("previewnet")), Network::Testnet);
        assert_eq!(serde_json::to_string(&Network::Testnet).unwrap(), "\"testnet\"");
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn hbar_from_f64_scales_to_tinybars() {
        assert_eq!(Hbar::from_hbar_f64(10.5).unwrap().tinybars(), 1_050_000_000);
        assert_eq!(Hbar::from_hbar_f64(0.1).unwrap().tinybars(), 10_000_000);
        assert_eq!(Hbar::from_hbar_f64(0.000000016).unwrap().tinybars(), 2);
        assert!(Hbar::from_hbar_f64(f64::NAN).is_err());
        assert!(Hbar::from_hbar_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn hbar_string_parsing_is_exact() {
        assert_eq!(Hbar::from_string("10.5").unwrap().tinybars(), 1_050_000_000);
        assert_eq!(Hbar::from_string("0.00000001").unwrap().tinybars(), 1);
        assert_eq!(Hbar::from_string("-2").unwrap().tinybars(), -200_000_000);
        assert_eq!(Hbar::from_string(".5").unwrap().tinybars(), 50_000_000);
        assert!(Hbar::from_string("0.000000001").is_err());
        assert!(Hbar::from_string("1.2.3").is_err());
        assert!(Hbar::from_string("abc").is_err());
        assert!(Hbar::from_string("--1").is_err());
        assert!(Hbar::from_string("1.").is_err());
        assert!(Hbar::from_string("").is_err());
    }

    #[test]
    fn hbar_display() {
        assert_eq!(Hbar::from_tinybars(1_050_000_000).as_string(), "10.5");
        assert_eq!(Hbar::from_tinybars(-1).as_string(), "-0.00000001");
        assert_eq!(Hbar::from_hbar(20).unwrap().as_string(), "20");
    }

    #[test]
    fn hbar_json_is_decimal_hbar() {
        let amount = Hbar::from_tinybars(1_050_000_000);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "10.5");
        let back: Hbar = serde_json::from_str("20").unwrap();
        assert_eq!(back, Hbar::from_hbar(20).unwrap());
    }

    #[test]
    fn hbar_arithmetic() {
        let a = Hbar::from_hbar(5).unwrap();
        let b = Hbar::from_hbar(3).unwrap();
        assert_eq!(a.checked_sub(&b).unwrap(), Hbar::from_hbar(2).unwrap());
        assert_eq!(a.checked_add(&b.negated()).unwrap(), Hbar::from_hbar(2).unwrap());
        assert!(Hbar::from_tinybars(i64::MAX).checked_add(&a).is_err());
    }

    #[test]
    fn transaction_id_forms() {
        let id = TransactionId::from_string("0.0.123@1234567890.123456789").unwrap();
        assert_eq!(id.payer, AccountId::new(0, 0, 123));
        assert_eq!(id.valid_start_seconds, 1_234_567_890);
        assert_eq!(id.valid_start_nanos, 123_456_789);

        let mirror = TransactionId::from_string("0.0.123-1234567890-123456789").unwrap();
        assert_eq!(mirror, id);
        assert_eq!(mirror.to_string(), "0.0.123@1234567890.123456789");

        let padded = TransactionId::new(AccountId::new(0, 0, 7), 10, 5);
        assert_eq!(padded.to_string(), "0.0.7@10.000000005");

        assert!(TransactionId::from_string("garbage").is_err());
        assert!(TransactionId::from_string("0.0.1@10").is_err());
    }
}
