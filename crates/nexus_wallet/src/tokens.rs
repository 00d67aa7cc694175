//! Token records plus the built-in and popular token sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chains::{UNKNOWN_CHAIN_NAME, chain_name, is_valid_address};
use crate::error::WalletError;

/// Highest decimals value accepted for a custom token.
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// A token shown in the wallet view.
///
/// Identity is `(address, chain_id)` with the address compared
/// case-insensitively. `balance`, `display_value` and `change_percent` are
/// display-only figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedToken {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
    pub chain_id: u64,
    pub chain_name: String,
    pub balance: String,
    #[serde(rename = "value")]
    pub display_value: String,
    #[serde(rename = "change")]
    pub change_percent: String,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl TrackedToken {
    /// Whether this entry has identity `(address, chain_id)`.
    pub fn matches(&self, address: &str, chain_id: u64) -> bool {
        self.chain_id == chain_id && self.has_address(address)
    }

    pub fn has_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }

    /// Dollar figure of `display_value` (`"$1,234.56"` -> `1234.56`).
    /// Unparseable values count as zero.
    pub fn value_usd(&self) -> f64 {
        let cleaned: String = self
            .display_value
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | ' '))
            .collect();
        cleaned.parse().unwrap_or(0.0)
    }
}

/// User input for adding a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCandidate {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
    pub chain_id: u64,
    /// Resolved from the chain catalog when empty.
    #[serde(default)]
    pub chain_name: String,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl TokenCandidate {
    pub fn new(symbol: &str, name: &str, address: &str, decimals: u8, chain_id: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            decimals,
            chain_id,
            chain_name: String::new(),
            logo_uri: None,
        }
    }

    /// Check required fields and the address format.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.address.trim().is_empty()
            || self.symbol.trim().is_empty()
            || self.name.trim().is_empty()
            || self.chain_id == 0
        {
            return Err(WalletError::InvalidInput(
                "Please fill in all required fields".into(),
            ));
        }
        if !is_valid_address(self.address.trim()) {
            return Err(WalletError::InvalidInput(
                "Invalid Ethereum address format".into(),
            ));
        }
        if self.decimals > MAX_TOKEN_DECIMALS {
            return Err(WalletError::InvalidInput(format!(
                "Decimals must be at most {MAX_TOKEN_DECIMALS}"
            )));
        }
        Ok(())
    }

    /// Build the custom entry with zeroed display figures.
    pub(crate) fn into_custom_token(self) -> TrackedToken {
        let chain_name = match self.chain_name.trim() {
            "" | UNKNOWN_CHAIN_NAME => chain_name(self.chain_id),
            named => named.to_string(),
        };
        TrackedToken {
            symbol: self.symbol.trim().to_uppercase(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            decimals: self.decimals,
            chain_id: self.chain_id,
            chain_name,
            balance: "0".into(),
            display_value: "$0.00".into(),
            change_percent: "+0.0%".into(),
            is_custom: true,
            logo_uri: self.logo_uri,
            added_at: Some(Utc::now()),
        }
    }
}

fn builtin(
    symbol: &str,
    name: &str,
    address: &str,
    decimals: u8,
    chain_id: u64,
    chain_name: &str,
    balance: &str,
    value: &str,
    change: &str,
) -> TrackedToken {
    TrackedToken {
        symbol: symbol.into(),
        name: name.into(),
        address: address.into(),
        decimals,
        chain_id,
        chain_name: chain_name.into(),
        balance: balance.into(),
        display_value: value.into(),
        change_percent: change.into(),
        is_custom: false,
        logo_uri: None,
        added_at: None,
    }
}

/// The fixed built-in set. Figures are illustrative display data.
pub fn builtin_tokens() -> Vec<TrackedToken> {
    vec![
        builtin(
            "BTC",
            "Bitcoin",
            "0x0000000000000000000000000000000000000001",
            8,
            1,
            "Ethereum",
            "110.0234",
            "$106,245.67",
            "+2.4%",
        ),
        builtin(
            "ETH",
            "Ethereum",
            "0x0000000000000000000000000000000000000000",
            18,
            1,
            "Ethereum",
            "222.456",
            "$5,432.10",
            "+1.8%",
        ),
        builtin(
            "SOL",
            "Solana",
            "0x0000000000000000000000000000000000000002",
            9,
            1,
            "Ethereum",
            "45.67",
            "$2,876.43",
            "-0.5%",
        ),
        builtin(
            "BSC",
            "Binance Smart Chain",
            "0x0000000000000000000000000000000000000003",
            18,
            56,
            "Binance Smart Chain",
            "123.45",
            "$987.65",
            "+3.2%",
        ),
        builtin(
            "EGLD",
            "Elrond",
            "0x0000000000000000000000000000000000000004",
            18,
            1,
            "Ethereum",
            "8.92",
            "$654.32",
            "+1.1%",
        ),
        builtin(
            "NXG",
            "NEXUS Gaming Token",
            "0x0000000000000000000000000000000000000005",
            18,
            1,
            "Ethereum",
            "1,234.56",
            "$2,469.12",
            "+5.7%",
        ),
    ]
}

/// Well-known ERC-20 tokens offered for one-click adding.
pub fn popular_tokens() -> Vec<TokenCandidate> {
    [
        ("USDC", "USD Coin", "0xA0b86a33E6441b8435b662303c0f218C8863c0c8", 6),
        ("USDT", "Tether USD", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
        ("DAI", "Dai Stablecoin", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
        ("LINK", "Chainlink", "0x514910771AF9Ca656af840dff83E8264EcF986CA", 18),
        ("UNI", "Uniswap", "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984", 18),
        ("AAVE", "Aave Token", "0x7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9", 18),
        ("MATIC", "Polygon", "0x7D1AfA7B718fb893dB30A3aBc0Cfc608AaCfeBB0", 18),
        ("CRV", "Curve DAO Token", "0xD533a949740bb3306d119CC777fa900bA034cd52", 18),
    ]
    .into_iter()
    .map(|(symbol, name, address, decimals)| {
        let mut candidate = TokenCandidate::new(symbol, name, address, decimals, 1);
        candidate.chain_name = "Ethereum".into();
        candidate
    })
    .collect()
}

/// Popular tokens whose name or symbol contains `query`, ignoring case.
pub fn search_popular(query: &str) -> Vec<TokenCandidate> {
    let query = query.trim().to_lowercase();
    popular_tokens()
        .into_iter()
        .filter(|t| {
            query.is_empty()
                || t.name.to_lowercase().contains(&query)
                || t.symbol.to_lowercase().contains(&query)
        })
        .collect()
}
