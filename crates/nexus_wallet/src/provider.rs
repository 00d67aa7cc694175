//! Injected provider capability and its typed adapter.
//!
//! [`InjectedProvider`] is the loosely-typed request/event surface a browser
//! wallet exposes (EIP-1193 style). [`ProviderClient`] sits on top of it and
//! is the only place raw JSON and hex quantities are handled; everything it
//! hands back is already a domain value.

use std::sync::Arc;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::error::{ProviderError, WalletError};
use crate::units::{parse_chain_id, parse_quantity, to_quantity};

/// JSON-RPC method names used by the wallet.
pub mod methods {
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const GET_BALANCE: &str = "eth_getBalance";
    pub const GAS_PRICE: &str = "eth_gasPrice";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
}

/// Gas limit of a plain native-currency transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Event as emitted by the provider, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    /// Chain id exactly as the provider sent it (usually hex).
    ChainChanged(String),
    Disconnect,
}

/// Request/response plus event-subscription surface of an injected wallet.
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    /// Perform a JSON-RPC style request.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError>;

    /// Subscribe to provider-emitted events. Dropping the receiver
    /// unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

// ---------------------------------------------------------------------------
// Typed values
// ---------------------------------------------------------------------------

/// Validated provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// New account list, lower-cased. Empty means access was revoked.
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    Disconnected,
}

impl TryFrom<ProviderEvent> for WalletEvent {
    type Error = WalletError;

    fn try_from(raw: ProviderEvent) -> Result<Self, Self::Error> {
        Ok(match raw {
            ProviderEvent::AccountsChanged(accounts) => {
                Self::AccountsChanged(accounts.iter().map(|a| a.to_lowercase()).collect())
            }
            ProviderEvent::ChainChanged(id) => Self::ChainChanged(parse_chain_id(&id)?),
            ProviderEvent::Disconnect => Self::Disconnected,
        })
    }
}

/// A native-currency transfer ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub value: U256,
    pub gas: u64,
    pub gas_price: U256,
    pub data: Vec<u8>,
}

impl TransferRequest {
    fn to_params(&self) -> Value {
        json!({
            "to": self.to.to_lowercase(),
            "from": self.from.to_lowercase(),
            "value": to_quantity(self.value),
            "gas": to_quantity(U256::from(self.gas)),
            "gasPrice": to_quantity(self.gas_price),
            "data": format!("0x{}", hex::encode(&self.data)),
        })
    }
}

// ---------------------------------------------------------------------------
// ProviderClient
// ---------------------------------------------------------------------------

/// Typed adapter over an [`InjectedProvider`].
#[derive(Clone)]
pub struct ProviderClient {
    inner: Arc<dyn InjectedProvider>,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient").finish_non_exhaustive()
    }
}

impl ProviderClient {
    pub fn new(inner: Arc<dyn InjectedProvider>) -> Self {
        Self { inner }
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        debug!(method, "provider request");
        self.inner.request(method, params).await
    }

    /// Accounts already authorised for this origin. Never prompts.
    pub async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        let value = self
            .call(methods::ACCOUNTS, vec![])
            .await
            .map_err(WalletError::from_provider)?;
        parse_accounts(value)
    }

    /// Ask the user to grant account access.
    pub async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        let value = self
            .call(methods::REQUEST_ACCOUNTS, vec![])
            .await
            .map_err(WalletError::from_provider)?;
        parse_accounts(value)
    }

    pub async fn chain_id(&self) -> Result<u64, WalletError> {
        let value = self
            .call(methods::CHAIN_ID, vec![])
            .await
            .map_err(WalletError::from_provider)?;
        match value {
            Value::String(s) => parse_chain_id(&s),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| WalletError::MalformedResponse(format!("bad chain id {n}"))),
            other => Err(WalletError::MalformedResponse(format!(
                "expected chain id, got {other}"
            ))),
        }
    }

    /// Native balance of `address` at the latest block, in base units.
    pub async fn balance(&self, address: &str) -> Result<U256, WalletError> {
        let value = self
            .call(methods::GET_BALANCE, vec![json!(address), json!("latest")])
            .await
            .map_err(WalletError::from_provider)?;
        parse_quantity(expect_str(&value, "balance")?)
    }

    /// Current gas price. Only queried on the submission path, so failures
    /// map to [`WalletError::TransactionFailed`].
    pub async fn gas_price(&self) -> Result<U256, WalletError> {
        let value = self
            .call(methods::GAS_PRICE, vec![])
            .await
            .map_err(WalletError::from_submission)?;
        parse_quantity(expect_str(&value, "gas price")?)
    }

    /// Hand a transfer to the provider for broadcast. Returns the
    /// provider-assigned hash; does not wait for inclusion.
    pub async fn send_transaction(&self, tx: &TransferRequest) -> Result<String, WalletError> {
        let value = self
            .call(methods::SEND_TRANSACTION, vec![tx.to_params()])
            .await
            .map_err(WalletError::from_submission)?;
        let hash = expect_str(&value, "transaction hash")?;
        if !hash.starts_with("0x") || hash.len() < 3 {
            return Err(WalletError::MalformedResponse(format!(
                "bad transaction hash {hash:?}"
            )));
        }
        Ok(hash.to_string())
    }

    /// Subscribe to validated provider events.
    pub fn events(&self) -> WalletEvents {
        WalletEvents {
            rx: self.inner.subscribe(),
        }
    }
}

fn expect_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, WalletError> {
    value
        .as_str()
        .ok_or_else(|| WalletError::MalformedResponse(format!("expected {what} string, got {value}")))
}

fn parse_accounts(value: Value) -> Result<Vec<String>, WalletError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(WalletError::MalformedResponse(format!(
                "expected account list, got {other}"
            )));
        }
    };
    items
        .iter()
        .map(|item| expect_str(item, "account").map(str::to_lowercase))
        .collect()
}

// ---------------------------------------------------------------------------
// Event stream
// ---------------------------------------------------------------------------

/// Stream of validated events for one subscriber.
pub struct WalletEvents {
    rx: broadcast::Receiver<ProviderEvent>,
}

impl WalletEvents {
    /// Next valid event, or `None` once the provider stops emitting.
    /// Malformed events and lag are logged and skipped.
    pub async fn next(&mut self) -> Option<WalletEvent> {
        loop {
            match self.rx.recv().await {
                Ok(raw) => match WalletEvent::try_from(raw) {
                    Ok(event) => return Some(event),
                    Err(e) => warn!("Ignoring malformed provider event: {e}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Provider event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
