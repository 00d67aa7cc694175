//! TokenRegistry: the de-duplicated token list shown in the wallet view.
//!
//! The built-in set is fixed; user-added tokens are appended after it and are
//! the only entries written to the local store. Every change to the custom
//! subset rewrites the whole stored list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use nexus_core::{DEFAULT_CUSTOM_TOKENS_KEY, KeyValueStore, NexusConfig};

use crate::error::WalletError;
use crate::tokens::{TokenCandidate, TrackedToken, builtin_tokens};

/// A chain that at least one tracked token lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub chain_id: u64,
    pub chain_name: String,
}

pub struct TokenRegistry {
    tokens: Vec<TrackedToken>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
}

impl std::fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("tokens", &self.tokens.len())
            .field("storage_key", &self.storage_key)
            .finish()
    }
}

impl TokenRegistry {
    /// Load the built-in set and merge in the persisted custom tokens.
    ///
    /// A corrupt stored list is logged and treated as empty.
    pub fn initialize(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_CUSTOM_TOKENS_KEY)
    }

    /// [`initialize`](Self::initialize) using the store key from config.
    pub fn from_config(config: &NexusConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, config.custom_tokens_key.clone())
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        let mut registry = Self {
            tokens: builtin_tokens(),
            store,
            storage_key: storage_key.into(),
        };

        let saved = match registry.load_custom() {
            Ok(saved) => saved,
            Err(e) => {
                warn!("{e}; starting without custom tokens");
                Vec::new()
            }
        };
        for mut token in saved {
            if registry.contains(&token.address, token.chain_id) {
                warn!(
                    address = %token.address,
                    chain_id = token.chain_id,
                    "Dropping duplicate saved token"
                );
                continue;
            }
            token.is_custom = true;
            registry.tokens.push(token);
        }

        info!(
            total = registry.tokens.len(),
            custom = registry.custom_tokens().len(),
            "token registry initialized"
        );
        registry
    }

    /// Read the persisted custom list straight from the store.
    pub fn load_custom(&self) -> Result<Vec<TrackedToken>, WalletError> {
        let raw = self
            .store
            .get(&self.storage_key)
            .map_err(|e| WalletError::Storage(e.to_string()))?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| WalletError::PersistenceParse(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self) {
        let custom: Vec<&TrackedToken> = self.tokens.iter().filter(|t| t.is_custom).collect();
        let result = serde_json::to_string(&custom)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(&self.storage_key, &json));
        if let Err(e) = result {
            warn!("Failed to save custom tokens: {e}");
        }
    }

    /// All tracked tokens: built-ins first, then custom tokens in the order
    /// they were added.
    pub fn tokens(&self) -> &[TrackedToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `(address, chain_id)` is already tracked.
    pub fn contains(&self, address: &str, chain_id: u64) -> bool {
        self.tokens.iter().any(|t| t.matches(address, chain_id))
    }

    /// Validate `candidate` and append it as a custom token.
    pub fn add_token(&mut self, candidate: TokenCandidate) -> Result<TrackedToken, WalletError> {
        candidate.validate()?;
        let address = candidate.address.trim();
        if self.contains(address, candidate.chain_id) {
            return Err(WalletError::DuplicateToken {
                address: address.to_lowercase(),
                chain_id: candidate.chain_id,
            });
        }

        let token = candidate.into_custom_token();
        info!(
            symbol = %token.symbol,
            address = %token.address,
            chain_id = token.chain_id,
            "custom token added"
        );
        self.tokens.push(token.clone());
        self.persist();
        Ok(token)
    }

    /// Remove every custom token with `address`, on any chain. Built-in
    /// entries are never removed. Returns how many entries went away.
    pub fn remove_token(&mut self, address: &str) -> usize {
        self.remove_where(|t| t.has_address(address))
    }

    /// Remove the custom token `(address, chain_id)` only.
    pub fn remove_token_on_chain(&mut self, address: &str, chain_id: u64) -> bool {
        self.remove_where(|t| t.matches(address, chain_id)) > 0
    }

    fn remove_where(&mut self, pred: impl Fn(&TrackedToken) -> bool) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|t| !(t.is_custom && pred(t)));
        let removed = before - self.tokens.len();
        if removed > 0 {
            info!(removed, "custom token removed");
            self.persist();
        }
        removed
    }

    /// Update the display balance (and optionally value) of every entry with
    /// `address`. An empty `value` keeps the current one. Identity and
    /// classification are untouched.
    pub fn update_balance(&mut self, address: &str, balance: &str, value: Option<&str>) -> usize {
        let value = value.filter(|v| !v.trim().is_empty());
        let mut updated = 0;
        let mut touched_custom = false;
        for token in self.tokens.iter_mut().filter(|t| t.has_address(address)) {
            token.balance = balance.to_string();
            if let Some(value) = value {
                token.display_value = value.to_string();
            }
            touched_custom |= token.is_custom;
            updated += 1;
        }
        if touched_custom {
            self.persist();
        }
        updated
    }

    /// First entry with `address`, on any chain.
    pub fn token_by_address(&self, address: &str) -> Option<&TrackedToken> {
        self.tokens.iter().find(|t| t.has_address(address))
    }

    pub fn custom_tokens(&self) -> Vec<&TrackedToken> {
        self.tokens.iter().filter(|t| t.is_custom).collect()
    }

    pub fn default_tokens(&self) -> Vec<&TrackedToken> {
        self.tokens.iter().filter(|t| !t.is_custom).collect()
    }

    pub fn tokens_by_chain(&self, chain_id: u64) -> Vec<&TrackedToken> {
        self.tokens.iter().filter(|t| t.chain_id == chain_id).collect()
    }

    /// Distinct chains in first-seen order, named after the first token on
    /// each.
    pub fn supported_chains(&self) -> Vec<ChainSummary> {
        let mut chains: Vec<ChainSummary> = Vec::new();
        for token in &self.tokens {
            if !chains.iter().any(|c| c.chain_id == token.chain_id) {
                chains.push(ChainSummary {
                    chain_id: token.chain_id,
                    chain_name: token.chain_name.clone(),
                });
            }
        }
        chains
    }

    /// Sum of the dollar display values of all tracked tokens.
    pub fn total_value(&self) -> f64 {
        self.tokens.iter().map(TrackedToken::value_usd).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
