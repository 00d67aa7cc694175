//! Wallet connectivity and token tracking.
//!
//! - [`WalletSession`] bridges the UI and a browser-injected wallet provider:
//!   connect, disconnect, balance refresh, native transfers, and reacting to
//!   account/chain/disconnect events.
//! - [`TokenRegistry`] keeps the de-duplicated list of tracked tokens and
//!   persists the user-added ones to the local key/value store.

pub mod chains;
pub mod error;
pub mod provider;
pub mod registry;
pub mod session;
pub mod tokens;
pub mod units;

#[cfg(test)]
mod testing;

// Re-export primary types for convenient access.
pub use chains::{
    ChainInfo, ExplorerLinks, chain_info, chain_name, is_valid_address, shorten_address,
    supported_chains,
};
pub use error::{ProviderError, WalletError};
pub use provider::{InjectedProvider, ProviderClient, ProviderEvent, TransferRequest, WalletEvent};
pub use registry::{ChainSummary, TokenRegistry};
pub use session::{WalletSession, WalletState};
pub use tokens::{TokenCandidate, TrackedToken, builtin_tokens, popular_tokens, search_popular};
