//! EVM chain catalog and explorer/address helpers.

use serde::{Deserialize, Serialize};

use nexus_core::NexusConfig;

/// Chain name reported for ids missing from the catalog.
pub const UNKNOWN_CHAIN_NAME: &str = "Unknown";

const ETHEREUM_EXPLORER: &str = "https://etherscan.io";

/// Network-specific configuration for an EVM chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub native_symbol: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainInfo {
    fn new(chain_id: u64, name: &str, native_symbol: &str, rpc_url: &str, explorer_url: &str) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            native_symbol: native_symbol.to_string(),
            rpc_url: rpc_url.to_string(),
            explorer_url: explorer_url.to_string(),
        }
    }
}

/// Networks on which custom tokens can be tracked.
pub fn supported_chains() -> Vec<ChainInfo> {
    vec![
        ChainInfo::new(1, "Ethereum", "ETH", "https://mainnet.infura.io", ETHEREUM_EXPLORER),
        ChainInfo::new(
            56,
            "Binance Smart Chain",
            "BNB",
            "https://bsc-dataseed.binance.org",
            "https://bscscan.com",
        ),
        ChainInfo::new(137, "Polygon", "MATIC", "https://polygon-rpc.com", "https://polygonscan.com"),
        ChainInfo::new(
            43114,
            "Avalanche",
            "AVAX",
            "https://api.avax.network/ext/bc/C/rpc",
            "https://snowtrace.io",
        ),
        ChainInfo::new(250, "Fantom", "FTM", "https://rpc.ftm.tools", "https://ftmscan.com"),
        ChainInfo::new(42161, "Arbitrum", "ETH", "https://arb1.arbitrum.io/rpc", "https://arbiscan.io"),
        ChainInfo::new(
            10,
            "Optimism",
            "ETH",
            "https://mainnet.optimism.io",
            "https://optimistic.etherscan.io",
        ),
        ChainInfo::new(100, "Gnosis Chain", "xDAI", "https://rpc.gnosischain.com", "https://gnosisscan.io"),
    ]
}

/// Look up a chain by numeric id.
pub fn chain_info(chain_id: u64) -> Option<ChainInfo> {
    supported_chains().into_iter().find(|c| c.chain_id == chain_id)
}

/// Display name for a chain id, `"Unknown"` when not in the catalog.
pub fn chain_name(chain_id: u64) -> String {
    chain_info(chain_id)
        .map(|c| c.name)
        .unwrap_or_else(|| UNKNOWN_CHAIN_NAME.to_string())
}

// ---------------------------------------------------------------------------
// Explorer links
// ---------------------------------------------------------------------------

/// Builds block-explorer URLs. Purely informational: neither the base nor
/// the appended hash/address is validated.
#[derive(Debug, Clone, Default)]
pub struct ExplorerLinks {
    override_base: Option<String>,
}

impl ExplorerLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the explorer override from config, if any.
    pub fn from_config(config: &NexusConfig) -> Self {
        Self {
            override_base: config.explorer_url.clone(),
        }
    }

    fn base(&self, chain_id: Option<u64>) -> String {
        let base = match (&self.override_base, chain_id.and_then(chain_info)) {
            (Some(url), _) => url.clone(),
            (None, Some(chain)) => chain.explorer_url,
            (None, None) => ETHEREUM_EXPLORER.to_string(),
        };
        base.trim_end_matches('/').to_string()
    }

    /// `<explorer>/tx/<hash>`
    pub fn transaction_url(&self, chain_id: Option<u64>, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.base(chain_id))
    }

    /// `<explorer>/address/<address>`
    pub fn address_url(&self, chain_id: Option<u64>, address: &str) -> String {
        format!("{}/address/{address}", self.base(chain_id))
    }
}

/// `0x` followed by exactly 40 hex digits. Checksum casing is not enforced.
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
        None => false,
    }
}

/// `0x1234...abcd` form used wherever an address is shown inline.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
