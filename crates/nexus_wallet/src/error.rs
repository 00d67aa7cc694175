//! Wallet error types.

/// EIP-1193 code a provider returns when the user dismisses a prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors raised by an injected provider implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a JSON-RPC style error object.
    #[error("{message}")]
    Rpc { code: i64, message: String },

    /// The provider capability went away between detection and use.
    #[error("Provider unavailable")]
    Unavailable,

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }
}

/// Errors surfaced by [`WalletSession`](crate::WalletSession) and
/// [`TokenRegistry`](crate::TokenRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No injected provider is present.
    #[error("No wallet provider detected. Install a browser wallet to continue.")]
    ProviderUnavailable,

    /// The user declined the account-access prompt.
    #[error("{0}")]
    UserRejected(String),

    /// The provider granted access but returned an empty account list.
    #[error("No accounts found. Please connect your wallet.")]
    NoAccounts,

    #[error("Wallet not connected")]
    NotConnected,

    /// Malformed recipient, non-positive amount, bad token candidate.
    #[error("{0}")]
    InvalidInput(String),

    /// Client-side check against the last known balance.
    #[error("Insufficient balance. You have {available}.")]
    InsufficientBalance { requested: String, available: String },

    #[error("Token already exists in your wallet on this blockchain ({address} on chain {chain_id})")]
    DuplicateToken { address: String, chain_id: u64 },

    /// Submission failed at the provider; message passed through verbatim.
    #[error("{0}")]
    TransactionFailed(String),

    /// A non-submission provider call failed; message passed through verbatim.
    #[error("{0}")]
    Provider(String),

    /// The provider answered with a value that does not parse.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The persisted custom token list could not be decoded.
    #[error("Failed to parse saved tokens: {0}")]
    PersistenceParse(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WalletError {
    /// Text for an inline alert next to the triggering control.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderUnavailable
            | Self::NoAccounts
            | Self::NotConnected
            | Self::InsufficientBalance { .. } => self.to_string(),
            Self::UserRejected(msg)
            | Self::InvalidInput(msg)
            | Self::TransactionFailed(msg)
            | Self::Provider(msg)
                if !msg.is_empty() =>
            {
                msg.clone()
            }
            Self::UserRejected(_) => "Request rejected in wallet.".into(),
            Self::InvalidInput(_) => "Invalid input.".into(),
            Self::TransactionFailed(_) => "Transaction failed. Please try again.".into(),
            Self::Provider(_) => "Failed to connect wallet".into(),
            Self::DuplicateToken { .. } => {
                "Token already exists in your wallet on this blockchain".into()
            }
            Self::MalformedResponse(_) => "The wallet returned an unexpected response.".into(),
            Self::PersistenceParse(_) | Self::Storage(_) => {
                "Saved tokens could not be accessed.".into()
            }
        }
    }

    /// Map a provider failure raised while connecting or refreshing.
    pub(crate) fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable => Self::ProviderUnavailable,
            e if e.is_user_rejection() => Self::UserRejected(e.to_string()),
            e => Self::Provider(e.to_string()),
        }
    }

    /// Map a provider failure raised while sending a transaction.
    pub(crate) fn from_submission(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable => Self::ProviderUnavailable,
            e if e.is_user_rejection() => Self::UserRejected(e.to_string()),
            e => Self::TransactionFailed(e.to_string()),
        }
    }
}
