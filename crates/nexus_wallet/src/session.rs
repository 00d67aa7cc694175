//! WalletSession: connection state for a single injected wallet provider.
//!
//! One session per application instance. The session subscribes to the
//! provider's events when it is created and reacts to account, chain, and
//! disconnect notifications until it is closed or dropped.

use std::sync::Arc;

use alloy_primitives::U256;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::chains::{chain_info, is_valid_address};
use crate::error::WalletError;
use crate::provider::{
    InjectedProvider, ProviderClient, TRANSFER_GAS_LIMIT, TransferRequest, WalletEvent,
    WalletEvents,
};
use crate::units::{format_native, parse_native};

/// Longest memo accepted on a transfer, in characters.
pub const MAX_MEMO_CHARS: usize = 100;

/// Snapshot of the session record.
///
/// `is_connected` is true iff `address` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub is_connected: bool,
    /// Lower-cased account address.
    pub address: Option<String>,
    /// Native balance in display units, six decimals.
    pub balance: Option<String>,
    /// Native balance in base units, used for the client-side balance check.
    pub balance_wei: Option<U256>,
    pub chain_id: Option<u64>,
    /// A connect round-trip is in flight.
    pub is_loading: bool,
    pub error: Option<String>,
}

struct SessionInner {
    client: Option<ProviderClient>,
    state: watch::Sender<WalletState>,
}

/// Bridge between the UI and one injected wallet provider.
pub struct WalletSession {
    inner: Arc<SessionInner>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    listener: Option<JoinHandle<()>>,
}

impl WalletSession {
    /// Create a session over `provider`, or a provider-less session when the
    /// capability is absent.
    ///
    /// The event subscription is installed immediately. The listener task is
    /// spawned on the current Tokio runtime; outside a runtime the session
    /// still works but does not react to provider events.
    pub fn new(provider: Option<Arc<dyn InjectedProvider>>) -> Self {
        let client = provider.map(ProviderClient::new);
        let (state, _) = watch::channel(WalletState::default());
        let inner = Arc::new(SessionInner { client, state });

        let mut session = Self {
            inner,
            shutdown_tx: None,
            listener: None,
        };

        if let Some(client) = &session.inner.client {
            let events = client.events();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
                    let inner = Arc::clone(&session.inner);
                    session.listener = Some(handle.spawn(listen(inner, events, shutdown_rx)));
                    session.shutdown_tx = Some(shutdown_tx);
                }
                Err(_) => {
                    warn!("No Tokio runtime; wallet session will not react to provider events");
                }
            }
        }

        session
    }

    /// Whether an injected provider is present. No side effects.
    pub fn is_provider_available(&self) -> bool {
        self.inner.client.is_some()
    }

    /// Current snapshot of the session record.
    pub fn state(&self) -> WalletState {
        self.inner.state.borrow().clone()
    }

    /// Observe every change to the session record.
    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.inner.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.borrow().is_connected
    }

    pub fn address(&self) -> Option<String> {
        self.inner.state.borrow().address.clone()
    }

    /// Request account access and populate the session.
    ///
    /// Fails softly: returns `false` and records `error` when the provider is
    /// absent, the user declines, no account is returned, or any query fails.
    pub async fn connect(&self) -> bool {
        self.inner.connect().await
    }

    /// Like [`connect`](Self::connect) but returns the failure reason.
    pub async fn try_connect(&self) -> Result<(), WalletError> {
        self.inner.try_connect().await
    }

    /// Reset to the empty state. Local only; the provider is not told.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Re-query the balance. No-op when not connected.
    pub async fn refresh(&self) -> Result<(), WalletError> {
        self.inner.refresh().await
    }

    /// Reconnect silently if the provider already has an authorised account.
    pub async fn restore(&self) -> bool {
        self.inner.restore().await
    }

    /// Submit a native-currency transfer and return the transaction hash.
    ///
    /// "Sent" means the provider accepted it for broadcast; confirmation is
    /// not awaited.
    pub async fn send_transaction(
        &self,
        to: &str,
        amount: &str,
        memo: Option<&str>,
    ) -> Result<String, WalletError> {
        self.inner.send_transaction(to, amount, memo).await
    }

    /// Apply a provider event. The listener calls this for every event;
    /// hosts that bridge events themselves may call it directly.
    pub async fn handle_event(&self, event: WalletEvent) {
        self.inner.handle_event(event).await;
    }

    /// Stop listening for provider events and wait for the listener to exit.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.listener.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Wallet event listener failed: {e}");
                }
            }
        }
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.abort();
        }
    }
}

async fn listen(
    inner: Arc<SessionInner>,
    mut events: WalletEvents,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => break,
            event = events.next() => match event {
                Some(event) => event,
                None => break,
            },
        };
        // A hung provider call must not hold up shutdown.
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = inner.handle_event(event) => {}
        }
    }
    debug!("wallet event listener stopped");
}

impl SessionInner {
    fn record_error(&self, err: &WalletError) {
        let message = err.to_string();
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
    }

    async fn connect(&self) -> bool {
        self.try_connect().await.is_ok()
    }

    async fn try_connect(&self) -> Result<(), WalletError> {
        let Some(client) = &self.client else {
            let err = WalletError::ProviderUnavailable;
            self.record_error(&err);
            return Err(err);
        };

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match fetch_account(client).await {
            Ok((address, chain_id, balance)) => {
                info!(address = %address, chain_id, "wallet connected");
                self.state.send_replace(WalletState {
                    is_connected: true,
                    address: Some(address),
                    balance: Some(format_native(balance)),
                    balance_wei: Some(balance),
                    chain_id: Some(chain_id),
                    is_loading: false,
                    error: None,
                });
                Ok(())
            }
            Err(e) => {
                warn!("Wallet connection error: {e}");
                self.record_error(&e);
                Err(e)
            }
        }
    }

    fn disconnect(&self) {
        self.state.send_replace(WalletState::default());
        info!("wallet disconnected");
    }

    async fn refresh(&self) -> Result<(), WalletError> {
        let (Some(client), Some(address)) = (&self.client, self.state.borrow().address.clone())
        else {
            return Ok(());
        };

        match client.balance(&address).await {
            Ok(balance) => {
                // The account may have changed while the query was in flight.
                self.state.send_if_modified(|s| {
                    if s.address.as_deref() != Some(address.as_str()) {
                        return false;
                    }
                    s.balance = Some(format_native(balance));
                    s.balance_wei = Some(balance);
                    true
                });
                debug!(address = %address, "wallet balance refreshed");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to refresh wallet: {e}");
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    async fn restore(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        match client.accounts().await {
            Ok(accounts) if !accounts.is_empty() => self.connect().await,
            Ok(_) => false,
            Err(e) => {
                warn!("Failed to check existing connection: {e}");
                false
            }
        }
    }

    async fn send_transaction(
        &self,
        to: &str,
        amount: &str,
        memo: Option<&str>,
    ) -> Result<String, WalletError> {
        let to = to.trim();
        let amount = amount.trim();
        if to.is_empty() || amount.is_empty() {
            return Err(WalletError::InvalidInput(
                "Invalid recipient address or amount".into(),
            ));
        }
        if !is_valid_address(to) {
            return Err(WalletError::InvalidInput(
                "Please enter a valid Ethereum recipient address.".into(),
            ));
        }
        let value = parse_native(amount)?;
        if value.is_zero() {
            return Err(WalletError::InvalidInput("Invalid amount".into()));
        }
        let memo = memo.unwrap_or_default();
        if memo.chars().count() > MAX_MEMO_CHARS {
            return Err(WalletError::InvalidInput(format!(
                "Message must be at most {MAX_MEMO_CHARS} characters"
            )));
        }

        let snapshot = self.state.borrow().clone();
        let Some(from) = snapshot.address.filter(|_| snapshot.is_connected) else {
            return Err(WalletError::NotConnected);
        };
        let client = self.client.as_ref().ok_or(WalletError::ProviderUnavailable)?;

        if let (Some(known), Some(display)) = (snapshot.balance_wei, &snapshot.balance) {
            if value > known {
                let symbol = snapshot
                    .chain_id
                    .and_then(chain_info)
                    .map(|c| c.native_symbol)
                    .unwrap_or_else(|| "ETH".to_string());
                return Err(WalletError::InsufficientBalance {
                    requested: amount.to_string(),
                    available: format!("{display} {symbol}"),
                });
            }
        }

        let gas_price = client.gas_price().await?;
        let tx = TransferRequest {
            from,
            to: to.to_lowercase(),
            value,
            gas: TRANSFER_GAS_LIMIT,
            gas_price,
            data: memo.as_bytes().to_vec(),
        };
        info!(to = %tx.to, amount, "sending transaction");

        match client.send_transaction(&tx).await {
            Ok(hash) => {
                info!(tx_hash = %hash, "transaction sent");
                Ok(hash)
            }
            Err(e) => {
                error!("Transaction error: {e}");
                Err(e)
            }
        }
    }

    async fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                debug!(count = accounts.len(), "accounts changed");
                let current = self.state.borrow().address.clone();
                match accounts.first() {
                    None => self.disconnect(),
                    Some(primary) if current.as_deref() != Some(primary.as_str()) => {
                        // Drop the old account before the round-trip so it is
                        // never reported alongside a pending connect.
                        self.state.send_replace(WalletState {
                            is_loading: true,
                            ..WalletState::default()
                        });
                        self.connect().await;
                    }
                    Some(_) => {}
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                debug!(chain_id, "chain changed");
                let connected = self.state.send_if_modified(|s| {
                    if !s.is_connected {
                        return false;
                    }
                    s.chain_id = Some(chain_id);
                    true
                });
                if connected {
                    let _ = self.refresh().await;
                }
            }
            WalletEvent::Disconnected => self.disconnect(),
        }
    }
}

async fn fetch_account(client: &ProviderClient) -> Result<(String, u64, U256), WalletError> {
    let accounts = client.request_accounts().await?;
    let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
    let chain_id = client.chain_id().await?;
    let balance = client.balance(&address).await?;
    Ok((address, chain_id, balance))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::error::ProviderError;
    use crate::provider::{ProviderEvent, methods};
    use crate::testing::{ALICE, BOB, MockProvider};

    fn session_with(mock: &Arc<MockProvider>) -> WalletSession {
        WalletSession::new(Some(mock.clone() as Arc<dyn InjectedProvider>))
    }

    async fn connected() -> (Arc<MockProvider>, WalletSession) {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);
        assert!(session.connect().await);
        (mock, session)
    }

    async fn wait_for(
        rx: &mut watch::Receiver<WalletState>,
        pred: impl Fn(&WalletState) -> bool,
    ) -> WalletState {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if pred(&rx.borrow_and_update()) {
                    return rx.borrow().clone();
                }
                rx.changed().await.expect("session dropped");
            }
        })
        .await
        .expect("state never matched")
    }

    #[tokio::test]
    async fn provider_detection() {
        let mock = Arc::new(MockProvider::new());
        assert!(session_with(&mock).is_provider_available());
        assert!(!WalletSession::new(None).is_provider_available());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn connect_populates_session() {
        let (mock, session) = connected().await;
        let state = session.state();

        assert!(state.is_connected);
        assert_eq!(state.address.as_deref(), Some(ALICE));
        assert_eq!(state.chain_id, Some(1));
        assert_eq!(state.balance.as_deref(), Some("1.500000"));
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(
            mock.calls(),
            vec![methods::REQUEST_ACCOUNTS, methods::CHAIN_ID, methods::GET_BALANCE]
        );
    }

    #[tokio::test]
    async fn connect_lowercases_address() {
        let mock = Arc::new(MockProvider::with_account());
        mock.respond(
            methods::REQUEST_ACCOUNTS,
            json!(["0xA11CE00000000000000000000000000000000001"]),
        );
        let session = session_with(&mock);
        assert!(session.connect().await);
        assert_eq!(session.address().as_deref(), Some(ALICE));
    }

    #[tokio::test]
    async fn connect_without_provider_fails_softly() {
        let session = WalletSession::new(None);
        assert!(!session.connect().await);

        let state = session.state();
        assert!(!state.is_connected);
        assert!(state.address.is_none());
        assert!(state.error.is_some());
        assert_eq!(session.try_connect().await, Err(WalletError::ProviderUnavailable));
    }

    #[tokio::test]
    async fn zero_accounts_leaves_session_disconnected_with_error() {
        let mock = Arc::new(MockProvider::with_account());
        mock.respond(methods::REQUEST_ACCOUNTS, json!([]));
        let session = session_with(&mock);

        assert!(!session.connect().await);
        let state = session.state();
        assert!(!state.is_connected);
        assert!(!state.is_loading);
        assert!(!state.error.unwrap_or_default().is_empty());
        assert_eq!(mock.call_count(methods::CHAIN_ID), 0);
    }

    #[tokio::test]
    async fn user_rejection_is_reported_verbatim() {
        let mock = Arc::new(MockProvider::with_account());
        mock.fail(
            methods::REQUEST_ACCOUNTS,
            ProviderError::rpc(4001, "User rejected the request."),
        );
        let session = session_with(&mock);

        let err = session.try_connect().await.unwrap_err();
        assert_eq!(err, WalletError::UserRejected("User rejected the request.".into()));
        assert_eq!(
            session.state().error.as_deref(),
            Some("User rejected the request.")
        );
    }

    #[tokio::test]
    async fn disconnect_resets_everything() {
        let (mock, session) = connected().await;
        let calls_before = mock.calls().len();

        session.disconnect();
        assert_eq!(session.state(), WalletState::default());
        assert_eq!(mock.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn refresh_is_noop_when_disconnected() {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);

        session.refresh().await.unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_updates_balance_only() {
        let (mock, session) = connected().await;
        mock.respond(methods::GET_BALANCE, json!("0xde0b6b3a7640000"));
        mock.respond(methods::CHAIN_ID, json!("0x38"));

        session.refresh().await.unwrap();
        let state = session.state();
        assert_eq!(state.balance.as_deref(), Some("1.000000"));
        assert_eq!(state.chain_id, Some(1));
        assert_eq!(state.address.as_deref(), Some(ALICE));
    }

    #[tokio::test]
    async fn refresh_failure_sets_error() {
        let (mock, session) = connected().await;
        mock.fail(methods::GET_BALANCE, ProviderError::rpc(-32000, "header not found"));

        assert!(session.refresh().await.is_err());
        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("header not found"));
        assert_eq!(state.balance.as_deref(), Some("1.500000"));
    }

    #[tokio::test]
    async fn send_rejects_non_positive_amounts_without_provider_calls() {
        let (mock, session) = connected().await;
        let calls_before = mock.calls().len();

        for amount in ["0", "-1", "0.0", "", "abc"] {
            let err = session.send_transaction(BOB, amount, None).await.unwrap_err();
            assert!(
                matches!(err, WalletError::InvalidInput(_)),
                "{amount:?} gave {err:?}"
            );
        }
        assert_eq!(mock.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn send_rejects_malformed_recipient_and_long_memo() {
        let (_mock, session) = connected().await;

        let err = session.send_transaction("0x1234", "1", None).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));

        let memo = "x".repeat(MAX_MEMO_CHARS + 1);
        let err = session
            .send_transaction(BOB, "0.1", Some(&memo))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn send_while_disconnected_does_not_connect() {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);

        let err = session.send_transaction(BOB, "0.1", None).await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
        assert!(mock.calls().is_empty());
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn send_checks_known_balance() {
        let (mock, session) = connected().await;

        let err = session.send_transaction(BOB, "2", None).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientBalance {
                requested: "2".into(),
                available: "1.500000 ETH".into(),
            }
        );
        assert_eq!(mock.call_count(methods::GAS_PRICE), 0);
    }

    #[tokio::test]
    async fn send_submits_transfer_and_returns_hash() {
        let (mock, session) = connected().await;

        let hash = session
            .send_transaction(BOB, "0.5", Some("thanks"))
            .await
            .unwrap();
        assert_eq!(hash, "0xdeadbeef");

        let params = mock.last_params(methods::SEND_TRANSACTION).unwrap();
        let tx = &params[0];
        assert_eq!(tx["from"], ALICE);
        assert_eq!(tx["to"], BOB);
        assert_eq!(tx["value"], "0x6f05b59d3b20000");
        assert_eq!(tx["gas"], "0x5208");
        assert_eq!(tx["gasPrice"], "0x4a817c800");
        assert_eq!(tx["data"], format!("0x{}", hex::encode("thanks")));
    }

    #[tokio::test]
    async fn send_surfaces_provider_message_verbatim() {
        let (mock, session) = connected().await;
        mock.fail(
            methods::SEND_TRANSACTION,
            ProviderError::rpc(-32000, "insufficient funds for gas * price + value"),
        );

        let err = session.send_transaction(BOB, "0.1", None).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::TransactionFailed("insufficient funds for gas * price + value".into())
        );
        // A failed send is not a connection failure.
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn empty_accounts_event_disconnects_synchronously() {
        let (mock, session) = connected().await;
        let calls_before = mock.calls().len();

        session.handle_event(WalletEvent::AccountsChanged(vec![])).await;
        assert_eq!(session.state(), WalletState::default());
        assert_eq!(mock.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn same_primary_account_event_is_ignored() {
        let (mock, session) = connected().await;
        let calls_before = mock.calls().len();

        session
            .handle_event(WalletEvent::AccountsChanged(vec![ALICE.into(), BOB.into()]))
            .await;
        assert_eq!(mock.calls().len(), calls_before);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn different_primary_account_reconnects() {
        let (mock, session) = connected().await;
        mock.respond(methods::REQUEST_ACCOUNTS, json!([BOB]));

        session
            .handle_event(WalletEvent::AccountsChanged(vec![BOB.into()]))
            .await;
        assert_eq!(session.address().as_deref(), Some(BOB));
        assert_eq!(mock.call_count(methods::REQUEST_ACCOUNTS), 2);
    }

    #[tokio::test]
    async fn failed_account_switch_drops_the_old_account() {
        let (mock, session) = connected().await;
        mock.fail(
            methods::REQUEST_ACCOUNTS,
            ProviderError::rpc(4001, "User rejected the request."),
        );

        session
            .handle_event(WalletEvent::AccountsChanged(vec![BOB.into()]))
            .await;
        let state = session.state();
        assert!(!state.is_connected);
        assert!(state.address.is_none());
        assert!(state.balance_wei.is_none());
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("User rejected the request."));

        let err = session.send_transaction(BOB, "0.1", None).await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
        assert_eq!(mock.call_count(methods::SEND_TRANSACTION), 0);
    }

    #[tokio::test]
    async fn pending_account_switch_never_shows_the_old_account() {
        let (mock, session) = connected().await;
        mock.hang(methods::REQUEST_ACCOUNTS);
        let mut rx = session.subscribe();

        let switch = session.handle_event(WalletEvent::AccountsChanged(vec![BOB.into()]));
        assert!(
            tokio::time::timeout(Duration::from_millis(50), switch)
                .await
                .is_err()
        );

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert!(seen.is_loading);
        assert!(!seen.is_connected);
        assert!(seen.address.is_none());
        assert!(seen.balance.is_none());
        assert_eq!(session.state(), seen);
    }

    #[tokio::test]
    async fn chain_change_updates_id_and_refreshes() {
        let (mock, session) = connected().await;
        mock.respond(methods::GET_BALANCE, json!("0x0"));

        session.handle_event(WalletEvent::ChainChanged(137)).await;
        let state = session.state();
        assert_eq!(state.chain_id, Some(137));
        assert_eq!(state.balance.as_deref(), Some("0.000000"));
        assert_eq!(mock.call_count(methods::GET_BALANCE), 2);
    }

    #[tokio::test]
    async fn chain_change_while_disconnected_is_ignored() {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);

        session.handle_event(WalletEvent::ChainChanged(56)).await;
        assert_eq!(session.state(), WalletState::default());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_events_reach_the_session() {
        let (mock, session) = connected().await;
        let mut rx = session.subscribe();

        mock.emit(ProviderEvent::ChainChanged("0x89".into()));
        let state = wait_for(&mut rx, |s| s.chain_id == Some(137)).await;
        assert!(state.is_connected);

        mock.emit(ProviderEvent::Disconnect);
        let state = wait_for(&mut rx, |s| !s.is_connected).await;
        assert_eq!(state, WalletState::default());
    }

    #[tokio::test]
    async fn close_unsubscribes_from_provider() {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);
        assert_eq!(mock.subscriber_count(), 1);

        session.close().await;
        assert_eq!(mock.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn close_returns_while_an_event_is_stuck_on_the_provider() {
        let mock = Arc::new(MockProvider::with_account());
        mock.hang(methods::REQUEST_ACCOUNTS);
        let session = session_with(&mock);

        mock.emit(ProviderEvent::AccountsChanged(vec![BOB.into()]));
        tokio::time::timeout(Duration::from_secs(2), async {
            while mock.call_count(methods::REQUEST_ACCOUNTS) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("event never reached the provider");

        tokio::time::timeout(Duration::from_secs(2), session.close())
            .await
            .expect("close blocked on the listener");
        assert_eq!(mock.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn drop_unsubscribes_from_provider() {
        let mock = Arc::new(MockProvider::with_account());
        drop(session_with(&mock));

        tokio::time::timeout(Duration::from_secs(2), async {
            while mock.subscriber_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listener still subscribed after drop");
    }

    #[tokio::test]
    async fn restore_connects_only_with_authorised_accounts() {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);
        assert!(session.restore().await);
        assert!(session.is_connected());

        let empty = Arc::new(MockProvider::with_account());
        empty.respond(methods::ACCOUNTS, json!([]));
        let session = session_with(&empty);
        assert!(!session.restore().await);
        assert_eq!(empty.call_count(methods::REQUEST_ACCOUNTS), 0);
    }

    #[test]
    fn new_outside_runtime_does_not_panic() {
        let mock = Arc::new(MockProvider::with_account());
        let session = session_with(&mock);
        assert!(session.is_provider_available());
        assert_eq!(mock.subscriber_count(), 0);
    }
}
