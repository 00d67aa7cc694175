//! Scripted provider for unit tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::error::ProviderError;
use crate::provider::{InjectedProvider, ProviderEvent, methods};

pub(crate) const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
pub(crate) const BOB: &str = "0xb0b0000000000000000000000000000000000002";

pub(crate) struct MockProvider {
    responses: Mutex<HashMap<String, Result<Value, ProviderError>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    hanging: Mutex<HashSet<String>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            hanging: Mutex::new(HashSet::new()),
            events,
        }
    }

    /// Provider with one authorised account on mainnet holding 1.5 ETH.
    pub(crate) fn with_account() -> Self {
        let mock = Self::new();
        mock.respond(methods::ACCOUNTS, json!([ALICE]));
        mock.respond(methods::REQUEST_ACCOUNTS, json!([ALICE]));
        mock.respond(methods::CHAIN_ID, json!("0x1"));
        mock.respond(methods::GET_BALANCE, json!("0x14d1120d7b160000"));
        mock.respond(methods::GAS_PRICE, json!("0x4a817c800"));
        mock.respond(methods::SEND_TRANSACTION, json!("0xdeadbeef"));
        mock
    }

    pub(crate) fn respond(&self, method: &str, value: Value) {
        self.responses.lock().insert(method.to_string(), Ok(value));
    }

    pub(crate) fn fail(&self, method: &str, err: ProviderError) {
        self.responses.lock().insert(method.to_string(), Err(err));
    }

    /// Calls to `method` are recorded but never resolve.
    pub(crate) fn hang(&self, method: &str) {
        self.hanging.lock().insert(method.to_string());
    }

    pub(crate) fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    pub(crate) fn call_count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == method).count()
    }

    pub(crate) fn last_params(&self, method: &str) -> Option<Vec<Value>> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl InjectedProvider for MockProvider {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        self.calls.lock().push((method.to_string(), params));
        let hangs = self.hanging.lock().contains(method);
        if hangs {
            std::future::pending::<()>().await;
        }
        self.responses
            .lock()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::Other(format!("unscripted method {method}"))))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
