//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use horizon_overlay::interop::functions;
use horizon_overlay::{
    HostError, HostInvoker, ObserverError, Popover, PopoverCollectionChange, PopoverId, PopoverObserver,
    PopoverOperation, RenderFragment, UserAttributes, fragment,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A host that records every call and can be scripted to fail.
#[derive(Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    events: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, HostError>>,
    latency: Mutex<Option<Duration>>,
    providers: Mutex<u64>,
}

impl RecordingInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call to `identifier` fails with `error` until cleared.
    pub fn fail(&self, identifier: &str, error: HostError) {
        self.failures.lock().insert(identifier.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Every call sleeps this long before completing.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn set_host_providers(&self, count: u64) {
        *self.providers.lock() = count;
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
    }

    /// `"start <identifier>"` and `"end <identifier>"` for every call, in the
    /// order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count(&self, identifier: &str) -> usize {
        self.calls.lock().iter().filter(|(name, _)| name == identifier).count()
    }

    /// Ids passed to `identifier`, in call order.
    pub fn ids(&self, identifier: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| name == identifier)
            .filter_map(|(_, args)| args.first().and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl HostInvoker for RecordingInvoker {
    async fn invoke(&self, identifier: &str, args: Vec<Value>) -> Result<Value, HostError> {
        self.calls.lock().push((identifier.to_string(), args));
        self.events.lock().push(format!("start {identifier}"));
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.events.lock().push(format!("end {identifier}"));
        let failure = self.failures.lock().get(identifier).cloned();
        if let Some(error) = failure {
            return Err(error);
        }
        if identifier == functions::COUNT_PROVIDERS {
            return Ok(json!(*self.providers.lock()));
        }
        Ok(Value::Null)
    }
}

/// A minimal popover component.
#[derive(Clone)]
pub struct TestPopover {
    pub id: PopoverId,
    pub open: bool,
    pub class: String,
    pub style: String,
    pub content: String,
    pub attributes: UserAttributes,
}

impl TestPopover {
    pub fn new(content: &str) -> Self {
        Self {
            id: PopoverId::new(),
            open: false,
            class: "test-popover".to_string(),
            style: String::new(),
            content: content.to_string(),
            attributes: UserAttributes::new(),
        }
    }

    pub fn opened(mut self) -> Self {
        self.open = true;
        self
    }
}

impl Popover for TestPopover {
    fn id(&self) -> PopoverId {
        self.id
    }

    fn open(&self) -> bool {
        self.open
    }

    fn popover_class(&self) -> String {
        self.class.clone()
    }

    fn popover_styles(&self) -> String {
        self.style.clone()
    }

    fn child_content(&self) -> Option<RenderFragment> {
        Some(fragment(self.content.clone()))
    }

    fn user_attributes(&self) -> UserAttributes {
        self.attributes.clone()
    }
}

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingObserver {
    pub changes: Mutex<Vec<(PopoverOperation, PopoverId, Vec<PopoverId>)>>,
    pub fail: Mutex<bool>,
}

impl RecordingObserver {
    pub fn len(&self) -> usize {
        self.changes.lock().len()
    }

    pub fn last(&self) -> Option<(PopoverOperation, PopoverId, Vec<PopoverId>)> {
        self.changes.lock().last().cloned()
    }
}

#[async_trait]
impl PopoverObserver for RecordingObserver {
    async fn popover_collection_updated(&self, change: &PopoverCollectionChange) -> Result<(), ObserverError> {
        self.changes.lock().push((
            change.operation,
            change.popover_id,
            change.handlers.iter().map(|h| h.id()).collect(),
        ));
        if *self.fail.lock() {
            return Err(ObserverError::new("observer went away"));
        }
        Ok(())
    }
}
