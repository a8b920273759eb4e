//! Scripted transport for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fetchward::options::EffectiveOptions;
use fetchward::transport::{Transport, TransportError};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

type Reply = dyn Fn(&str, &EffectiveOptions) -> Result<Value, TransportError> + Send + Sync;

/// Counts invocations, records what it was asked for, and can hold every
/// round-trip open until [`open`](Self::open) is called.
#[derive(Clone)]
pub struct MockTransport {
    calls: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
    seen: Arc<Mutex<Vec<(String, EffectiveOptions)>>>,
    reply: Arc<Reply>,
}

impl MockTransport {
    /// Replies with `{"url": .., "call": n}` where `n` counts from 1.
    pub fn echo() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut mock = Self::replying(move |url, _| {
            Ok(json!({ "url": url, "call": counter.load(Ordering::SeqCst) }))
        });
        mock.calls = calls;
        mock
    }

    pub fn replying<F>(reply: F) -> Self
    where
        F: Fn(&str, &EffectiveOptions) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
            seen: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(reply),
        }
    }

    /// Holds every round-trip until [`open`](Self::open).
    #[must_use]
    pub fn gated(self) -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            ..self
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS - self.gate.available_permits());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, EffectiveOptions)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn transport(&self) -> impl Transport + use<> {
        let mock = self.clone();
        move |url: String, options: EffectiveOptions| {
            let mock = mock.clone();
            async move {
                mock.calls.fetch_add(1, Ordering::SeqCst);
                mock.seen.lock().unwrap().push((url.clone(), options.clone()));
                let _permit = mock.gate.acquire().await.unwrap();
                (mock.reply)(&url, &options)
            }
        }
    }
}

/// Installs a test-writer subscriber once; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Yields until `condition` holds, giving spawned tasks a chance to run.
pub async fn until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
