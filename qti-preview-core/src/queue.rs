//! Request queue
//!
//! Serializes preview calls: a request waits until the previous one has
//! settled. A request dropped while queued gives up its place.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct RequestQueue {
    gate: Arc<Mutex<()>>,
    waiting: Arc<AtomicUsize>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` once every earlier request has completed.
    ///
    /// Tokio's mutex is fair, so requests run in arrival order.
    pub async fn run<F, T>(&self, request: F) -> T
    where
        F: Future<Output = T>,
    {
        let waiting = Waiting::enter(&self.waiting);
        let _turn = self.gate.lock().await;
        drop(waiting);
        request.await
    }

    /// Requests queued behind the one in flight.
    pub fn pending(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// Counts a request as waiting until it is dropped.
struct Waiting<'a>(&'a AtomicUsize);

impl<'a> Waiting<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
