//! Request sequencing and cancellation for dashboard fetches.
//!
//! Every logical fetch is issued a monotonically increasing [`RequestSeq`]
//! and a [`CancelToken`]. Issuing a new fetch cancels the previous token,
//! and a result is only committed when its sequence number is still the
//! latest issued, so a slow superseded response can never overwrite newer
//! state. Stale and cancelled fetches are dropped silently.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::Notify;
use tracing::debug;

use crate::error::BoardError;

/// Cancellation token shared between the issuer and the fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            // register before checking so a concurrent cancel is not missed
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Handle for one issued fetch.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub seq: RequestSeq,
    pub token: CancelToken,
}

#[derive(Debug, Default)]
pub struct FetchSequencer {
    latest: AtomicU64,
    current: Mutex<Option<CancelToken>>,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next sequence number and cancels the fetch it supersedes.
    pub fn issue(&self) -> FetchTicket {
        let token = CancelToken::new();
        // numbering and token swap happen together, so the highest number
        // always belongs to the token that is not cancelled
        let (seq, previous) = {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            let seq = RequestSeq(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
            (seq, current.replace(token.clone()))
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
        FetchTicket { seq, token }
    }

    pub fn latest(&self) -> RequestSeq {
        RequestSeq(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_latest(&self, ticket: &FetchTicket) -> bool {
        !ticket.token.is_cancelled() && ticket.seq == self.latest()
    }

    /// Cancels whatever fetch is in flight, e.g. on navigation.
    pub fn cancel_all(&self) {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(token) = current {
            token.cancel();
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome<T> {
    Committed(Arc<T>),
    Failed(BoardError),
    /// Cancelled or superseded; nothing was changed.
    Discarded,
}

/// Latest committed dashboard state fed by sequenced fetches.
pub struct DashboardFeed<T> {
    sequencer: FetchSequencer,
    state: RwLock<Option<Arc<T>>>,
    error: RwLock<Option<String>>,
}

impl<T> Default for DashboardFeed<T> {
    fn default() -> Self {
        Self { sequencer: FetchSequencer::new(), state: RwLock::new(None), error: RwLock::new(None) }
    }
}

impl<T> DashboardFeed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequencer(&self) -> &FetchSequencer {
        &self.sequencer
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Runs `fetch` as the newest request. Its result is committed only if no
    /// newer request was issued and it was not cancelled meanwhile.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> FetchOutcome<T>
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Result<T, BoardError>>,
    {
        let ticket = self.sequencer.issue();
        let result = tokio::select! {
            _ = ticket.token.cancelled() => None,
            result = fetch(ticket.token.clone()) => Some(result),
        };
        let Some(result) = result else {
            debug!(seq = ticket.seq.value(), "fetch cancelled");
            return FetchOutcome::Discarded;
        };
        // the latest check happens under the state lock so a newer commit
        // cannot land between the check and the write
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if !self.sequencer.is_latest(&ticket) {
            debug!(seq = ticket.seq.value(), latest = self.sequencer.latest().value(), "stale fetch dropped");
            return FetchOutcome::Discarded;
        }
        let mut error = self.error.write().unwrap_or_else(|e| e.into_inner());
        match result {
            Ok(value) => {
                let value = Arc::new(value);
                *state = Some(Arc::clone(&value));
                *error = None;
                FetchOutcome::Committed(value)
            }
            Err(e) => {
                *error = Some(e.to_string());
                FetchOutcome::Failed(e)
            }
        }
    }
}
