//! Reentrancy latches between a selector and its picker.
//!
//! [`SyncLatch`] records which side is currently applying a change so the
//! other side's synchronous echo is not forwarded back. [`NotifyLatch`]
//! holds the selector's public change notification back while a multi-step
//! operation or a picker burst is in flight.
//!
//! Both hand out RAII guards; dropping a guard (including during unwinding)
//! releases the latch.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::SelectorError;
use crate::record::SelectionRecord;

/// Which side of the host/picker boundary is applying a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    /// The selector is forwarding its own add/remove to the picker.
    ApplyingFromHost,
    /// The selector is applying a change the picker reported.
    ApplyingFromPicker,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::ApplyingFromHost => write!(f, "applying-from-host"),
            SyncState::ApplyingFromPicker => write!(f, "applying-from-picker"),
        }
    }
}

#[derive(Debug, Default)]
struct LatchInner {
    state: SyncState,
    in_flight: Option<String>,
}

/// Two-sided reentrancy latch. At most one side holds it at a time.
#[derive(Debug, Default)]
pub struct SyncLatch {
    inner: Mutex<LatchInner>,
}

impl SyncLatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LatchInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SyncState {
        self.lock().state
    }

    /// Only an idle latch lets the selector call into its picker.
    pub fn forwarding_allowed(&self) -> bool {
        self.state() == SyncState::Idle
    }

    /// Whether `value` is the one currently being forwarded to the picker.
    pub fn is_in_flight(&self, value: &str) -> bool {
        let inner = self.lock();
        inner.state == SyncState::ApplyingFromHost && inner.in_flight.as_deref() == Some(value)
    }

    /// Enter `ApplyingFromHost`. `value` is the entry being forwarded, if
    /// the call concerns a single one.
    pub fn acquire_from_host(&self, value: Option<&str>) -> Result<SyncGuard<'_>, SelectorError> {
        self.acquire(SyncState::ApplyingFromHost, value)
    }

    /// Enter `ApplyingFromPicker`.
    pub fn acquire_from_picker(&self) -> Result<SyncGuard<'_>, SelectorError> {
        self.acquire(SyncState::ApplyingFromPicker, None)
    }

    fn acquire(&self, state: SyncState, value: Option<&str>) -> Result<SyncGuard<'_>, SelectorError> {
        let mut inner = self.lock();
        if inner.state != SyncState::Idle {
            log::warn!("[sync] cannot enter {} while {}", state, inner.state);
            return Err(SelectorError::Reentrant { state: inner.state });
        }
        inner.state = state;
        inner.in_flight = value.map(str::to_string);
        log::trace!("[sync] enter {} ({:?})", state, inner.in_flight);
        Ok(SyncGuard { latch: self })
    }
}

/// Held while one side applies a change. Restores `Idle` on drop.
#[must_use = "the latch is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SyncGuard<'a> {
    latch: &'a SyncLatch,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.latch.lock();
        log::trace!("[sync] leave {}", inner.state);
        inner.state = SyncState::Idle;
        inner.in_flight = None;
    }
}

#[derive(Debug, Default)]
struct NotifyInner {
    /// Nesting depth of scoped suppression guards.
    depth: usize,
    /// An open-ended picker burst is in progress.
    burst: bool,
    /// Records when suppression began.
    snapshot: Option<Vec<SelectionRecord>>,
    /// A notification was requested while suppressed.
    pending: bool,
    /// Snapshot released by the last guard/burst, waiting to be compared.
    ready: Option<Vec<SelectionRecord>>,
}

impl NotifyInner {
    fn suppressed(&self) -> bool {
        self.depth > 0 || self.burst
    }

    fn start(&mut self, snapshot: impl FnOnce() -> Vec<SelectionRecord>) {
        if !self.suppressed() {
            self.snapshot = Some(snapshot());
            self.pending = false;
            self.ready = None;
        }
    }

    fn settle(&mut self) {
        if self.suppressed() {
            return;
        }
        let snapshot = self.snapshot.take();
        if std::mem::take(&mut self.pending) {
            self.ready = snapshot;
        }
    }
}

/// Coalesces change notifications into one per logical operation.
///
/// Suppression comes in two independent forms: scoped guards from
/// [`NotifyLatch::suppress`] and an open-ended burst started by the first
/// picker-originated change and ended by the picker's *complete* event.
#[derive(Debug, Default)]
pub struct NotifyLatch {
    inner: Mutex<NotifyInner>,
}

impl NotifyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, NotifyInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_suppressed(&self) -> bool {
        self.lock().suppressed()
    }

    /// Suppress notifications until the returned guard drops. `snapshot` is
    /// only evaluated by the outermost suppression.
    pub fn suppress(&self, snapshot: impl FnOnce() -> Vec<SelectionRecord>) -> NotifyGuard<'_> {
        let mut inner = self.lock();
        inner.start(snapshot);
        inner.depth += 1;
        NotifyGuard { latch: self }
    }

    /// Start a picker burst. A burst already in progress is extended.
    pub fn begin_burst(&self, snapshot: impl FnOnce() -> Vec<SelectionRecord>) {
        let mut inner = self.lock();
        if inner.burst {
            return;
        }
        inner.start(snapshot);
        inner.burst = true;
    }

    pub fn end_burst(&self) {
        let mut inner = self.lock();
        if !inner.burst {
            return;
        }
        inner.burst = false;
        inner.settle();
    }

    pub fn in_burst(&self) -> bool {
        self.lock().burst
    }

    /// Ask to notify. Returns `true` if the caller should notify right away;
    /// otherwise the request is remembered until suppression ends.
    pub fn request(&self) -> bool {
        let mut inner = self.lock();
        if inner.suppressed() {
            inner.pending = true;
            false
        } else {
            true
        }
    }

    /// Snapshot to compare against once suppression has fully ended with a
    /// notification pending.
    pub fn take_ready(&self) -> Option<Vec<SelectionRecord>> {
        self.lock().ready.take()
    }
}

/// Scoped notification suppression; see [`NotifyLatch::suppress`].
#[must_use = "suppression ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct NotifyGuard<'a> {
    latch: &'a NotifyLatch,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.latch.lock();
        inner.depth = inner.depth.saturating_sub(1);
        inner.settle();
    }
}
