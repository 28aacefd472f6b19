use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tokio::time::{Duration, Instant};

/// Last time the operator touched the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityState {
    last_interaction_at: Instant,
}

impl ActivityState {
    pub fn new(now: Instant) -> Self {
        Self {
            last_interaction_at: now,
        }
    }

    pub fn last_interaction_at(&self) -> Instant {
        self.last_interaction_at
    }

    /// Never moves backwards, even if an older event is reported late.
    pub fn record(&mut self, at: Instant) {
        if at > self.last_interaction_at {
            self.last_interaction_at = at;
        }
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_interaction_at)
    }
}

/// Session-scoped flags shared by the scanner, the monitor and the binary.
///
/// Cheap to clone; every clone sees the same session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    authenticated: AtomicBool,
    activity: Mutex<ActivityState>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                authenticated: AtomicBool::new(false),
                activity: Mutex::new(ActivityState::new(Instant::now())),
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.authenticated.load(Ordering::SeqCst)
    }

    /// Enter the active state. Activity restarts from now.
    pub fn authenticate(&self) {
        self.record_interaction_at(Instant::now());
        self.inner.authenticated.store(true, Ordering::SeqCst);
    }

    /// Drop the session flag. Only a fresh `authenticate` gets back in.
    pub fn terminate(&self) {
        self.inner.authenticated.store(false, Ordering::SeqCst);
    }

    pub fn record_interaction(&self) {
        self.record_interaction_at(Instant::now());
    }

    pub fn record_interaction_at(&self, at: Instant) {
        self.inner
            .activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(at);
    }

    pub fn activity(&self) -> ActivityState {
        *self
            .inner
            .activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
