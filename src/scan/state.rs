use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

/// One readable code from the camera decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeEvent {
    pub text: String,
    pub observed_at: Instant,
}

impl DecodeEvent {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            observed_at: Instant::now(),
        }
    }
}

/// What the decoder hands us per frame. Failures are noise and never compete
/// with a pending text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFrame {
    Decoded(DecodeEvent),
    Failure(String),
}

/// A reading that survived the full debounce window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedScan {
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Same text as the armed one; the running window is left alone.
    Repeat,
    /// Same text as the last confirmed scan with nothing different in between.
    Suppressed,
    /// A fresh window was started. `replaced` holds the text it discarded.
    Armed { replaced: Option<String> },
}

/// Debounce bookkeeping. At most one text is armed at a time.
#[derive(Debug, Clone, Default)]
pub struct DebounceState {
    pending_text: Option<String>,
    armed_at: Option<Instant>,
    /// Last emitted text; blocks re-arming until a different text shows up.
    last_confirmed: Option<String>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_text(&self) -> Option<&str> {
        self.pending_text.as_deref()
    }

    pub fn armed_at(&self) -> Option<Instant> {
        self.armed_at
    }

    pub fn is_armed(&self) -> bool {
        self.pending_text.is_some()
    }

    pub fn observe(&mut self, event: &DecodeEvent) -> DecodeOutcome {
        if self.pending_text.as_deref() == Some(event.text.as_str()) {
            return DecodeOutcome::Repeat;
        }

        if self.pending_text.is_none() && self.last_confirmed.as_deref() == Some(event.text.as_str())
        {
            return DecodeOutcome::Suppressed;
        }

        self.last_confirmed = None;
        let replaced = self.pending_text.replace(event.text.clone());
        self.armed_at = Some(event.observed_at);
        DecodeOutcome::Armed { replaced }
    }

    /// When the armed text becomes confirmed, if anything is armed.
    pub fn deadline(&self, window: Duration) -> Option<Instant> {
        self.armed_at.map(|armed_at| armed_at + window)
    }

    /// Timer expiry: emit the armed text and clear the pending slot.
    pub fn fire(&mut self) -> Option<ConfirmedScan> {
        self.armed_at = None;
        let raw_text = self.pending_text.take()?;
        self.last_confirmed = Some(raw_text.clone());
        Some(ConfirmedScan { raw_text })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
