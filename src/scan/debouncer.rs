use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::state::{ConfirmedScan, DebounceState, DecodeEvent, DecodeFrame, DecodeOutcome};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Runs the debounce state machine until cancelled or the frame stream ends.
///
/// The timer arm is polled before the frame arm, so an expiry that is due
/// emits and clears before any frame queued in the same tick is looked at.
pub async fn debounce_loop(
    mut frames: mpsc::UnboundedReceiver<DecodeFrame>,
    confirmed: mpsc::UnboundedSender<ConfirmedScan>,
    window: Duration,
    cancel_token: CancellationToken,
) {
    let mut state = DebounceState::new();

    loop {
        let deadline = state.deadline(window);

        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("scan debouncer shutting down");
                break;
            }
            _ = wait_until(deadline) => {
                if let Some(scan) = state.fire() {
                    log_info!("scan confirmed after {}ms", window.as_millis());
                    if confirmed.send(scan).is_err() {
                        log_warn!("confirmed scan dropped: no consumer");
                        break;
                    }
                }
            }
            frame = frames.recv() => match frame {
                Some(DecodeFrame::Decoded(event)) => match state.observe(&event) {
                    DecodeOutcome::Armed { replaced: Some(previous) } => {
                        log_debug!("discarding unconfirmed scan {:?}", previous);
                    }
                    DecodeOutcome::Armed { replaced: None } => {
                        log_debug!("debounce window armed");
                    }
                    DecodeOutcome::Repeat | DecodeOutcome::Suppressed => {}
                },
                Some(DecodeFrame::Failure(reason)) => {
                    log_debug!("ignoring decoder noise: {reason}");
                }
                None => {
                    log_info!("decode stream closed");
                    break;
                }
            },
        }
    }

    state.reset();
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Owns the debounce task and the sending half of its frame stream.
pub struct ScanDebouncer {
    frames: mpsc::UnboundedSender<DecodeFrame>,
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl ScanDebouncer {
    pub fn start(window: Duration, confirmed: mpsc::UnboundedSender<ConfirmedScan>) -> Self {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(debounce_loop(
            frames_rx,
            confirmed,
            window,
            cancel_token.clone(),
        ));

        Self {
            frames: frames_tx,
            handle: Some(handle),
            cancel_token,
        }
    }

    /// Feed one decoded code, stamped with the current instant.
    pub fn on_decode(&self, text: impl Into<String>) -> Result<()> {
        self.push(DecodeFrame::Decoded(DecodeEvent::now(text)))
    }

    pub fn on_decode_failure(&self, reason: impl Into<String>) -> Result<()> {
        self.push(DecodeFrame::Failure(reason.into()))
    }

    fn push(&self, frame: DecodeFrame) -> Result<()> {
        self.frames
            .send(frame)
            .map_err(|_| anyhow!("scan debouncer is not running"))
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.cancel_token.cancel();

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("scan debouncer task failed to join")
        } else {
            Ok(())
        }
    }
}
