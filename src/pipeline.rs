use anyhow::{Context, Result};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::{format_instant, ClockController},
    error::ScanError,
    events::{emit, EventSender, KioskEvent},
    identity::{extract_matricule, hash_identity},
    presence::{PresenceMarkResult, PresenceSubmitter},
    scan::ConfirmedScan,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Confirmed scan -> matricule -> opaque id -> presence mark.
#[derive(Clone)]
pub struct ScanPipeline {
    submitter: PresenceSubmitter,
    clock: ClockController,
    events: EventSender,
}

impl ScanPipeline {
    pub fn new(submitter: PresenceSubmitter, clock: ClockController, events: EventSender) -> Self {
        Self {
            submitter,
            clock,
            events,
        }
    }

    /// Run one confirmed scan to completion and report it.
    pub async fn handle_scan(&self, scan: ConfirmedScan) -> Result<PresenceMarkResult, ScanError> {
        emit(
            &self.events,
            KioskEvent::ScanConfirmed {
                raw_text: scan.raw_text.clone(),
            },
        );

        let matricule = match extract_matricule(&scan.raw_text) {
            Ok(matricule) => matricule,
            Err(err) => {
                log_warn!("rejected scan: {err}");
                emit(
                    &self.events,
                    KioskEvent::ScanRejected {
                        message: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let id = hash_identity(&matricule);
        let timezone = self.clock.timezone().await;
        let result = self.submitter.submit(&id, timezone).await;

        if result.is_ok() {
            emit(
                &self.events,
                KioskEvent::PresenceMarked {
                    entry: format_instant(result.entry_time.as_deref(), timezone),
                    exit: format_instant(result.exit_time.as_deref(), timezone),
                },
            );
        } else {
            emit(
                &self.events,
                KioskEvent::PresenceFailed {
                    message: result.message.clone().unwrap_or_default(),
                },
            );
        }

        Ok(result)
    }

    /// Consume confirmed scans until cancelled. Each scan gets its own task,
    /// so a slow submission never holds up the next badge.
    pub fn spawn(
        self,
        mut confirmed: mpsc::UnboundedReceiver<ConfirmedScan>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    scan = confirmed.recv() => {
                        let Some(scan) = scan else { break };
                        let pipeline = self.clone();
                        tokio::spawn(async move {
                            let _ = pipeline.handle_scan(scan).await;
                        });
                    }
                }
            }
            log_info!("scan pipeline stopped");
        })
    }
}

/// Await a pipeline task, surfacing a panic inside it.
pub async fn join_pipeline(handle: JoinHandle<()>) -> Result<()> {
    handle.await.context("scan pipeline task failed to join")
}
