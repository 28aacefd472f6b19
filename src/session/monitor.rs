use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::events::{emit, EventSender, KioskEvent};

use super::SessionContext;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Active,
    /// Terminal. Only re-authentication starts a new monitor.
    Expired,
}

/// Polls operator activity and ends the session after a quiet period.
///
/// Detection granularity is the check interval, so the real idle time before
/// termination can exceed the threshold by up to one interval.
pub struct InactivityMonitor {
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
    phase: watch::Receiver<SessionPhase>,
}

impl InactivityMonitor {
    pub fn start(
        ctx: SessionContext,
        events: EventSender,
        check_interval: Duration,
        threshold: Duration,
    ) -> Result<Self> {
        if !ctx.is_authenticated() {
            bail!("inactivity monitor needs an authenticated session");
        }

        let cancel_token = CancellationToken::new();
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Active);

        let handle = tokio::spawn(inactivity_loop(
            ctx,
            events,
            check_interval,
            threshold,
            phase_tx,
            cancel_token.clone(),
        ));

        Ok(Self {
            handle: Some(handle),
            cancel_token,
            phase: phase_rx,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Resolves once the session has expired, or the monitor is gone.
    pub async fn expired(&mut self) {
        let _ = self
            .phase
            .wait_for(|phase| *phase == SessionPhase::Expired)
            .await;
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.cancel_token.cancel();

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("inactivity monitor task failed to join")
        } else {
            Ok(())
        }
    }
}

async fn inactivity_loop(
    ctx: SessionContext,
    events: EventSender,
    check_interval: Duration,
    threshold: Duration,
    phase: watch::Sender<SessionPhase>,
    cancel_token: CancellationToken,
) {
    let mut checks = time::interval_at(Instant::now() + check_interval, check_interval);
    checks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("inactivity monitor shutting down");
                break;
            }
            _ = checks.tick() => {
                if !ctx.is_authenticated() {
                    log_info!("session ended elsewhere; inactivity monitor exiting");
                    break;
                }

                let idle = ctx.activity().idle_for(Instant::now());
                log_debug!("idle for {}s", idle.as_secs());

                if idle >= threshold {
                    log_warn!(
                        "no operator activity for {}s; terminating session",
                        idle.as_secs()
                    );
                    ctx.terminate();
                    phase.send_replace(SessionPhase::Expired);
                    emit(&events, KioskEvent::SessionExpired);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::sleep;

    const CHECK: Duration = Duration::from_secs(60);
    const THRESHOLD: Duration = Duration::from_secs(30 * 60);

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn drain(rx: &mut events::EventReceiver) -> Vec<KioskEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn refuses_to_start_without_a_session() {
        let (tx, _rx) = events::channel();
        assert!(InactivityMonitor::start(SessionContext::new(), tx, CHECK, THRESHOLD).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_exactly_once_after_quiet_period() {
        let ctx = SessionContext::new();
        ctx.authenticate();
        let (tx, mut rx) = events::channel();
        let mut monitor = InactivityMonitor::start(ctx.clone(), tx, CHECK, THRESHOLD).unwrap();

        sleep(minutes(29)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(monitor.phase(), SessionPhase::Active);

        sleep(minutes(2)).await;
        assert_eq!(drain(&mut rx), vec![KioskEvent::SessionExpired]);
        assert_eq!(monitor.phase(), SessionPhase::Expired);
        assert!(!ctx.is_authenticated());

        sleep(minutes(60)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));

        monitor.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn interaction_restarts_the_quiet_period() {
        let ctx = SessionContext::new();
        ctx.authenticate();
        let (tx, mut rx) = events::channel();
        let mut monitor = InactivityMonitor::start(ctx.clone(), tx, CHECK, THRESHOLD).unwrap();

        sleep(minutes(10)).await;
        ctx.record_interaction();

        sleep(Duration::from_secs(29 * 60 + 30)).await;
        assert!(drain(&mut rx).is_empty());
        assert!(ctx.is_authenticated());

        sleep(minutes(2)).await;
        assert_eq!(drain(&mut rx), vec![KioskEvent::SessionExpired]);

        monitor.expired().await;
        monitor.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_leaves_the_session_alone() {
        let ctx = SessionContext::new();
        ctx.authenticate();
        let (tx, mut rx) = events::channel();
        let mut monitor = InactivityMonitor::start(ctx.clone(), tx, CHECK, THRESHOLD).unwrap();

        sleep(minutes(5)).await;
        monitor.stop().await.unwrap();
        sleep(minutes(60)).await;

        assert!(drain(&mut rx).is_empty());
        assert!(ctx.is_authenticated());
        assert_eq!(monitor.phase(), SessionPhase::Active);
    }
}
