use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Duration, Instant, MissedTickBehavior},
};

use super::{ClockFace, TimezoneOffset};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

pub type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Keeps a `ClockFace` fresh for the selected timezone.
///
/// Each face is recomputed from the current instant, never accumulated. A
/// timezone change recomputes on the spot and replaces the ticker.
#[derive(Clone)]
pub struct ClockController {
    timezone: Arc<Mutex<TimezoneOffset>>,
    faces: Arc<watch::Sender<ClockFace>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    now: NowFn,
}

impl ClockController {
    pub fn new(timezone: TimezoneOffset, tick_interval: Duration) -> Self {
        Self::with_now(timezone, tick_interval, Arc::new(Utc::now))
    }

    pub fn with_now(timezone: TimezoneOffset, tick_interval: Duration, now: NowFn) -> Self {
        let (faces, _) = watch::channel(ClockFace::compute(now(), timezone));

        Self {
            timezone: Arc::new(Mutex::new(timezone)),
            faces: Arc::new(faces),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            now,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ClockFace> {
        self.faces.subscribe()
    }

    pub fn current(&self) -> ClockFace {
        self.faces.borrow().clone()
    }

    pub async fn timezone(&self) -> TimezoneOffset {
        *self.timezone.lock().await
    }

    pub async fn start(&self) {
        let timezone = self.timezone().await;
        self.restart(timezone).await;
    }

    pub async fn set_timezone(&self, timezone: TimezoneOffset) {
        *self.timezone.lock().await = timezone;
        self.restart(timezone).await;
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn restart(&self, timezone: TimezoneOffset) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        self.faces
            .send_replace(ClockFace::compute((self.now)(), timezone));

        let faces = self.faces.clone();
        let now = self.now.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let face = ClockFace::compute(now(), timezone);
                log_debug!("clock tick {} {}", face.time, face.label);
                faces.send_replace(face);
            }
        });

        *ticker_guard = Some(handle);
    }
}
