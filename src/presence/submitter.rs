use std::sync::Arc;

use tokio::time::{self, Duration};

use crate::{
    clock::TimezoneOffset,
    error::{ApiError, ScanError},
    events::{emit, EventSender, KioskEvent},
    identity::OpaqueId,
};

use super::{client::PresenceApi, models::PresenceMarkResult};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const FALLBACK_ERROR_MESSAGE: &str = "unknown response from attendance service";

/// Turns one confirmed identity into one presence mark.
///
/// No retries and no queueing: overlapping scans each get their own call.
#[derive(Clone)]
pub struct PresenceSubmitter {
    api: Arc<dyn PresenceApi>,
    events: EventSender,
    settle_delay: Duration,
}

impl PresenceSubmitter {
    pub fn new(api: Arc<dyn PresenceApi>, events: EventSender, settle_delay: Duration) -> Self {
        Self {
            api,
            events,
            settle_delay,
        }
    }

    /// Exactly one network call. On success a single roster refresh is
    /// scheduled after the settling delay.
    pub async fn submit(&self, id: &OpaqueId, timezone: TimezoneOffset) -> PresenceMarkResult {
        let response = match self.api.mark_presence(id, &timezone.iana_name()).await {
            Ok(response) => response,
            Err(ApiError::Transport(err)) => {
                log_warn!("presence submission failed in transit: {err}");
                return PresenceMarkResult::failed(ScanError::NetworkFailure(err.to_string()));
            }
            Err(err) => {
                log_warn!("presence submission got an unusable answer: {err}");
                return PresenceMarkResult::failed(ScanError::ApplicationError(
                    FALLBACK_ERROR_MESSAGE.to_string(),
                ));
            }
        };

        if !response.is_ok() {
            let message = response
                .message
                .or(response.detail)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
            log_info!("presence mark refused: {message}");
            return PresenceMarkResult::failed(ScanError::ApplicationError(message));
        }

        log_info!("presence mark recorded for {id}");
        self.schedule_roster_refresh();
        PresenceMarkResult::marked(response.entry_time, response.exit_time)
    }

    /// The service needs a moment before a re-read reflects the new mark.
    fn schedule_roster_refresh(&self) {
        let api = self.api.clone();
        let events = self.events.clone();
        let settle_delay = self.settle_delay;

        tokio::spawn(async move {
            time::sleep(settle_delay).await;
            match api.fetch_roster().await {
                Ok(employees) => emit(&events, KioskEvent::RosterUpdated { employees }),
                Err(err) => {
                    log_error!("roster refresh failed: {err}");
                    emit(
                        &events,
                        KioskEvent::RosterRefreshFailed {
                            message: err.to_string(),
                        },
                    );
                }
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{events, identity::hash_identity, presence::models::MarkPresenceResponse};
    use crate::presence::EmployeeRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::sleep;

    /// Scripted backend that records every call.
    pub(crate) struct FakeApi {
        pub mark_response: Mutex<Option<Result<MarkPresenceResponse, ApiError>>>,
        pub marks: Mutex<Vec<(String, String)>>,
        pub roster_fetches: Mutex<usize>,
    }

    impl FakeApi {
        pub(crate) fn answering(response: Result<MarkPresenceResponse, ApiError>) -> Arc<Self> {
            Arc::new(Self {
                mark_response: Mutex::new(Some(response)),
                marks: Mutex::new(Vec::new()),
                roster_fetches: Mutex::new(0),
            })
        }

        pub(crate) fn ok(entry: Option<&str>, exit: Option<&str>) -> Arc<Self> {
            Self::answering(Ok(MarkPresenceResponse {
                status: "ok".into(),
                entry_time: entry.map(str::to_string),
                exit_time: exit.map(str::to_string),
                ..Default::default()
            }))
        }

        pub(crate) fn mark_count(&self) -> usize {
            self.marks.lock().unwrap().len()
        }

        pub(crate) fn roster_count(&self) -> usize {
            *self.roster_fetches.lock().unwrap()
        }
    }

    #[async_trait]
    impl PresenceApi for FakeApi {
        async fn mark_presence(
            &self,
            id: &OpaqueId,
            timezone: &str,
        ) -> Result<MarkPresenceResponse, ApiError> {
            self.marks
                .lock()
                .unwrap()
                .push((id.to_string(), timezone.to_string()));
            self.mark_response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(MarkPresenceResponse::default()))
        }

        async fn fetch_roster(&self) -> Result<Vec<EmployeeRecord>, ApiError> {
            *self.roster_fetches.lock().unwrap() += 1;
            Ok(Vec::new())
        }
    }

    pub(crate) async fn transport_error() -> ApiError {
        let err = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        ApiError::Transport(err)
    }

    fn submitter(api: Arc<FakeApi>) -> (PresenceSubmitter, events::EventReceiver) {
        let (tx, rx) = events::channel();
        (
            PresenceSubmitter::new(api, tx, Duration::from_millis(500)),
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn success_refreshes_the_roster_once_after_settling() {
        let api = FakeApi::ok(Some("2024-01-01 08:00:00"), None);
        let (submitter, mut rx) = submitter(api.clone());
        let id = hash_identity("123");

        let result = submitter.submit(&id, TimezoneOffset::default()).await;

        assert!(result.is_ok());
        assert_eq!(result.entry_time.as_deref(), Some("2024-01-01 08:00:00"));
        assert_eq!(result.exit_time, None);
        assert_eq!(
            api.marks.lock().unwrap().as_slice(),
            &[(id.to_string(), "Etc/GMT-3".to_string())]
        );

        sleep(Duration::from_millis(499)).await;
        assert_eq!(api.roster_count(), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(api.roster_count(), 1);
        assert_eq!(
            rx.recv().await,
            Some(KioskEvent::RosterUpdated { employees: vec![] })
        );

        sleep(Duration::from_secs(5)).await;
        assert_eq!(api.roster_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_surfaces_server_message_without_refresh() {
        let api = FakeApi::answering(Ok(MarkPresenceResponse {
            status: "error".into(),
            message: Some("already marked".into()),
            ..Default::default()
        }));
        let (submitter, _rx) = submitter(api.clone());

        let result = submitter
            .submit(&hash_identity("123"), TimezoneOffset::default())
            .await;

        assert!(!result.is_ok());
        assert_eq!(result.message.as_deref(), Some("already marked"));
        assert_eq!(
            result.failure,
            Some(ScanError::ApplicationError("already marked".into()))
        );

        sleep(Duration::from_secs(5)).await;
        assert_eq!(api.roster_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_without_message_uses_fallback() {
        let api = FakeApi::answering(Ok(MarkPresenceResponse {
            status: "error".into(),
            ..Default::default()
        }));
        let (submitter, _rx) = submitter(api);

        let result = submitter
            .submit(&hash_identity("9"), TimezoneOffset::default())
            .await;
        assert_eq!(result.message.as_deref(), Some(FALLBACK_ERROR_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_is_a_network_error() {
        let api = FakeApi::answering(Err(transport_error().await));
        let (submitter, _rx) = submitter(api.clone());

        let result = submitter
            .submit(&hash_identity("9"), TimezoneOffset::new(2).unwrap())
            .await;

        assert!(matches!(result.failure, Some(ScanError::NetworkFailure(_))));
        assert!(result
            .message
            .as_deref()
            .unwrap()
            .starts_with("network error:"));
        assert_eq!(api.mark_count(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(api.roster_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_error_status_uses_fallback() {
        let api = FakeApi::answering(Err(ApiError::Status {
            status: 502,
            body: "<html>bad gateway</html>".into(),
        }));
        let (submitter, _rx) = submitter(api);

        let result = submitter
            .submit(&hash_identity("9"), TimezoneOffset::default())
            .await;
        assert_eq!(
            result.failure,
            Some(ScanError::ApplicationError(FALLBACK_ERROR_MESSAGE.into()))
        );
    }
}
