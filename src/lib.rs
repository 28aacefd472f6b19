pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod pipeline;
pub mod presence;
pub mod scan;
pub mod session;
pub mod settings;
pub mod utils;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use clock::{ClockController, TimezoneOffset};
use config::KioskConfig;
use events::{EventReceiver, KioskEvent};
use identity::hash_identity;
use pipeline::{join_pipeline, ScanPipeline};
use presence::{ApiClient, LogSummary, PresenceApi, PresenceSubmitter, RosterRow};
use scan::ScanDebouncer;
use session::{InactivityMonitor, SessionContext};
use settings::SettingsStore;

/// Everything one operator session keeps alive.
struct KioskState {
    api: ApiClient,
    clock: ClockController,
    session: SessionContext,
    settings: SettingsStore,
}

/// One stdin line from the decoder bridge.
#[derive(Debug, PartialEq, Eq)]
enum InputLine {
    Decoded(String),
    Noise,
    SelectTimezone(String),
    ShowRoster,
    ShowLogs(String),
}

impl InputLine {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return InputLine::Noise;
        }

        match trimmed.split_once(' ').unwrap_or((trimmed, "")) {
            (":tz", arg) => InputLine::SelectTimezone(arg.trim().to_string()),
            (":roster", _) => InputLine::ShowRoster,
            (":logs", arg) => InputLine::ShowLogs(arg.trim().to_string()),
            _ => InputLine::Decoded(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

pub fn run() -> Result<()> {
    let config = KioskConfig::from_env()?;
    utils::logging::init(config.debug);

    info!("Presence kiosk starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(run_kiosk(config))
}

async fn run_kiosk(config: KioskConfig) -> Result<()> {
    let settings = SettingsStore::new(config.settings_path.clone())?;
    let api = ApiClient::new(&config.api_base, config.http_timeout)?;
    let session = SessionContext::new();

    let password = config.password.clone().unwrap_or_default();
    if !api
        .validate_password(&password)
        .await
        .context("login request failed")?
    {
        bail!("authentication refused; set KIOSK_PASSWORD");
    }
    session.authenticate();
    let session_id = settings.record_session_start(api.base(), Utc::now())?;
    info!("Session {session_id} opened against {}", api.base());

    let timing = config.timing.clone();
    let (events_tx, events_rx) = events::channel();
    let printer = tokio::spawn(print_events(events_rx));

    let clock = ClockController::new(settings.timezone(), timing.clock_tick);
    clock.start().await;

    let submitter = PresenceSubmitter::new(
        Arc::new(api.clone()),
        events_tx.clone(),
        timing.settle_delay,
    );
    let (confirmed_tx, confirmed_rx) = mpsc::unbounded_channel();
    let cancel_token = CancellationToken::new();
    let pipeline = ScanPipeline::new(submitter, clock.clone(), events_tx.clone())
        .spawn(confirmed_rx, cancel_token.clone());

    let mut debouncer = ScanDebouncer::start(timing.debounce_window, confirmed_tx);
    let mut monitor = InactivityMonitor::start(
        session.clone(),
        events_tx.clone(),
        timing.inactivity_check,
        timing.inactivity_threshold,
    )?;
    drop(events_tx);

    let state = KioskState {
        api,
        clock,
        session,
        settings,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = monitor.expired() => {
                warn!("Session expired after inactivity; re-authentication required");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read decoder input")? else {
                    info!("Decoder input closed");
                    break;
                };
                state.session.record_interaction();
                if let Err(err) = handle_input(&state, &debouncer, InputLine::parse(&line)).await {
                    error!("{err:#}");
                }
            }
        }
    }

    debouncer.stop().await?;
    monitor.stop().await?;
    state.clock.stop().await;
    cancel_token.cancel();
    join_pipeline(pipeline).await?;
    state.settings.clear_session()?;
    state.session.terminate();

    printer.await.context("event printer failed to join")?;
    Ok(())
}

async fn handle_input(state: &KioskState, debouncer: &ScanDebouncer, input: InputLine) -> Result<()> {
    match input {
        InputLine::Decoded(text) => debouncer.on_decode(text),
        InputLine::Noise => debouncer.on_decode_failure("empty frame"),
        InputLine::SelectTimezone(arg) => {
            let hours: i8 = arg
                .parse()
                .with_context(|| format!("not a timezone offset: {arg:?}"))?;
            let timezone = TimezoneOffset::new(hours)?;
            state.clock.set_timezone(timezone).await;
            state.settings.set_timezone(timezone)?;
            print_json(&state.clock.current())
        }
        InputLine::ShowRoster => {
            let timezone = state.clock.timezone().await;
            let today = Utc::now().date_naive();
            for record in state.api.fetch_roster().await? {
                print_json(&RosterRow::from_record(&record, today, timezone))?;
            }
            Ok(())
        }
        InputLine::ShowLogs(matricule) => {
            let entries = state.api.fetch_logs(&hash_identity(&matricule)).await?;
            print_json(&LogSummary::from_entries(&entries))
        }
    }
}

async fn print_events(mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        if let Err(err) = print_json(&event) {
            error!("failed to write event: {err:#}");
        }
        if let Some(notice) = shutdown_notice(&event) {
            info!("{notice}");
        }
    }
}

/// Events after which the process winds down instead of continuing.
fn shutdown_notice(event: &KioskEvent) -> Option<&'static str> {
    match event {
        KioskEvent::SessionExpired => {
            Some("Session expired; exiting. Restart the kiosk to authenticate again")
        }
        _ => None,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("failed to serialize output")?;
    println!("{line}");
    Ok(())
}
