use serde::Serialize;
use tokio::sync::mpsc;

use crate::presence::EmployeeRecord;

/// Everything the kiosk core tells the operator surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum KioskEvent {
    ScanConfirmed { raw_text: String },
    ScanRejected { message: String },
    /// Localized entry/exit strings; an absent time is an empty string.
    PresenceMarked { entry: String, exit: String },
    PresenceFailed { message: String },
    RosterUpdated { employees: Vec<EmployeeRecord> },
    RosterRefreshFailed { message: String },
    SessionExpired,
}

pub type EventSender = mpsc::UnboundedSender<KioskEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<KioskEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Fire and forget; a closed surface is not an error for the core.
pub fn emit(events: &EventSender, event: KioskEvent) {
    let _ = events.send(event);
}
