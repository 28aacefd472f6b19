pub mod client;
pub mod logs;
pub mod models;
pub mod roster;
pub mod submitter;

pub use client::{ApiClient, PresenceApi};
pub use logs::LogSummary;
pub use models::{
    EmployeeKey, EmployeeRecord, LogEntry, MarkPresenceResponse, MarkStatus, PresenceMarkResult,
};
pub use roster::{distinct_posts, RosterFilter, RosterRow};
pub use submitter::PresenceSubmitter;
