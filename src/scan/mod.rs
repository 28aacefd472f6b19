pub mod debouncer;
pub mod state;

pub use debouncer::{debounce_loop, ScanDebouncer};
pub use state::{ConfirmedScan, DebounceState, DecodeEvent, DecodeFrame, DecodeOutcome};
