pub mod context;
pub mod monitor;

pub use context::{ActivityState, SessionContext};
pub use monitor::{InactivityMonitor, SessionPhase};
