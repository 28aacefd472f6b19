pub mod controller;
pub mod face;
pub mod timezone;

pub use controller::ClockController;
pub use face::{format_instant, ClockFace};
pub use timezone::{selectable_timezones, TimezoneOffset, TimezoneOption};
