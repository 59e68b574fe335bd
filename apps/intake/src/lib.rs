//! WhatsApp intake service: Graph API history proxy, webhook receiver,
//! in-memory message buffer and the viewer page that polls it.

pub mod config;
pub mod error;
pub mod history;
pub mod http;
mod main_logic;
pub mod messages;
pub mod reqid;
pub mod webhook;

pub use config::{Cli, Command, IntakeConfig};
pub use error::IntakeError;
pub use http::{AppState, build_router};
pub use main_logic::run;

/// Current wall-clock time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
