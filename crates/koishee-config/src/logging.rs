//! Logging knobs shared by the watcher binary and its tests.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Filter applied when neither configuration nor `RUST_LOG`-style input
/// narrows the output.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// How watcher diagnostics are rendered on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line text for operators tailing a terminal.
    Compact,
}

/// Error returned when `--log-format` names an unknown format.
pub type LogFormatParseError = strum::ParseError;

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

pub(crate) const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
