//! Log output settings for the Ronin tools.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::mode::RunMode;

/// How `ronin` renders its diagnostic log on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for runs collected by CI.
    Json,
    /// Single-line text for a developer watching `serve` or `test`.
    #[default]
    Compact,
}

impl LogFormat {
    /// Returns `true` for formats meant to be parsed rather than read.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Everything telemetry needs to know about a run.
///
/// The mode travels with the filter so every event of a `test` run can be
/// told apart from a `serve` run against the development database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    filter: String,
    format: LogFormat,
    mode: RunMode,
}

impl LogSettings {
    /// Bundles the filter expression, output format and run mode.
    #[must_use]
    pub fn new(filter: impl Into<String>, format: LogFormat, mode: RunMode) -> Self {
        Self {
            filter: filter.into(),
            format,
            mode,
        }
    }

    /// Tracing `EnvFilter` expression.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    /// Mode the run was started in.
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("json", LogFormat::Json, true)]
    #[case("Compact", LogFormat::Compact, false)]
    fn formats_parse_and_classify(
        #[case] raw: &str,
        #[case] expected: LogFormat,
        #[case] structured: bool,
    ) {
        let format = raw.parse::<LogFormat>().expect("parse format");
        assert_eq!(format, expected);
        assert_eq!(format.is_structured(), structured);
    }

    #[test]
    fn settings_keep_the_run_mode() {
        let settings = LogSettings::new("ronin_dev=debug", LogFormat::Json, RunMode::Test);
        assert_eq!(settings.filter(), "ronin_dev=debug");
        assert_eq!(settings.format(), LogFormat::Json);
        assert_eq!(settings.mode(), RunMode::Test);
    }
}
