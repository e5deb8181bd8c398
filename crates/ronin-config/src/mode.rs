use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Deployment mode of a running application.
///
/// The mode selects which database the orchestrator talks to. Test runs
/// always force [`RunMode::Test`] so they never touch development data.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RunMode {
    /// Local development.
    #[default]
    Dev,
    /// Automated unit and UI test runs.
    Test,
    /// Pre-production staging.
    Staging,
    /// Production.
    Prod,
}

impl RunMode {
    /// Name of the database that backs this mode.
    #[must_use]
    pub const fn database_name(self) -> &'static str {
        match self {
            Self::Dev => "devdb",
            Self::Test => "testdb",
            Self::Staging => "stagingdb",
            Self::Prod => "proddb",
        }
    }

    /// Database location relative to the project root.
    #[must_use]
    pub fn database_location(self) -> String {
        format!("runtime/db/{}", self.database_name())
    }
}

/// Errors encountered while parsing a [`RunMode`] from text.
pub type RunModeParseError = strum::ParseError;
