use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which part of a recurring series an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeriesModificationMode {
    /// The whole series (or a plain, non-recurring event).
    #[default]
    All,
    /// The selected occurrence and every later one.
    Future,
    /// Only the selected occurrence.
    Single,
}

impl SeriesModificationMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Future => "FUTURE",
            Self::Single => "SINGLE",
        }
    }
}

impl std::fmt::Display for SeriesModificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesModificationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "FUTURE" => Ok(Self::Future),
            "SINGLE" => Ok(Self::Single),
            other => Err(CoreError::InvalidInput(format!(
                "unknown series modification mode: {other}"
            ))),
        }
    }
}
