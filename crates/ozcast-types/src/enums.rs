//! Enumeration types for the Ozcast forecast core.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An ozone severity category.
///
/// Categories are ordered from least to most severe. The ordering is
/// meaningful: `Background < Moderate < Elevated < Extreme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Category {
    /// Clean-air background concentrations.
    Background,
    /// Moderately raised concentrations.
    Moderate,
    /// Elevated concentrations approaching exceedance.
    Elevated,
    /// Extreme concentrations well above the exceedance threshold.
    Extreme,
}

impl Category {
    /// All categories in severity order.
    pub const ALL: [Self; 4] = [Self::Background, Self::Moderate, Self::Elevated, Self::Extreme];

    /// Lowercase label used in configuration files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Moderate => "moderate",
            Self::Elevated => "elevated",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_ordered_by_severity() {
        assert!(Category::Background < Category::Moderate);
        assert!(Category::Moderate < Category::Elevated);
        assert!(Category::Elevated < Category::Extreme);
    }

    #[test]
    fn label_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        assert!("severe".parse::<Category>().is_err());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Category::Extreme).unwrap();
        assert_eq!(json, "\"extreme\"");
    }
}
