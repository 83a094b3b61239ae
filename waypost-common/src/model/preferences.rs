use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Blue,
    Light,
    Dark,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown theme: {0}")]
pub struct InvalidThemeError(String);

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Blue => "blue",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = InvalidThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blue" => Ok(Theme::Blue),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            unknown => Err(InvalidThemeError(unknown.to_owned())),
        }
    }
}

/// Per-browser display preferences. Values that are absent or unreadable
/// fall back to the defaults for the current request.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Preferences {
    pub theme: Theme,
    pub show_details: bool,
}

impl Preferences {
    #[must_use]
    pub fn from_values(theme: Option<&str>, show_details: Option<&str>) -> Self {
        Self {
            theme: theme.and_then(|value| value.parse().ok()).unwrap_or_default(),
            show_details: show_details
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
        }
    }
}
