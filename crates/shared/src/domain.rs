use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseDoorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Door {
    Inner,
    Outer,
}

impl Door {
    pub const ALL: [Door; 2] = [Door::Inner, Door::Outer];

    /// Path of the backend endpoint that unlatches this door.
    pub fn endpoint(self) -> &'static str {
        match self {
            Door::Inner => "/open/innerdoor",
            Door::Outer => "/open/outerdoor",
        }
    }

    /// Identifier of the control bound to this door on the panel page.
    pub fn control_id(self) -> &'static str {
        match self {
            Door::Inner => "innentuere",
            Door::Outer => "aussentuere",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Door::Inner => "inner door",
            Door::Outer => "outer door",
        }
    }
}

impl fmt::Display for Door {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Door::Inner => f.write_str("inner"),
            Door::Outer => f.write_str("outer"),
        }
    }
}

impl FromStr for Door {
    type Err = ParseDoorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "inner" | "i" | "innerdoor" | "innentuere" => Ok(Door::Inner),
            "outer" | "o" | "outerdoor" | "aussentuere" => Ok(Door::Outer),
            _ => Err(ParseDoorError(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}
