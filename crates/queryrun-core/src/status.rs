//! Phase and outcome enums for query resources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a query resource as reported by the control plane.
///
/// Observed only; the client never sets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourcePhase {
    /// Accepted but not yet picked up.
    Pending,
    /// Being executed.
    Running,
    /// Finished; the result field is populated.
    Done,
    /// The control plane gave up on the query.
    Error,
    /// Phase missing or not recognized.
    #[default]
    Unknown,
}

impl ResourcePhase {
    /// Parse a raw phase token.
    ///
    /// Quotes and whitespace left by the read path are ignored. Anything
    /// unrecognized, including an empty token, is `Unknown`.
    pub fn from_token(raw: &str) -> Self {
        let token = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        match token.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "done" => Self::Done,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Returns true if the phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ResourcePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Terminal result of waiting for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The query reached `done`.
    Done,
    /// The control plane reported `error`.
    Failed,
    /// No terminal phase was observed before the deadline.
    TimedOut,
}
