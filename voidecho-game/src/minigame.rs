//! Minigame resolver: the family of short interactive gates that modify a
//! pending battle action's multiplier.
//!
//! The interactive content (timing, pattern-matching, memory) is presentation
//! and lives in the shell; the engine only consumes the boolean outcome and
//! the per-kind timeout rules modeled here.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MINIGAME_BUDGET_DEFAULT, MINIGAME_BUDGET_DODGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MinigameKind {
    Dodge,
    Wires,
    Decrypt,
    Purge,
    Rhythm,
    Balance,
    Link,
    Match,
}

impl MinigameKind {
    pub const ALL: [Self; 8] = [
        Self::Dodge,
        Self::Wires,
        Self::Decrypt,
        Self::Purge,
        Self::Rhythm,
        Self::Balance,
        Self::Link,
        Self::Match,
    ];

    #[must_use]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Countdown budget in seconds before the timeout outcome applies.
    #[must_use]
    pub const fn time_budget_secs(self) -> f32 {
        match self {
            Self::Dodge => MINIGAME_BUDGET_DODGE,
            _ => MINIGAME_BUDGET_DEFAULT,
        }
    }

    /// Outcome when the countdown expires without an explicit result.
    /// Dodge succeeds by default: surviving the timer *is* the challenge.
    /// Every other kind requires an explicit completion to succeed.
    #[must_use]
    pub const fn timeout_outcome(self) -> bool {
        matches!(self, Self::Dodge)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dodge => "DODGE",
            Self::Wires => "WIRES",
            Self::Decrypt => "DECRYPT",
            Self::Purge => "PURGE",
            Self::Rhythm => "RHYTHM",
            Self::Balance => "BALANCE",
            Self::Link => "LINK",
            Self::Match => "MATCH",
        }
    }
}

impl fmt::Display for MinigameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input fed back to a running session by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigameInput {
    /// The player finished the challenge with the given result.
    Completed(bool),
    /// The countdown expired; the kind's default outcome applies.
    TimedOut,
}

/// A started minigame awaiting resolution. One session gates exactly one
/// pending battle action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinigameSession {
    kind: MinigameKind,
    time_budget_secs: f32,
}

impl MinigameSession {
    #[must_use]
    pub const fn start(kind: MinigameKind) -> Self {
        Self {
            kind,
            time_budget_secs: kind.time_budget_secs(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> MinigameKind {
        self.kind
    }

    #[must_use]
    pub const fn time_budget_secs(&self) -> f32 {
        self.time_budget_secs
    }

    /// Collapses the session into its boolean outcome.
    #[must_use]
    pub const fn resolve(self, input: MinigameInput) -> bool {
        match input {
            MinigameInput::Completed(success) => success,
            MinigameInput::TimedOut => self.kind.timeout_outcome(),
        }
    }
}
