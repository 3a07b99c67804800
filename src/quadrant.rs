//! Quadrant classification for the Eisenhower matrix.
//!
//! The quadrant of a task is never stored. It is always derived from the two
//! persisted flags through [`classify`], and a target quadrant is turned back
//! into flags through [`flags_for`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four priority buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    /// Urgent and important.
    #[serde(rename = "1")]
    DoFirst,
    /// Important, not urgent.
    #[serde(rename = "2")]
    Schedule,
    /// Urgent, not important.
    #[serde(rename = "3")]
    Delegate,
    /// Neither urgent nor important.
    #[serde(rename = "4")]
    Eliminate,
}

impl Quadrant {
    /// All quadrants in display order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::DoFirst,
        Quadrant::Schedule,
        Quadrant::Delegate,
        Quadrant::Eliminate,
    ];

    /// Stable wire id ("1".."4").
    pub fn id(self) -> &'static str {
        match self {
            Quadrant::DoFirst => "1",
            Quadrant::Schedule => "2",
            Quadrant::Delegate => "3",
            Quadrant::Eliminate => "4",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Quadrant::DoFirst => "Do First",
            Quadrant::Schedule => "Schedule",
            Quadrant::Delegate => "Delegate",
            Quadrant::Eliminate => "Eliminate",
        }
    }

    /// Drop-container id used by drag gestures (`quadrant-N`).
    pub fn container_id(self) -> String {
        format!("{}{}", CONTAINER_PREFIX, self.id())
    }

    /// Parse a drop-container id. Returns `None` for anything that is not a
    /// quadrant container (for example a task id).
    pub fn from_container_id(id: &str) -> Option<Self> {
        id.strip_prefix(CONTAINER_PREFIX)
            .and_then(|rest| rest.parse().ok())
    }

    /// The persisted flags for this quadrant.
    pub fn flags(self) -> (bool, bool) {
        flags_for(self)
    }
}

/// Prefix of quadrant drop-container ids.
pub const CONTAINER_PREFIX: &str = "quadrant-";

/// Map the two priority flags to their quadrant.
pub fn classify(is_urgent: bool, is_important: bool) -> Quadrant {
    match (is_urgent, is_important) {
        (true, true) => Quadrant::DoFirst,
        (false, true) => Quadrant::Schedule,
        (true, false) => Quadrant::Delegate,
        (false, false) => Quadrant::Eliminate,
    }
}

/// Inverse of [`classify`]: `(is_urgent, is_important)` for a quadrant.
pub fn flags_for(quadrant: Quadrant) -> (bool, bool) {
    match quadrant {
        Quadrant::DoFirst => (true, true),
        Quadrant::Schedule => (false, true),
        Quadrant::Delegate => (true, false),
        Quadrant::Eliminate => (false, false),
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} ({})", self.id(), self.label())
    }
}

/// Error returned when a string does not name a quadrant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quadrant: {0}")]
pub struct ParseQuadrantError(pub String);

impl FromStr for Quadrant {
    type Err = ParseQuadrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let key = normalized
            .strip_prefix(CONTAINER_PREFIX)
            .or_else(|| normalized.strip_prefix('q'))
            .unwrap_or(&normalized);
        match key {
            "1" | "do-first" | "do_first" | "dofirst" => Ok(Quadrant::DoFirst),
            "2" | "schedule" => Ok(Quadrant::Schedule),
            "3" | "delegate" => Ok(Quadrant::Delegate),
            "4" | "eliminate" => Ok(Quadrant::Eliminate),
            _ => Err(ParseQuadrantError(s.to_string())),
        }
    }
}
