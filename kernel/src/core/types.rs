//! Shared deterministic types for the Thinking Tuple protocol.
//!
//! The serialized shape of [`Tuple`] is the on-disk snapshot format, so field
//! names and enum spellings are part of the contract with earlier sessions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// One of the five named ordered text collections on a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Constraints,
    Invariant,
    Principles,
    Strategy,
    Check,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::Constraints,
        Slot::Invariant,
        Slot::Principles,
        Slot::Strategy,
        Slot::Check,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Constraints => "constraints",
            Slot::Invariant => "invariant",
            Slot::Principles => "principles",
            Slot::Strategy => "strategy",
            Slot::Check => "check",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Slot::ALL.iter().map(|slot| slot.as_str()).collect();
                KernelError::InvalidArgument(format!(
                    "Invalid slot '{s}'. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

/// How a slot update treats the existing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotAction {
    Append,
    Replace,
    Clear,
}

impl SlotAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotAction::Append => "append",
            SlotAction::Replace => "replace",
            SlotAction::Clear => "clear",
        }
    }
}

impl fmt::Display for SlotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotAction {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(SlotAction::Append),
            "replace" => Ok(SlotAction::Replace),
            "clear" => Ok(SlotAction::Clear),
            other => Err(KernelError::InvalidArgument(format!(
                "Invalid action '{other}'. Must be one of: append, replace, clear"
            ))),
        }
    }
}

/// Slot content as supplied by callers: a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotContent {
    One(String),
    Many(Vec<String>),
}

impl SlotContent {
    pub fn into_items(self) -> Vec<String> {
        match self {
            SlotContent::One(item) => vec![item],
            SlotContent::Many(items) => items,
        }
    }
}

/// Lifecycle status of a tuple; only the gradient evaluator changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleStatus {
    Running,
    Converged,
    Stuck,
    Success,
    LimitReached,
}

impl TupleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TupleStatus::Running => "running",
            TupleStatus::Converged => "converged",
            TupleStatus::Stuck => "stuck",
            TupleStatus::Success => "success",
            TupleStatus::LimitReached => "limit_reached",
        }
    }
}

impl fmt::Display for TupleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived verdict of one gradient observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Significant,
    Insignificant,
}

/// The four progress signals a caller reports after an iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradientSignals {
    /// New entities, relations or insights were discovered.
    pub knowledge: bool,
    /// The invariant became more precise or testable.
    pub invariant: bool,
    /// Evidence moved up a layer.
    pub evidence: bool,
    /// A hypothesis was confirmed or refuted.
    pub confidence: bool,
}

impl GradientSignals {
    pub fn significance(&self) -> Significance {
        if self.knowledge || self.invariant || self.evidence || self.confidence {
            Significance::Significant
        } else {
            Significance::Insignificant
        }
    }

    /// Names of the signals that fired, in declaration order.
    pub fn fired(&self) -> Vec<&'static str> {
        [
            (self.knowledge, "knowledge"),
            (self.invariant, "invariant"),
            (self.evidence, "evidence"),
            (self.confidence, "confidence"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// One recorded progress observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientEntry {
    /// Tuple iteration this entry belongs to (value before the increment).
    pub iteration: u32,
    pub knowledge: bool,
    pub invariant: bool,
    pub evidence: bool,
    pub confidence: bool,
    pub overall: Significance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A tracked reasoning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    pub id: String,
    pub task: String,
    pub constraints: Vec<String>,
    pub invariant: Vec<String>,
    pub principles: Vec<String>,
    pub strategy: Vec<String>,
    pub check: Vec<String>,
    /// Completed gradient evaluations; always equals `gradient_history.len()`.
    pub iteration: u32,
    pub status: TupleStatus,
    pub gradient_history: Vec<GradientEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_parses_every_defined_name() {
        for slot in Slot::ALL {
            assert_eq!(slot.as_str().parse::<Slot>(), Ok(slot));
        }
    }

    #[test]
    fn unknown_slot_is_invalid_argument() {
        let err = "strategies".parse::<Slot>().unwrap_err();
        assert!(matches!(err, KernelError::InvalidArgument(_)));
        assert!(err.to_string().contains("constraints, invariant, principles, strategy, check"));
    }

    #[test]
    fn unknown_action_is_invalid_argument() {
        let err = "prepend".parse::<SlotAction>().unwrap_err();
        assert!(matches!(err, KernelError::InvalidArgument(_)));
    }

    #[test]
    fn slot_content_accepts_string_or_list() {
        let one: SlotContent = serde_json::from_str("\"a\"").expect("string");
        let many: SlotContent = serde_json::from_str("[\"a\", \"b\"]").expect("list");
        assert_eq!(one.into_items(), vec!["a"]);
        assert_eq!(many.into_items(), vec!["a", "b"]);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TupleStatus::LimitReached).expect("serialize");
        assert_eq!(json, "\"limit_reached\"");
    }

    #[test]
    fn fired_signals_keep_declaration_order() {
        let signals = GradientSignals {
            knowledge: true,
            invariant: false,
            evidence: true,
            confidence: true,
        };
        assert_eq!(signals.fired(), vec!["knowledge", "evidence", "confidence"]);
        assert_eq!(signals.significance(), Significance::Significant);
        assert_eq!(
            GradientSignals::default().significance(),
            Significance::Insignificant
        );
    }
}
