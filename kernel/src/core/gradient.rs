//! Gradient evaluation: record one observation and decide continue vs terminate.
//!
//! Decisions are successive overrides, later rules winning:
//!
//! 1. insignificant step: `stuck` if the previous entry was also insignificant,
//!    otherwise `converged`
//! 2. significant step: continue (`running`)
//! 3. a `check` entry carrying the pass marker: `success`
//! 4. iteration at or past the ceiling: `limit_reached`
//!
//! Terminal statuses are not absorbing. A later evaluation on a `stuck` or
//! `success` tuple is scored like any other and may move it back to `running`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::types::{GradientEntry, GradientSignals, Significance, Tuple, TupleStatus};

/// Default safety ceiling on evaluations per tuple.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Consecutive insignificant entries that signal stagnation.
const ZERO_GRADIENT_WINDOW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    ZeroGradient,
    Converged,
    InvariantSatisfied,
    MaxIterations { limit: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    Continue { signals: Vec<&'static str> },
    Terminate(TerminationReason),
}

impl Recommendation {
    pub fn status(&self) -> TupleStatus {
        match self {
            Recommendation::Continue { .. } => TupleStatus::Running,
            Recommendation::Terminate(TerminationReason::ZeroGradient) => TupleStatus::Stuck,
            Recommendation::Terminate(TerminationReason::Converged) => TupleStatus::Converged,
            Recommendation::Terminate(TerminationReason::InvariantSatisfied) => {
                TupleStatus::Success
            }
            Recommendation::Terminate(TerminationReason::MaxIterations { .. }) => {
                TupleStatus::LimitReached
            }
        }
    }

    pub fn is_terminate(&self) -> bool {
        matches!(self, Recommendation::Terminate(_))
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Continue { signals } => write!(
                f,
                "CONTINUE - Gradient significant ({}). More progress possible.",
                signals.join(", ")
            ),
            Recommendation::Terminate(TerminationReason::ZeroGradient) => f.write_str(
                "TERMINATE - Zero gradient detected (2+ consecutive insignificant). Converged or stuck.",
            ),
            Recommendation::Terminate(TerminationReason::Converged) => {
                f.write_str("TERMINATE - Gradient insignificant. Task appears converged.")
            }
            Recommendation::Terminate(TerminationReason::InvariantSatisfied) => {
                f.write_str("TERMINATE - Invariant satisfied (check slot contains PASS).")
            }
            Recommendation::Terminate(TerminationReason::MaxIterations { limit }) => write!(
                f,
                "TERMINATE - Max iterations ({limit}) reached. Safety limit."
            ),
        }
    }
}

impl Serialize for Recommendation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of one evaluation, after the tuple has been updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientOutcome {
    pub entry: GradientEntry,
    pub recommendation: Recommendation,
    pub status: TupleStatus,
    pub total_iterations: u32,
    pub significant_count: usize,
}

/// Record `signals` on `tuple`, decide the recommendation, and set its status.
pub fn apply_gradient(
    tuple: &mut Tuple,
    signals: GradientSignals,
    action: Option<String>,
    notes: Option<String>,
    max_iterations: u32,
    now: DateTime<Utc>,
) -> GradientOutcome {
    let overall = signals.significance();
    let entry = GradientEntry {
        iteration: tuple.iteration,
        knowledge: signals.knowledge,
        invariant: signals.invariant,
        evidence: signals.evidence,
        confidence: signals.confidence,
        overall,
        action,
        notes,
    };
    tuple.gradient_history.push(entry.clone());
    tuple.iteration += 1;

    let recommendation = decide(tuple, &signals, max_iterations);
    let status = recommendation.status();
    tuple.status = status;
    tuple.touch(now);

    GradientOutcome {
        entry,
        recommendation,
        status,
        total_iterations: tuple.iteration,
        significant_count: significant_count(&tuple.gradient_history),
    }
}

/// Decide against a tuple whose history already includes the latest entry.
fn decide(tuple: &Tuple, signals: &GradientSignals, max_iterations: u32) -> Recommendation {
    let mut recommendation = match signals.significance() {
        Significance::Insignificant if is_zero_gradient(&tuple.gradient_history) => {
            Recommendation::Terminate(TerminationReason::ZeroGradient)
        }
        Significance::Insignificant => Recommendation::Terminate(TerminationReason::Converged),
        Significance::Significant => Recommendation::Continue {
            signals: signals.fired(),
        },
    };

    if tuple.check_passes() {
        recommendation = Recommendation::Terminate(TerminationReason::InvariantSatisfied);
    }

    if tuple.iteration >= max_iterations {
        recommendation = Recommendation::Terminate(TerminationReason::MaxIterations {
            limit: max_iterations,
        });
    }

    recommendation
}

fn is_zero_gradient(history: &[GradientEntry]) -> bool {
    history.len() >= ZERO_GRADIENT_WINDOW
        && history[history.len() - ZERO_GRADIENT_WINDOW..]
            .iter()
            .all(|entry| entry.overall == Significance::Insignificant)
}

pub fn significant_count(history: &[GradientEntry]) -> usize {
    history
        .iter()
        .filter(|entry| entry.overall == Significance::Significant)
        .count()
}
