//! Intent-to-primitive routing.
//!
//! Routing is an ordered list of (pattern, primitive) rules evaluated
//! first-match-wins. Rule order is part of the contract: callers rely on the
//! same intent always landing on the same primitive.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::core::types::Tuple;

/// Primitive chosen when no rule matches.
pub const FALLBACK_PRIMITIVE: &str = "explore";
const FALLBACK_RATIONALE: &str = "No specific intent detected; defaulting to exploration";
const UNDERSTAND_PRIMITIVE: &str = "understand";

/// Catalog entry describing one reasoning primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Tuple slot the primitive feeds.
    #[serde(default = "default_slot")]
    pub slot: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub description: String,
    /// How the caller can tell the step succeeded locally.
    #[serde(default)]
    pub local_check: String,
    #[serde(default)]
    pub execution_hints: Map<String, Value>,
}

fn default_slot() -> String {
    "constraints".to_string()
}

fn default_mode() -> String {
    "unknown".to_string()
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            slot: default_slot(),
            mode: default_mode(),
            description: String::new(),
            local_check: String::new(),
            execution_hints: Map::new(),
        }
    }
}

/// Primitive metadata keyed by primitive name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    primitives: HashMap<String, Primitive>,
}

impl Catalog {
    pub fn new(primitives: HashMap<String, Primitive>) -> Self {
        Self { primitives }
    }

    pub fn get(&self, name: &str) -> Option<&Primitive> {
        self.primitives.get(name)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Built-in catalog used when no external metadata is available.
    pub fn embedded() -> Self {
        #[rustfmt::skip]
        let entries = [
            ("explore", "constraints", "divergent_exploration", "Systematically explore solution space", "New options or insights discovered", json!({"parallelizable": true, "max_agents": 5, "model_preference": "haiku"})),
            ("understand", "invariant", "mental_model_building", "Build understanding of concepts", "Mental model articulated clearly", json!({"parallelizable": false})),
            ("decompose", "invariant", "structural_breakdown", "Break problem into sub-components", "Components identified with dependencies", json!({"parallelizable": false})),
            ("what-if", "strategy", "comparative_analysis", "Compare alternatives and tradeoffs", "Alternatives ranked with rationale", json!({"parallelizable": true, "max_agents": 3})),
            ("validate", "check", "verification", "Verify claims with evidence", "Evidence level documented (Layer 1-4)", json!({"parallelizable": true, "max_agents": 3})),
            ("observe", "constraints", "observation", "Capture observations without interpretation", "Observations recorded factually", json!({"parallelizable": false})),
            ("trace", "constraints", "causal_analysis", "Follow causal chains forward or backward", "Causal chain documented", json!({"parallelizable": false})),
            ("hypothesis", "constraints", "hypothesis_generation", "Generate testable explanations", "Hypotheses are testable and falsifiable", json!({"parallelizable": true, "max_agents": 3})),
            ("consolidate", "constraints", "knowledge_synthesis", "Synthesize scattered knowledge", "Knowledge organized and accessible", json!({"parallelizable": false})),
            ("specify", "invariant", "formal_specification", "Create formal specification", "Spec is precise and testable", json!({"parallelizable": false})),
            ("design", "strategy", "solution_design", "Design a solution approach", "Design addresses constraints and invariant", json!({"parallelizable": false})),
            ("invariant", "check", "invariant_identification", "Identify behavioral invariants", "Invariants are verifiable", json!({"parallelizable": false})),
            ("reconcile", "check", "convergence", "Converge violations back to compliance", "Delta reduced toward zero", json!({"parallelizable": false})),
            ("reflect", "check", "metacognitive_analysis", "Analyze reasoning progress", "Stuck patterns identified or progress confirmed", json!({"parallelizable": false})),
            ("implement", "constraints", "artifact_creation", "Write code or create artifacts", "Artifacts created and functional", json!({"parallelizable": false})),
        ];

        let primitives = entries
            .into_iter()
            .map(|(name, slot, mode, description, local_check, hints)| {
                let execution_hints = match hints {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                (
                    name.to_string(),
                    Primitive {
                        slot: slot.to_string(),
                        mode: mode.to_string(),
                        description: description.to_string(),
                        local_check: local_check.to_string(),
                        execution_hints,
                    },
                )
            })
            .collect();
        Self { primitives }
    }
}

/// One routing rule: any pattern alternative matching selects `primitive`.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    pattern: Regex,
    pub primitive: &'static str,
    pub rationale: &'static str,
}

impl RoutingRule {
    /// Compile a case-insensitive rule from a regex alternation.
    pub fn new(pattern: &str, primitive: &'static str, rationale: &'static str) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("compile routing pattern for {primitive}"))?;
        Ok(Self {
            pattern,
            primitive,
            rationale,
        })
    }

    pub fn matches(&self, intent: &str) -> bool {
        self.pattern.is_match(intent)
    }
}

#[rustfmt::skip]
const RULE_TABLE: &[(&str, &str, &str)] = &[
    ("explor|search|find|discover|option|alternative", "explore", "Task requires divergent exploration of solution space"),
    ("understand|explain|how|what is|mental model|learn", "understand", "Task requires building understanding before acting"),
    ("decompos|break down|split|component|subtask", "decompose", "Task requires breaking into smaller parts"),
    ("compar|tradeoff|vs|versus|which|what.if|evaluat", "what-if", "Task requires comparing alternatives"),
    ("validat|verify|check|test|correct|prove", "validate", "Task requires verification of claims"),
    ("observ|record|capture|log|what happened", "observe", "Task requires capturing observations without interpretation"),
    ("trac|why|cause|because|root cause|debug", "trace", "Task requires following causal chains"),
    ("hypothes|theory|might be|could be|suspect", "hypothesis", "Task requires generating testable explanations"),
    ("consolidat|synthesiz|summariz|gather", "consolidate", "Task requires synthesizing scattered knowledge"),
    ("specif|define|contract|requirement|formal", "specify", "Task requires creating formal specification"),
    ("design|architect|plan|structur", "design", "Task requires designing a solution approach"),
    ("invariant|must be true|constraint|rule", "invariant", "Task requires identifying behavioral invariants"),
    ("reconcil|fix|converge|align|drift", "reconcile", "Task requires converging violations back to compliance"),
    ("reflect|meta|stuck|pattern|approach", "reflect", "Task requires metacognitive analysis of progress"),
    ("implement|build|create|write|code|add", "implement", "Task requires writing code or creating artifacts"),
];

static ROUTING_RULES: LazyLock<Vec<RoutingRule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .map(|&(pattern, primitive, rationale)| {
            RoutingRule::new(pattern, primitive, rationale).expect("routing table should compile")
        })
        .collect()
});

/// The built-in ordered routing rules.
pub fn default_rules() -> &'static [RoutingRule] {
    &ROUTING_RULES
}

/// First rule (in order) with a pattern matching `intent`.
pub fn first_match<'a>(rules: &'a [RoutingRule], intent: &str) -> Option<&'a RoutingRule> {
    rules.iter().find(|rule| rule.matches(intent))
}

/// Advisory note derived from tuple state.
///
/// Checks run in order and each applicable one replaces the previous note, so
/// only the last applicable note survives.
pub fn context_note(tuple: &Tuple, primitive: &str) -> Option<&'static str> {
    let mut note = None;
    if tuple.check_passes() {
        note = Some("Tuple check has PASS entries - consider if invariant is satisfied.");
    }
    if tuple.constraints.is_empty() {
        note = Some("Tuple constraints empty - exploration recommended first.");
    }
    if tuple.invariant.is_empty() && primitive != UNDERSTAND_PRIMITIVE {
        note = Some("No invariant defined yet - consider using 'understand' or 'decompose' first.");
    }
    note
}

/// Routing decision plus the metadata a caller needs to execute it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub primitive: String,
    pub slot: String,
    pub mode: String,
    pub description: String,
    pub local_check: String,
    pub execution_hints: Map<String, Value>,
    pub rationale: String,
}

/// Route `intent` with the given rules, annotating from `tuple` when present.
pub fn route_with_rules(
    rules: &[RoutingRule],
    catalog: &Catalog,
    intent: &str,
    tuple: Option<&Tuple>,
) -> RouteResult {
    let (primitive, rationale) = match first_match(rules, intent) {
        Some(rule) => (rule.primitive, rule.rationale),
        None => (FALLBACK_PRIMITIVE, FALLBACK_RATIONALE),
    };

    let mut rationale = rationale.to_string();
    if let Some(note) = tuple.and_then(|t| context_note(t, primitive)) {
        rationale.push_str(" Note: ");
        rationale.push_str(note);
    }

    let def = catalog.get(primitive).cloned().unwrap_or_default();
    RouteResult {
        primitive: primitive.to_string(),
        slot: def.slot,
        mode: def.mode,
        description: def.description,
        local_check: def.local_check,
        execution_hints: def.execution_hints,
        rationale,
    }
}

pub fn route(catalog: &Catalog, intent: &str, tuple: Option<&Tuple>) -> RouteResult {
    route_with_rules(default_rules(), catalog, intent, tuple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tuple(constraints: &[&str], invariant: &[&str], check: &[&str]) -> Tuple {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut t = Tuple::new(
            "run-r".to_string(),
            "task".to_string(),
            strings(constraints),
            strings(invariant),
            Utc::now(),
        );
        t.check = strings(check);
        t
    }

    #[test]
    fn embedded_catalog_covers_every_rule() {
        let catalog = Catalog::embedded();
        assert_eq!(catalog.len(), RULE_TABLE.len());
        for rule in default_rules() {
            assert!(catalog.get(rule.primitive).is_some(), "{}", rule.primitive);
        }
    }

    #[test]
    fn routes_are_deterministic() {
        let catalog = Catalog::embedded();
        let first = route(&catalog, "trace why the build fails", None);
        for _ in 0..5 {
            assert_eq!(route(&catalog, "trace why the build fails", None), first);
        }
        assert_eq!(first.primitive, "trace");
    }

    #[test]
    fn verification_intent_hits_validate_before_later_rules() {
        let catalog = Catalog::embedded();
        // "design" would also match the later design rule.
        let result = route(&catalog, "verify the design is correct", None);
        assert_eq!(result.primitive, "validate");
        assert_eq!(result.slot, "check");
        assert_eq!(result.rationale, "Task requires verification of claims");
    }

    #[test]
    fn matching_ignores_case() {
        let catalog = Catalog::embedded();
        assert_eq!(route(&catalog, "EXPLORE Login Options", None).primitive, "explore");
    }

    #[test]
    fn rule_order_decides_between_overlapping_rules() {
        let design = RoutingRule::new("design", "design", "design first").expect("rule");
        let validate = RoutingRule::new("verify", "validate", "validate first").expect("rule");
        let catalog = Catalog::embedded();
        let intent = "verify the design";

        let a = route_with_rules(&[validate.clone(), design.clone()], &catalog, intent, None);
        let b = route_with_rules(&[design, validate], &catalog, intent, None);
        assert_eq!(a.primitive, "validate");
        assert_eq!(b.primitive, "design");
    }

    #[test]
    fn unmatched_intent_falls_back_to_explore() {
        let catalog = Catalog::embedded();
        let result = route(&catalog, "zzz", None);
        assert_eq!(result.primitive, FALLBACK_PRIMITIVE);
        assert_eq!(result.rationale, FALLBACK_RATIONALE);
        assert_eq!(result.mode, "divergent_exploration");
    }

    #[test]
    fn primitive_missing_from_catalog_gets_defaults() {
        let result = route(&Catalog::default(), "explore options", None);
        assert_eq!(result.primitive, "explore");
        assert_eq!(result.slot, "constraints");
        assert_eq!(result.mode, "unknown");
        assert!(result.execution_hints.is_empty());
    }

    #[test]
    fn later_context_notes_overwrite_earlier_ones() {
        // Passing check, empty constraints, empty invariant: the invariant note wins.
        let t = tuple(&[], &[], &["PASS"]);
        assert_eq!(
            context_note(&t, "validate"),
            Some("No invariant defined yet - consider using 'understand' or 'decompose' first.")
        );
        // Understanding primitive skips the invariant check, so constraints wins.
        assert_eq!(
            context_note(&t, "understand"),
            Some("Tuple constraints empty - exploration recommended first.")
        );
        let t = tuple(&["c"], &["i"], &["pass"]);
        assert_eq!(
            context_note(&t, "validate"),
            Some("Tuple check has PASS entries - consider if invariant is satisfied.")
        );
        let t = tuple(&["c"], &["i"], &[]);
        assert_eq!(context_note(&t, "validate"), None);
    }

    #[test]
    fn note_is_appended_to_rationale() {
        let catalog = Catalog::embedded();
        let t = tuple(&[], &["i"], &[]);
        let result = route(&catalog, "explore login options", Some(&t));
        assert_eq!(
            result.rationale,
            "Task requires divergent exploration of solution space Note: Tuple constraints empty - exploration recommended first."
        );
    }
}
