//! Briefing renderer for delegated roles.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::roles::RoleProfile;
use crate::core::types::Tuple;

const BRIEFING_TEMPLATE: &str = include_str!("prompts/briefing.md");

/// One guidance document inlined into a briefing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidanceExcerpt {
    pub name: String,
    pub body: String,
}

/// Tuple state shown to a delegate.
#[derive(Debug, Clone, Serialize)]
struct TupleContext<'a> {
    constraints: &'a [String],
    invariant: &'a [String],
    check: &'a [String],
    iteration: u32,
    status: &'static str,
}

impl<'a> TupleContext<'a> {
    fn from_tuple(tuple: &'a Tuple) -> Self {
        Self {
            constraints: &tuple.constraints,
            invariant: &tuple.invariant,
            check: &tuple.check,
            iteration: tuple.iteration,
            status: tuple.status.as_str(),
        }
    }
}

/// All inputs needed to render a briefing.
#[derive(Debug, Clone, Copy)]
pub struct BriefingInputs<'a> {
    pub agent_type: &'a str,
    pub role: &'a RoleProfile,
    pub guidance: &'a [GuidanceExcerpt],
    pub tuple: Option<&'a Tuple>,
    pub task: &'a str,
}

struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("briefing", BRIEFING_TEMPLATE)
            .expect("briefing template should be valid");
        Self { env }
    }

    fn render_briefing(&self, input: &BriefingInputs<'_>) -> Result<String> {
        let template = self.env.get_template("briefing")?;
        let rendered = template.render(context! {
            agent_type => input.agent_type,
            role => input.role,
            guidance => input.guidance,
            tuple => input.tuple.map(TupleContext::from_tuple),
            task => input.task,
        })?;
        Ok(rendered)
    }
}

/// Render the briefing document.
pub fn render_briefing(input: &BriefingInputs<'_>) -> Result<String> {
    PromptEngine::new().render_briefing(input)
}

/// `ceil(chars / chars_per_token)`; a zero divisor is treated as one.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    text.chars().count().div_ceil(chars_per_token.max(1))
}

/// First `limit` characters of `content` followed by `...`.
pub fn excerpt(content: &str, limit: usize) -> String {
    let mut out: String = content.chars().take(limit).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roles::default_role;
    use crate::core::types::TupleStatus;
    use chrono::Utc;

    fn render(tuple: Option<&Tuple>, guidance: &[GuidanceExcerpt]) -> String {
        let role = default_role("researcher").expect("role");
        render_briefing(&BriefingInputs {
            agent_type: "researcher",
            role: &role,
            guidance,
            tuple,
            task: "Map the auth flow",
        })
        .expect("render")
    }

    #[test]
    fn sections_appear_in_stable_order() {
        let mut tuple = Tuple::new(
            "run-1-abcdef".to_string(),
            "task".to_string(),
            vec!["uses sessions".to_string()],
            Vec::new(),
            Utc::now(),
        );
        tuple.status = TupleStatus::Converged;
        let guidance = vec![GuidanceExcerpt {
            name: "progressive-evidence".to_string(),
            body: "Verify through layers...".to_string(),
        }];
        let content = render(Some(&tuple), &guidance);

        let profile = content.find("## Cognitive Profile: researcher").expect("profile");
        let principles = content.find("## Active Principles").expect("principles");
        let context = content.find("## Thinking Tuple Context").expect("context");
        let output = content.find("## Output Format").expect("output");
        let task = content.find("## Task").expect("task");
        assert!(profile < principles);
        assert!(principles < context);
        assert!(context < output);
        assert!(output < task);

        assert!(content.contains("**Role**: Deep research and information gathering specialist"));
        assert!(content.contains("**Focus**: code analysis, pattern recognition, documentation"));
        assert!(content.contains("### progressive-evidence\nVerify through layers..."));
        assert!(content.contains("- uses sessions"));
        assert!(content.contains("(not defined yet)"));
        assert!(content.contains("(no checks yet)"));
        assert!(content.contains("**Iteration**: 0 | **Status**: converged"));
        assert!(content.ends_with("Map the auth flow"));
    }

    #[test]
    fn optional_sections_are_omitted() {
        let content = render(None, &[]);
        assert!(!content.contains("## Active Principles"));
        assert!(!content.contains("## Thinking Tuple Context"));
        assert!(content.contains("evidence_layer: 1-4"));
    }

    #[test]
    fn task_text_is_not_escaped() {
        let role = RoleProfile {
            description: "x".to_string(),
            ..RoleProfile::default()
        };
        let content = render_briefing(&BriefingInputs {
            agent_type: "custom",
            role: &role,
            guidance: &[],
            tuple: None,
            task: "compare <a> & \"b\"",
        })
        .expect("render");
        assert!(content.ends_with("compare <a> & \"b\""));
        assert!(!content.contains("**Focus**"));
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens("", 4), 0);
        assert_eq!(estimate_tokens("abcd", 4), 1);
        assert_eq!(estimate_tokens("abcde", 4), 2);
    }

    #[test]
    fn excerpt_counts_characters() {
        assert_eq!(excerpt("héllo world", 5), "héllo...");
        assert_eq!(excerpt("ab", 5), "ab...");
    }
}
