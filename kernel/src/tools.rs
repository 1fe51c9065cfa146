//! Tool catalog and dispatch.
//!
//! Every tool advertises a JSON Schema `inputSchema`. Arguments are checked
//! against it before they are deserialized into the typed argument structs
//! below, so handlers only see well-formed input.

use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use jsonschema::validator_for;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::types::GradientSignals;
use crate::error::KernelError;
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

mod args {
    use serde::Deserialize;

    use crate::core::types::SlotContent;

    #[derive(Debug, Deserialize)]
    pub struct Name {
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Tier {
        pub tier: Option<u8>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Keyword {
        pub keyword: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Category {
        pub category: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Skill {
        pub skill_name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Agent {
        pub agent_name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Pattern {
        pub domain: String,
        pub pattern_name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct TupleInit {
        pub task: String,
        pub constraints: Option<Vec<String>>,
        pub invariant: Option<Vec<String>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct TupleId {
        pub id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct TupleUpdate {
        pub id: String,
        pub slot: String,
        pub action: String,
        pub content: SlotContent,
    }

    #[derive(Debug, Deserialize)]
    pub struct Route {
        pub intent: String,
        pub tuple_id: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Gradient {
        pub tuple_id: String,
        pub knowledge: bool,
        pub invariant: bool,
        pub evidence: bool,
        pub confidence: bool,
        pub action: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Prompt {
        pub agent_type: String,
        pub task: String,
        pub tuple_id: Option<String>,
        #[serde(default)]
        pub additional_principles: Vec<String>,
    }
}

fn tool_def(name: &str, description: &str, properties: Value, required: &[&str]) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

static TOOL_DEFINITIONS: LazyLock<Vec<Value>> = LazyLock::new(|| {
    let strings = json!({"type": "array", "items": {"type": "string"}});
    vec![
        tool_def(
            "get_principle",
            "Get principle content by name from the principles directory",
            json!({"name": {"type": "string", "description": "Principle name (e.g., 'defensive-programming')"}}),
            &["name"],
        ),
        tool_def(
            "list_principles",
            "List all available principles",
            json!({"tier": {"type": "integer", "minimum": 0, "maximum": 3, "description": "Optional: filter by tier (0-3)"}}),
            &[],
        ),
        tool_def(
            "get_command",
            "Get command instructions from the commands directory",
            json!({"name": {"type": "string", "description": "Command name (e.g., 'explore', 'run')"}}),
            &["name"],
        ),
        tool_def(
            "list_commands",
            "List available commands",
            json!({"category": {"type": "string", "description": "Filter: primitive, process, alias, all"}}),
            &[],
        ),
        tool_def(
            "load_skill",
            "Load skill checklist from the skills directory",
            json!({"skill_name": {"type": "string", "description": "Skill name (e.g., 'code-review')"}}),
            &["skill_name"],
        ),
        tool_def(
            "get_dslp_pattern",
            "Get DSLP pattern definition from a domain pack",
            json!({
                "domain": {"type": "string", "description": "Domain name (e.g., 'web_motion')"},
                "pattern_name": {"type": "string", "description": "Pattern name (e.g., 'scroll_reveal')"}
            }),
            &["domain", "pattern_name"],
        ),
        tool_def("list_dslp_domains", "List available DSLP domains", json!({}), &[]),
        tool_def(
            "get_claude_md",
            "Get complete CLAUDE.md content (full Agent Kernel protocol)",
            json!({}),
            &[],
        ),
        tool_def(
            "search_principles",
            "Search principles by keyword",
            json!({"keyword": {"type": "string", "description": "Keyword to search for"}}),
            &["keyword"],
        ),
        tool_def(
            "get_agent",
            "Get agent definition from the agents directory",
            json!({"agent_name": {"type": "string", "description": "Agent name (e.g., 'explorer', 'verifier')"}}),
            &["agent_name"],
        ),
        tool_def(
            "tuple_init",
            "Initialize a Thinking Tuple for a task. Returns a tuple ID for subsequent operations.",
            json!({
                "task": {"type": "string", "description": "The task to accomplish"},
                "constraints": strings.clone(),
                "invariant": strings.clone()
            }),
            &["task"],
        ),
        tool_def(
            "tuple_get",
            "Get the current state of a Thinking Tuple by ID. Returns all slots, iteration count, gradient history, and status.",
            json!({"id": {"type": "string", "description": "Tuple ID from tuple_init"}}),
            &["id"],
        ),
        tool_def(
            "tuple_update",
            "Update a slot in the Thinking Tuple. Slots: constraints, invariant, principles, strategy, check. Actions: append, replace, clear.",
            json!({
                "id": {"type": "string", "description": "Tuple ID"},
                "slot": {
                    "type": "string",
                    "enum": ["constraints", "invariant", "principles", "strategy", "check"],
                    "description": "Which tuple slot to update"
                },
                "action": {
                    "type": "string",
                    "enum": ["append", "replace", "clear"],
                    "description": "How to update: append (add items), replace (overwrite), clear (empty)"
                },
                "content": {
                    "oneOf": [{"type": "string"}, strings.clone()],
                    "description": "Content to add/replace (string or array of strings)"
                }
            }),
            &["id", "slot", "action", "content"],
        ),
        tool_def(
            "route_command",
            "Given a task intent, determine which primitive command to execute next. Optionally considers current tuple state for context-aware routing.",
            json!({
                "intent": {"type": "string", "description": "What the model wants to do next (e.g., 'explore authentication options')"},
                "tuple_id": {"type": "string", "description": "Optional: Tuple ID for context-aware routing"}
            }),
            &["intent"],
        ),
        tool_def(
            "evaluate_gradient",
            "Evaluate the gradient (learning progress) after an iteration. Returns recommendation to CONTINUE or TERMINATE.",
            json!({
                "tuple_id": {"type": "string", "description": "Tuple ID"},
                "knowledge": {"type": "boolean", "description": "Did we discover new knowledge? (entities, relations, insights)"},
                "invariant": {"type": "boolean", "description": "Did we refine the invariant? (more precise or testable)"},
                "evidence": {"type": "boolean", "description": "Did we strengthen evidence? (moved up evidence layers)"},
                "confidence": {"type": "boolean", "description": "Did our certainty change? (hypotheses confirmed/refuted)"},
                "action": {"type": "string", "description": "What action was taken this iteration"},
                "notes": {"type": "string", "description": "Optional notes about what happened"}
            }),
            &["tuple_id", "knowledge", "invariant", "evidence", "confidence"],
        ),
        tool_def(
            "format_prompt",
            "Generate a cognitive prompt for an agent, injecting principles and tuple context.",
            json!({
                "agent_type": {"type": "string", "description": "Agent type: implementer (coder), researcher, reviewer, tester, planner, or any agent in the registry"},
                "task": {"type": "string", "description": "The task for the agent to perform"},
                "tuple_id": {"type": "string", "description": "Optional: Tuple ID to inject tuple context into prompt"},
                "additional_principles": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Extra principles to load beyond agent defaults"
                }
            }),
            &["agent_type", "task"],
        ),
    ]
});

/// All tool definitions, in listing order.
pub fn tool_definitions() -> &'static [Value] {
    &TOOL_DEFINITIONS
}

fn input_schema(name: &str) -> Option<&'static Value> {
    tool_definitions()
        .iter()
        .find(|def| def["name"] == name)
        .map(|def| &def["inputSchema"])
}

/// Check `arguments` against `schema`; violations become [`KernelError::InvalidArgument`].
fn validate_arguments(tool: &str, schema: &Value, arguments: &Value) -> Result<()> {
    let validator = validator_for(schema).map_err(|err| anyhow!("invalid schema for {tool}: {err}"))?;
    let messages: Vec<String> = validator
        .iter_errors(arguments)
        .map(|err| err.to_string())
        .collect();
    if messages.is_empty() {
        return Ok(());
    }
    Err(KernelError::InvalidArgument(format!(
        "invalid arguments for {tool}: {}",
        messages.join("; ")
    ))
    .into())
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T> {
    serde_json::from_value(arguments.clone()).map_err(|err| {
        KernelError::InvalidArgument(format!("invalid arguments for {tool}: {err}")).into()
    })
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Validate and run one tool, returning the text payload.
pub fn call_tool<S: TupleRepository>(
    kernel: &mut Kernel<S>,
    name: &str,
    arguments: &Value,
) -> Result<String> {
    let schema = input_schema(name)
        .ok_or_else(|| KernelError::NotFound(format!("Unknown tool: {name}")))?;
    validate_arguments(name, schema, arguments)?;
    debug!(tool = name, "dispatching tool");

    match name {
        "get_principle" => kernel.get_principle(&parse::<args::Name>(name, arguments)?.name),
        "list_principles" => pretty(&kernel.list_principles(parse::<args::Tier>(name, arguments)?.tier)?),
        "search_principles" => {
            pretty(&kernel.search_principles(&parse::<args::Keyword>(name, arguments)?.keyword)?)
        }
        "get_command" => kernel.get_command(&parse::<args::Name>(name, arguments)?.name),
        "list_commands" => {
            let a: args::Category = parse(name, arguments)?;
            pretty(&kernel.list_commands(a.category.as_deref())?)
        }
        "load_skill" => kernel.load_skill(&parse::<args::Skill>(name, arguments)?.skill_name),
        "get_agent" => kernel.get_agent(&parse::<args::Agent>(name, arguments)?.agent_name),
        "get_claude_md" => kernel.get_claude_md(),
        "get_dslp_pattern" => {
            let a: args::Pattern = parse(name, arguments)?;
            pretty(&kernel.get_dslp_pattern(&a.domain, &a.pattern_name)?)
        }
        "list_dslp_domains" => pretty(&kernel.list_dslp_domains()),
        "tuple_init" => {
            let a: args::TupleInit = parse(name, arguments)?;
            pretty(&kernel.tuple_init(&a.task, a.constraints, a.invariant)?)
        }
        "tuple_get" => pretty(&kernel.tuple_get(&parse::<args::TupleId>(name, arguments)?.id)?),
        "tuple_update" => {
            let a: args::TupleUpdate = parse(name, arguments)?;
            pretty(&kernel.tuple_update(&a.id, &a.slot, &a.action, a.content)?)
        }
        "route_command" => {
            let a: args::Route = parse(name, arguments)?;
            pretty(&kernel.route_command(&a.intent, a.tuple_id.as_deref()))
        }
        "evaluate_gradient" => {
            let a: args::Gradient = parse(name, arguments)?;
            let signals = GradientSignals {
                knowledge: a.knowledge,
                invariant: a.invariant,
                evidence: a.evidence,
                confidence: a.confidence,
            };
            pretty(&kernel.evaluate_gradient(&a.tuple_id, signals, a.action, a.notes)?)
        }
        "format_prompt" => {
            let a: args::Prompt = parse(name, arguments)?;
            pretty(&kernel.format_prompt(
                &a.agent_type,
                &a.task,
                a.tuple_id.as_deref(),
                &a.additional_principles,
            )?)
        }
        other => Err(KernelError::NotFound(format!("Unknown tool: {other}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::classify;
    use crate::test_support::ProjectFixture;

    #[test]
    fn catalog_names_are_unique_and_complete() {
        let names: Vec<&str> = tool_definitions()
            .iter()
            .filter_map(|def| def["name"].as_str())
            .collect();
        assert_eq!(names.len(), 16);
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
        for def in tool_definitions() {
            assert!(validator_for(&def["inputSchema"]).is_ok(), "{}", def["name"]);
        }
    }

    #[test]
    fn schema_violations_are_invalid_argument() {
        let fixture = ProjectFixture::new().expect("fixture");
        let mut kernel = fixture.kernel().expect("kernel");

        let err = call_tool(&mut kernel, "tuple_init", &json!({})).unwrap_err();
        assert!(matches!(classify(&err), Some(KernelError::InvalidArgument(_))));

        let err = call_tool(
            &mut kernel,
            "tuple_update",
            &json!({"id": "run-1-aaaaaa", "slot": "plan", "action": "append", "content": "x"}),
        )
        .unwrap_err();
        assert!(matches!(classify(&err), Some(KernelError::InvalidArgument(_))));

        let err = call_tool(
            &mut kernel,
            "evaluate_gradient",
            &json!({"tuple_id": "run-1-aaaaaa", "knowledge": "yes", "invariant": false, "evidence": false, "confidence": false}),
        )
        .unwrap_err();
        assert!(matches!(classify(&err), Some(KernelError::InvalidArgument(_))));
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let fixture = ProjectFixture::new().expect("fixture");
        let mut kernel = fixture.kernel().expect("kernel");
        let err = call_tool(&mut kernel, "launch_rockets", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: launch_rockets");
    }

    #[test]
    fn tuple_tools_return_pretty_json() {
        let fixture = ProjectFixture::new().expect("fixture");
        let mut kernel = fixture.kernel().expect("kernel");
        let text = call_tool(&mut kernel, "tuple_init", &json!({"task": "add auth"})).expect("init");
        assert!(text.starts_with("{\n  \"id\": \"run-"));
        let init: Value = serde_json::from_str(&text).expect("json");

        let text = call_tool(
            &mut kernel,
            "tuple_update",
            &json!({"id": init["id"], "slot": "check", "action": "append", "content": ["PASS: login"]}),
        )
        .expect("update");
        let update: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(update["slot"], "check");
        assert_eq!(update["current_value"], json!(["PASS: login"]));

        let text = call_tool(&mut kernel, "list_principles", &json!({"tier": 0})).expect("list");
        let core: Vec<String> = serde_json::from_str(&text).expect("json");
        assert_eq!(core[0], "defensive-programming");
    }
}
