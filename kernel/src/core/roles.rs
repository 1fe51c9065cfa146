//! Role profiles and the embedded defaults used when no registry is available.

use serde::{Deserialize, Serialize};

/// What a delegated role is, which guidance it reads, and where it focuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    #[serde(default)]
    pub description: String,
    /// Guidance (principle) names inlined into the briefing.
    #[serde(default)]
    pub principles: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, alias = "capabilities")]
    pub focus: Vec<String>,
}

/// Roles always available without external assets.
pub const DEFAULT_ROLES: &[&str] = &["implementer", "researcher", "reviewer", "tester", "planner"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Embedded profile for `role`; `coder` is accepted as an alias of `implementer`.
pub fn default_role(role: &str) -> Option<RoleProfile> {
    let (description, principles, skills, focus): (&str, &[&str], &[&str], &[&str]) = match role {
        "implementer" | "coder" => (
            "Implementation specialist for writing clean, efficient code",
            &["defensive-programming", "error-handling-duality"],
            &["code-review"],
            &["code generation", "refactoring", "optimization"],
        ),
        "researcher" => (
            "Deep research and information gathering specialist",
            &["progressive-evidence", "execution-boundary"],
            &["research"],
            &["code analysis", "pattern recognition", "documentation"],
        ),
        "reviewer" => (
            "Code review and quality assurance specialist",
            &["defensive-programming", "testing-anti-patterns"],
            &["code-review"],
            &["code review", "quality assurance", "best practices"],
        ),
        "tester" => (
            "Comprehensive testing and quality assurance specialist",
            &["testing-anti-patterns", "cross-boundary-testing"],
            &["testing-workflow"],
            &["test writing", "edge cases", "coverage analysis"],
        ),
        "planner" => (
            "Strategic planning and task orchestration agent",
            &["thinking-tuple"],
            &[],
            &["task decomposition", "strategy planning", "coordination"],
        ),
        _ => return None,
    };
    Some(RoleProfile {
        description: description.to_string(),
        principles: strings(principles),
        skills: strings(skills),
        focus: strings(focus),
    })
}

/// Profile for a standalone role document: its first `# ` heading is the description.
pub fn role_from_markdown(role: &str, content: &str) -> RoleProfile {
    let description = content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|heading| !heading.is_empty())
        .unwrap_or(role);
    RoleProfile {
        description: description.to_string(),
        ..RoleProfile::default()
    }
}

/// One-paragraph guidance summaries used when no guidance directory exists.
pub fn embedded_guidance(name: &str) -> Option<&'static str> {
    let summary = match name {
        "defensive-programming" => {
            "Fail fast and visibly. Silent failures hide bugs. Validate at startup, not on first use."
        }
        "error-handling-duality" => {
            "Distinguish between operational errors (retry) and programmer errors (crash). Handle each appropriately."
        }
        "progressive-evidence" => {
            "Execution completion ≠ success. Verify through layers: status codes → payloads → logs → ground truth."
        }
        "execution-boundary" => {
            "Reading code ≠ verifying it works. Test at execution boundaries."
        }
        "testing-anti-patterns" => {
            "Avoid: testing implementation details, over-mocking, testing trivial code, brittle assertions."
        }
        "cross-boundary-testing" => {
            "Test across service boundaries with contract tests and integration tests."
        }
        "thinking-tuple" => {
            "Structure reasoning as (Constraints, Invariant, Principles, Strategy, Check)."
        }
        _ => return None,
    };
    Some(summary)
}
