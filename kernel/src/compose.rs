//! `format_prompt`: compose a briefing for a delegated role.
//!
//! Role resolution order:
//!
//! 1. `agents/registry.yaml` entry
//! 2. `agents/core/<role>.md` (heading only, no guidance)
//! 3. embedded defaults
//!
//! Guidance comes from the `principles` directory when one is available, and
//! from the embedded summaries otherwise. Names that resolve nowhere are
//! skipped without error.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::roles::{RoleProfile, default_role, embedded_guidance, role_from_markdown};
use crate::error::KernelError;
use crate::io::assets::find_mentioning;
use crate::io::metadata::registry_role;
use crate::io::prompt::{BriefingInputs, GuidanceExcerpt, estimate_tokens, excerpt, render_briefing};
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

const PRINCIPLES_DIR: &str = "principles";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatPromptResponse {
    pub prompt: String,
    pub agent_type: String,
    /// Guidance names requested: role guidance followed by caller extras.
    pub principles_loaded: Vec<String>,
    pub tuple_id: Option<String>,
    pub estimated_tokens: usize,
}

impl<S: TupleRepository> Kernel<S> {
    pub fn format_prompt(
        &mut self,
        agent_type: &str,
        task: &str,
        tuple_id: Option<&str>,
        additional_principles: &[String],
    ) -> Result<FormatPromptResponse> {
        let role = self.resolve_role(agent_type)?;

        let mut names = role.principles.clone();
        names.extend(additional_principles.iter().cloned());
        let guidance = self.load_guidance(&names);

        let tuple = tuple_id.and_then(|id| self.store.find(id));
        let prompt = render_briefing(&BriefingInputs {
            agent_type,
            role: &role,
            guidance: &guidance,
            tuple: tuple.as_ref(),
            task,
        })?;

        Ok(FormatPromptResponse {
            estimated_tokens: estimate_tokens(&prompt, self.config.chars_per_token),
            prompt,
            agent_type: agent_type.to_string(),
            principles_loaded: names,
            tuple_id: tuple_id.map(str::to_string),
        })
    }

    fn resolve_role(&self, agent_type: &str) -> Result<RoleProfile> {
        if let Some(role) = registry_role(&self.assets, agent_type) {
            debug!(role = agent_type, "role from registry");
            return Ok(role);
        }
        let doc = format!("agents/core/{agent_type}.md");
        if self.assets.source_of(&doc).is_some() {
            let content = self.assets.read(&doc)?;
            debug!(role = agent_type, "role from definition document");
            return Ok(role_from_markdown(agent_type, &content));
        }
        default_role(agent_type).ok_or_else(|| {
            KernelError::NotFound(format!(
                "Unknown agent type: '{agent_type}'. Available in registry or defaults: implementer (coder), researcher, reviewer, tester, planner"
            ))
            .into()
        })
    }

    /// Guidance excerpts from the principles directory; the embedded summaries
    /// stand in when the directory is missing or cannot be scanned.
    fn load_guidance(&self, names: &[String]) -> Vec<GuidanceExcerpt> {
        if names.is_empty() {
            return Vec::new();
        }
        let scanned = match self.assets.resolve_dir(PRINCIPLES_DIR) {
            Ok(dir) => self.scan_guidance(&dir, names),
            Err(err) => {
                debug!(error = %err, "no guidance directory; using embedded summaries");
                return embedded_excerpts(names);
            }
        };
        scanned.unwrap_or_else(|err| {
            warn!(error = %format!("{err:#}"), "unreadable guidance directory; using embedded summaries");
            embedded_excerpts(names)
        })
    }

    fn scan_guidance(&self, dir: &Path, names: &[String]) -> Result<Vec<GuidanceExcerpt>> {
        let mut excerpts = Vec::new();
        for name in names {
            match find_mentioning(dir, name)? {
                Some((file, content)) => {
                    debug!(guidance = %name, file = %file, "guidance resolved");
                    excerpts.push(GuidanceExcerpt {
                        name: name.clone(),
                        body: excerpt(&content, self.config.guidance_excerpt_chars),
                    });
                }
                None => warn!(guidance = %name, "guidance not found in principles directory"),
            }
        }
        Ok(excerpts)
    }
}

fn embedded_excerpts(names: &[String]) -> Vec<GuidanceExcerpt> {
    names
        .iter()
        .filter_map(|name| {
            embedded_guidance(name).map(|body| GuidanceExcerpt {
                name: name.clone(),
                body: body.to_string(),
            })
        })
        .collect()
}
