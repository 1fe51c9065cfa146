//! Stateless lookups of named text assets.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::error::KernelError;
use crate::io::assets::{find_mentioning, list_dirs, list_files, read_text, read_yaml_file, stem};
use crate::io::metadata::CommandMetadata;
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

/// Principles always loaded into a session.
pub const CORE_PRINCIPLES: &[&str] = &[
    "defensive-programming",
    "progressive-evidence",
    "logging-discipline",
    "execution-boundary",
    "configuration-variation",
    "universal-property-verification",
    "thinking-tuple-protocol",
    "commands-as-strategy-modes",
    "dslp-framework-integration",
    "unified-ontological-framework",
    "semantic-inheritance",
    "execution-modes",
];

const SKILL_ENTRY_FILES: &[&str] = &["SKILL.md", "README.md", "checklist.md"];

impl<S: TupleRepository> Kernel<S> {
    /// First principles document that mentions `name`.
    pub fn get_principle(&self, name: &str) -> Result<String> {
        let dir = self.assets.resolve_dir("principles")?;
        match find_mentioning(&dir, name)? {
            Some((_, content)) => Ok(content),
            None => Err(KernelError::NotFound(format!("Principle '{name}' not found")).into()),
        }
    }

    /// Principle document stems; tier 0 is the fixed core list.
    pub fn list_principles(&self, tier: Option<u8>) -> Result<Vec<String>> {
        if tier == Some(0) {
            return Ok(CORE_PRINCIPLES.iter().map(|s| s.to_string()).collect());
        }
        // Documents carry no tier metadata, so tiers 1..=3 list everything.
        let dir = self.assets.resolve_dir("principles")?;
        Ok(list_files(&dir, ".md")?
            .iter()
            .map(|name| stem(name).to_string())
            .collect())
    }

    pub fn search_principles(&self, keyword: &str) -> Result<Vec<String>> {
        let dir = self.assets.resolve_dir("principles")?;
        let needle = keyword.to_lowercase();
        let mut matches = Vec::new();
        for name in list_files(&dir, ".md")? {
            let content = read_text(&dir.join(&name))?;
            if content.to_lowercase().contains(&needle) {
                matches.push(stem(&name).to_string());
            }
        }
        Ok(matches)
    }

    pub fn get_command(&self, name: &str) -> Result<String> {
        self.read_named(&format!("commands/{name}.md"), || {
            format!("Command '{name}' not found")
        })
    }

    /// Command stems, or the metadata names of one category.
    pub fn list_commands(&self, category: Option<&str>) -> Result<Vec<String>> {
        let dir = self.assets.resolve_dir("commands")?;
        let commands: Vec<String> = list_files(&dir, ".md")?
            .iter()
            .filter(|name| name.as_str() != "README.md")
            .map(|name| stem(name).to_string())
            .collect();

        let Some(category) = category.filter(|c| *c != "all") else {
            return Ok(commands);
        };
        // Categories come from the metadata beside the listed commands.
        let metadata_path = dir.join("metadata.yaml");
        if !metadata_path.is_file() {
            return Ok(commands);
        }
        match read_yaml_file::<CommandMetadata>(&metadata_path) {
            Ok(metadata) => {
                let mut filtered: Vec<String> = metadata
                    .commands
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|(_, entry)| entry.kind.as_deref() == Some(category))
                    .map(|(name, _)| name)
                    .collect();
                filtered.sort();
                Ok(filtered)
            }
            Err(err) => {
                debug!(error = %format!("{err:#}"), "command metadata unreadable; listing all");
                Ok(commands)
            }
        }
    }

    /// Skill entry document: `SKILL.md`, `README.md`, `checklist.md`, then `<name>.md`.
    pub fn load_skill(&self, skill_name: &str) -> Result<String> {
        let dir = self.assets.resolve_dir(&format!("skills/{skill_name}"))?;
        let own = format!("{skill_name}.md");
        let candidates = SKILL_ENTRY_FILES.iter().copied().chain([own.as_str()]);
        for file in candidates {
            let path = dir.join(file);
            if path.is_file() {
                return read_text(&path);
            }
        }
        Err(KernelError::NotFound(format!("Skill '{skill_name}' not found")).into())
    }

    pub fn get_agent(&self, agent_name: &str) -> Result<String> {
        self.read_named(&format!("agents/{agent_name}.md"), || {
            format!("Agent '{agent_name}' not found")
        })
    }

    pub fn get_claude_md(&self) -> Result<String> {
        self.read_named("CLAUDE.md", || "CLAUDE.md not found".to_string())
    }

    /// One entry of `domain_packs/<domain>/patterns.yaml`.
    pub fn get_dslp_pattern(&self, domain: &str, pattern_name: &str) -> Result<Value> {
        let patterns: BTreeMap<String, Value> = self
            .assets
            .read_yaml(&format!("domain_packs/{domain}/patterns.yaml"))?;
        patterns.get(pattern_name).cloned().ok_or_else(|| {
            KernelError::NotFound(format!(
                "Pattern '{pattern_name}' not found in domain '{domain}'"
            ))
            .into()
        })
    }

    /// Domain pack names; empty when the directory is unavailable.
    pub fn list_dslp_domains(&self) -> Vec<String> {
        self.assets
            .resolve_dir("domain_packs")
            .and_then(|dir| list_dirs(&dir))
            .unwrap_or_else(|err| {
                debug!(error = %format!("{err:#}"), "no domain packs");
                Vec::new()
            })
    }

    fn read_named(&self, asset: &str, not_found: impl FnOnce() -> String) -> Result<String> {
        if self.assets.source_of(asset).is_none() {
            return Err(KernelError::NotFound(not_found()).into());
        }
        self.assets.read(asset)
    }
}
