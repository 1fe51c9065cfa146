//! YAML metadata sources: the primitive catalog and the role registry.

use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::roles::RoleProfile;
use crate::core::router::{Catalog, Primitive};
use crate::io::assets::AssetResolver;

pub const COMMAND_METADATA: &str = "commands/metadata.yaml";
pub const AGENT_REGISTRY: &str = "agents/registry.yaml";

/// `commands/metadata.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandMetadata {
    #[serde(default)]
    pub primitives: Option<HashMap<String, Primitive>>,
    #[serde(default)]
    pub commands: Option<HashMap<String, CommandEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandEntry {
    /// Command category (`primitive`, `process`, `alias`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `agents/registry.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRegistry {
    #[serde(default)]
    pub agents: HashMap<String, RoleProfile>,
}

pub fn load_command_metadata(assets: &AssetResolver) -> Result<CommandMetadata> {
    assets.read_yaml(COMMAND_METADATA)
}

/// Primitive catalog from metadata, or the embedded catalog when unavailable.
pub fn load_catalog(assets: &AssetResolver) -> Catalog {
    match load_command_metadata(assets) {
        Ok(metadata) => {
            let primitives = metadata.primitives.unwrap_or_default();
            debug!(primitives = primitives.len(), "loaded primitive catalog");
            Catalog::new(primitives)
        }
        Err(err) => {
            debug!(error = %format!("{err:#}"), "using embedded primitive catalog");
            Catalog::embedded()
        }
    }
}

/// Role profile from the registry, if the registry exists and names `role`.
pub fn registry_role(assets: &AssetResolver, role: &str) -> Option<RoleProfile> {
    if assets.source_of(AGENT_REGISTRY).is_none() {
        return None;
    }
    match assets.read_yaml::<AgentRegistry>(AGENT_REGISTRY) {
        Ok(mut registry) => registry.agents.remove(role),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "ignoring unreadable agent registry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn metadata_catalog_replaces_embedded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let project = temp.path().join(".claude");
        fs::create_dir_all(project.join("commands")).expect("mkdir");
        fs::write(
            project.join("commands/metadata.yaml"),
            "primitives:\n  explore:\n    slot: Constraints\n    mode: scouting\n    execution_hints:\n      parallelizable: true\n      max_agents: 2\n",
        )
        .expect("write");

        let catalog = load_catalog(&AssetResolver::new(&project, temp.path().join("none")));
        assert_eq!(catalog.len(), 1);
        let explore = catalog.get("explore").expect("explore");
        assert_eq!(explore.mode, "scouting");
        assert_eq!(explore.execution_hints["max_agents"], 2);
        assert_eq!(explore.local_check, "");
    }

    #[test]
    fn missing_metadata_uses_embedded_catalog() {
        let temp = tempfile::tempdir().expect("tempdir");
        let assets = AssetResolver::new(temp.path().join("p"), temp.path().join("b"));
        assert_eq!(load_catalog(&assets), Catalog::embedded());
    }

    #[test]
    fn registry_role_reads_named_agent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bundled = temp.path().join("bundled");
        fs::create_dir_all(bundled.join("agents")).expect("mkdir");
        fs::write(
            bundled.join("agents/registry.yaml"),
            "agents:\n  explorer:\n    description: Maps unknown territory\n    principles: [progressive-evidence]\n    focus: [search]\n",
        )
        .expect("write");

        let assets = AssetResolver::new(temp.path().join("p"), &bundled);
        let role = registry_role(&assets, "explorer").expect("role");
        assert_eq!(role.description, "Maps unknown territory");
        assert_eq!(role.principles, vec!["progressive-evidence"]);
        assert!(registry_role(&assets, "coder").is_none());
    }

    #[test]
    fn registry_entry_without_description_keeps_siblings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bundled = temp.path().join("bundled");
        fs::create_dir_all(bundled.join("agents")).expect("mkdir");
        fs::write(
            bundled.join("agents/registry.yaml"),
            "agents:\n  terse:\n    principles: [thinking-tuple]\n  scout:\n    description: Finds things\n",
        )
        .expect("write");

        let assets = AssetResolver::new(temp.path().join("p"), &bundled);
        let terse = registry_role(&assets, "terse").expect("terse");
        assert_eq!(terse.description, "");
        assert_eq!(terse.principles, vec!["thinking-tuple"]);
        assert_eq!(registry_role(&assets, "scout").expect("scout").description, "Finds things");
    }
}
