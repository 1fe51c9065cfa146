//! Test-only helpers: isolated project directories and failing backends.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::Tuple;
use crate::io::config::{KernelConfig, write_config};
use crate::io::paths::KernelPaths;
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

/// A temporary project root with an empty bundled resources directory.
///
/// Layout: `<tmp>/project` (with `.claude/` overrides) and `<tmp>/resources`.
pub struct ProjectFixture {
    // Held for its Drop; the directory lives as long as the fixture.
    _temp: TempDir,
    paths: KernelPaths,
}

impl ProjectFixture {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let project = temp.path().join("project");
        let resources = temp.path().join("resources");
        fs::create_dir_all(&project).context("create project dir")?;
        fs::create_dir_all(&resources).context("create resources dir")?;
        Ok(Self {
            paths: KernelPaths::new(project, resources),
            _temp: temp,
        })
    }

    pub fn paths(&self) -> &KernelPaths {
        &self.paths
    }

    pub fn project_dir(&self) -> &Path {
        &self.paths.project_dir
    }

    /// Write `<project>/.claude/<name>`.
    pub fn write_project(&self, name: &str, contents: &str) -> Result<()> {
        write_file(&self.paths.project_assets_dir.join(name), contents)
    }

    /// Write `<resources>/<name>`.
    pub fn write_bundled(&self, name: &str, contents: &str) -> Result<()> {
        write_file(&self.paths.resources_dir.join(name), contents)
    }

    pub fn write_config(&self, cfg: &KernelConfig) -> Result<()> {
        write_config(&self.paths.config_path, cfg)
    }

    /// A fresh kernel over this project; each call starts with empty memory.
    pub fn kernel(&self) -> Result<Kernel> {
        Kernel::open(&self.paths)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Snapshot backend whose writes always fail and which never has anything stored.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRepository;

impl TupleRepository for FailingRepository {
    fn load(&self, _id: &str) -> Result<Option<Tuple>> {
        Ok(None)
    }

    fn save(&mut self, tuple: &Tuple) -> Result<()> {
        Err(anyhow!("disk full while writing {}", tuple.id))
    }
}
