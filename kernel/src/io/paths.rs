//! Canonical locations for a project served by the kernel.

use std::path::{Path, PathBuf};

/// Directory under the project root holding overrides, config and state.
pub const PROJECT_ASSETS_DIR: &str = ".claude";

/// All canonical paths for a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelPaths {
    pub project_dir: PathBuf,
    /// Project-local asset overrides (`<project>/.claude`).
    pub project_assets_dir: PathBuf,
    /// Bundled default assets.
    pub resources_dir: PathBuf,
    pub config_path: PathBuf,
}

impl KernelPaths {
    pub fn new(project_dir: impl Into<PathBuf>, resources_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let project_assets_dir = project_dir.join(PROJECT_ASSETS_DIR);
        Self {
            config_path: project_assets_dir.join("kernel.toml"),
            project_assets_dir,
            resources_dir: resources_dir.into(),
            project_dir,
        }
    }

    /// Tuple snapshot directory; relative `state_dir` values resolve against the project.
    pub fn state_dir(&self, state_dir: &Path) -> PathBuf {
        if state_dir.is_absolute() {
            state_dir.to_path_buf()
        } else {
            self.project_dir.join(state_dir)
        }
    }
}

/// Default bundled resources: `resources/` next to the running executable.
pub fn default_resources_dir(project_dir: &Path) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("resources")))
        .unwrap_or_else(|| project_dir.join("resources"))
}
