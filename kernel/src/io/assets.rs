//! Asset resolution with project-local overrides.
//!
//! A logical asset name such as `commands/metadata.yaml` resolves to
//! `<project>/.claude/<name>` when that exists, otherwise to the bundled copy
//! under the resources directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::KernelError;

/// Where a resolved asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Project,
    Bundled,
}

impl AssetSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetSource::Project => "project",
            AssetSource::Bundled => "bundled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetResolver {
    project_dir: PathBuf,
    bundled_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(project_dir: impl Into<PathBuf>, bundled_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            bundled_dir: bundled_dir.into(),
        }
    }

    /// Which root currently provides `name`, if any.
    pub fn source_of(&self, name: &str) -> Option<AssetSource> {
        if self.project_dir.join(name).exists() {
            Some(AssetSource::Project)
        } else if self.bundled_dir.join(name).exists() {
            Some(AssetSource::Bundled)
        } else {
            None
        }
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let source = self.source_of(name)?;
        let root = match source {
            AssetSource::Project => &self.project_dir,
            AssetSource::Bundled => &self.bundled_dir,
        };
        debug!(asset = name, source = source.as_str(), "asset resolved");
        Some(root.join(name))
    }

    /// Resolve an asset file; a missing file is [`KernelError::NotFound`].
    pub fn resolve_file(&self, name: &str) -> Result<PathBuf> {
        self.locate(name)
            .filter(|path| path.is_file())
            .ok_or_else(|| KernelError::NotFound(format!("asset '{name}' not found")).into())
    }

    /// Resolve an asset directory; a missing one is [`KernelError::UpstreamUnavailable`].
    pub fn resolve_dir(&self, name: &str) -> Result<PathBuf> {
        self.locate(name)
            .filter(|path| path.is_dir())
            .ok_or_else(|| {
                KernelError::UpstreamUnavailable(format!("asset directory '{name}' unavailable"))
                    .into()
            })
    }

    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.resolve_file(name)?;
        read_text(&path)
    }

    pub fn read_yaml<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        read_yaml_file(&self.resolve_file(name)?)
    }
}

pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = read_text(path)?;
    serde_yaml::from_str(&contents).with_context(|| format!("parse yaml {}", path.display()))
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// File names in `dir` ending with `extension`, sorted.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(extension) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Subdirectory names of `dir`, sorted.
pub fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// First `.md` file in `dir` (by name) whose content mentions `needle`, ignoring case.
pub fn find_mentioning(dir: &Path, needle: &str) -> Result<Option<(String, String)>> {
    let needle = needle.to_lowercase();
    for name in list_files(dir, ".md")? {
        let content = read_text(&dir.join(&name))?;
        if content.to_lowercase().contains(&needle) {
            return Ok(Some((name, content)));
        }
    }
    Ok(None)
}

/// File stem for a markdown file name.
pub fn stem(name: &str) -> &str {
    name.strip_suffix(".md").unwrap_or(name)
}
