//! Kernel configuration stored under `.claude/kernel.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::gradient::DEFAULT_MAX_ITERATIONS;

/// Kernel configuration (TOML).
///
/// Missing fields default to the protocol's standard values, so an absent or
/// partial file behaves like a fresh project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KernelConfig {
    /// Safety ceiling on gradient evaluations per tuple.
    pub max_iterations: u32,

    /// Characters of each guidance document inlined into a briefing.
    pub guidance_excerpt_chars: usize,

    /// Characters per token used for briefing size estimates.
    pub chars_per_token: usize,

    /// Tuple snapshot directory, relative to the project root unless absolute.
    pub state_dir: PathBuf,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            guidance_excerpt_chars: 500,
            chars_per_token: 4,
            state_dir: PathBuf::from(".claude/state/runs"),
        }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.guidance_excerpt_chars == 0 {
            return Err(anyhow!("guidance_excerpt_chars must be > 0"));
        }
        if self.chars_per_token == 0 {
            return Err(anyhow!("chars_per_token must be > 0"));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(anyhow!("state_dir must not be empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `KernelConfig::default()`.
pub fn load_config(path: &Path) -> Result<KernelConfig> {
    if !path.exists() {
        let cfg = KernelConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: KernelConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &KernelConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, KernelConfig::default());
        assert_eq!(cfg.max_iterations, 20);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kernel.toml");
        let cfg = KernelConfig {
            max_iterations: 8,
            ..KernelConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kernel.toml");
        fs::write(&path, "guidance_excerpt_chars = 120\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.guidance_excerpt_chars, 120);
        assert_eq!(cfg.chars_per_token, 4);
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kernel.toml");
        fs::write(&path, "max_iterations = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }
}
