//! The kernel owns the tuple store, the asset resolver and the loaded config.
//!
//! Tool handlers are methods on [`Kernel`] spread across the orchestration
//! modules ([`crate::tuples`], [`crate::route`], [`crate::evaluate`],
//! [`crate::compose`], [`crate::knowledge`]).

use anyhow::{Context, Result};
use tracing::debug;

use crate::io::assets::AssetResolver;
use crate::io::config::{KernelConfig, load_config};
use crate::io::paths::KernelPaths;
use crate::io::tuple_store::{FileRepository, TupleRepository, TupleStore};

#[derive(Debug)]
pub struct Kernel<S: TupleRepository = FileRepository> {
    pub(crate) config: KernelConfig,
    pub(crate) assets: AssetResolver,
    pub(crate) store: TupleStore<S>,
}

impl Kernel<FileRepository> {
    /// Load `<project>/.claude/kernel.toml` and open the snapshot directory it names.
    pub fn open(paths: &KernelPaths) -> Result<Self> {
        let config = load_config(&paths.config_path)
            .with_context(|| format!("load kernel config {}", paths.config_path.display()))?;
        let state_dir = paths.state_dir(&config.state_dir);
        debug!(
            project = %paths.project_dir.display(),
            resources = %paths.resources_dir.display(),
            state = %state_dir.display(),
            "kernel opened"
        );
        let assets = AssetResolver::new(&paths.project_assets_dir, &paths.resources_dir);
        Ok(Self::new(config, assets, FileRepository::new(state_dir)))
    }
}

impl<S: TupleRepository> Kernel<S> {
    pub fn new(config: KernelConfig, assets: AssetResolver, snapshots: S) -> Self {
        Self {
            config,
            assets,
            store: TupleStore::new(snapshots),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    pub fn store(&self) -> &TupleStore<S> {
        &self.store
    }
}
