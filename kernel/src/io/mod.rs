//! Side-effecting helpers: asset lookup, configuration, snapshots, rendering.

pub mod assets;
pub mod config;
pub mod metadata;
pub mod paths;
pub mod prompt;
pub mod tuple_store;
