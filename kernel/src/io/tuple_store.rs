//! Tuple storage: an in-memory index backed by per-tuple JSON snapshots.
//!
//! [`TupleStore`] composes two [`TupleRepository`] backends. Reads go to memory
//! first and fall through to snapshots, installing what they find. Writes go
//! to memory and then to snapshots; a snapshot failure is logged and swallowed
//! because memory stays authoritative for the life of the process.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, info, warn};

use crate::core::types::{Slot, SlotAction, Tuple};
use crate::error::KernelError;

/// Storage backend for tuple records.
pub trait TupleRepository {
    /// Fetch a tuple; `Ok(None)` when this backend has never seen `id`.
    fn load(&self, id: &str) -> Result<Option<Tuple>>;

    /// Store the full record, replacing any previous version.
    fn save(&mut self, tuple: &Tuple) -> Result<()>;
}

/// Process-lifetime map of tuples.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tuples: HashMap<String, Tuple>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl TupleRepository for MemoryRepository {
    fn load(&self, id: &str) -> Result<Option<Tuple>> {
        Ok(self.tuples.get(id).cloned())
    }

    fn save(&mut self, tuple: &Tuple) -> Result<()> {
        self.tuples.insert(tuple.id.clone(), tuple.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per tuple id (`<dir>/<id>.json`).
#[derive(Debug, Clone)]
pub struct FileRepository {
    dir: PathBuf,
}

impl FileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl TupleRepository for FileRepository {
    fn load(&self, id: &str) -> Result<Option<Tuple>> {
        let path = self.snapshot_path(id);
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading tuple snapshot");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("read tuple snapshot {}", path.display()))?;
        let tuple: Tuple = serde_json::from_str(&contents)
            .with_context(|| format!("parse tuple snapshot {}", path.display()))?;
        Ok(Some(tuple))
    }

    fn save(&mut self, tuple: &Tuple) -> Result<()> {
        let path = self.snapshot_path(&tuple.id);
        debug!(path = %path.display(), iteration = tuple.iteration, "writing tuple snapshot");
        let mut buf = serde_json::to_string_pretty(tuple)?;
        buf.push('\n');
        write_atomic(&path, &buf)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("snapshot path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp snapshot {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace snapshot {}", path.display()))?;
    Ok(())
}

/// Validate that an id is safe to use as a snapshot file name.
pub fn validate_id(id: &str) -> Result<(), KernelError> {
    if id.is_empty() {
        return Err(KernelError::InvalidArgument(
            "tuple id must not be empty".to_string(),
        ));
    }
    if id.starts_with('.')
        || id
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'))
    {
        return Err(KernelError::InvalidArgument(format!(
            "tuple id must be [A-Za-z0-9._-] only (got '{id}')"
        )));
    }
    Ok(())
}

/// Fresh id: `run-<unix millis>-<6 lowercase alphanumerics>`.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix = std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase();
    format!("run-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Read-through / write-through composition of memory and snapshot backends.
#[derive(Debug)]
pub struct TupleStore<S: TupleRepository = FileRepository> {
    memory: MemoryRepository,
    snapshots: S,
}

impl<S: TupleRepository> TupleStore<S> {
    pub fn new(snapshots: S) -> Self {
        Self {
            memory: MemoryRepository::new(),
            snapshots,
        }
    }

    pub fn snapshots(&self) -> &S {
        &self.snapshots
    }

    /// Create and persist a new running tuple.
    pub fn create(
        &mut self,
        task: &str,
        constraints: Vec<String>,
        invariant: Vec<String>,
    ) -> Result<Tuple> {
        let mut id = generate_id();
        while self.memory.load(&id)?.is_some() {
            id = generate_id();
        }
        let tuple = Tuple::new(id, task.to_string(), constraints, invariant, Utc::now());
        info!(tuple_id = %tuple.id, "tuple created");
        self.write_through(&tuple)?;
        Ok(tuple)
    }

    /// Fetch a tuple, installing a snapshot into memory on a miss.
    ///
    /// An id that cannot name a snapshot file is unknown to both tiers.
    pub fn get(&mut self, id: &str) -> Result<Tuple> {
        if let Err(err) = validate_id(id) {
            debug!(tuple_id = id, error = %err, "unsafe tuple id");
            return Err(not_found(id).into());
        }
        if let Some(tuple) = self.memory.load(id)? {
            return Ok(tuple);
        }
        let loaded = match self.snapshots.load(id) {
            Ok(found) => found,
            Err(err) => {
                warn!(tuple_id = id, error = %format!("{err:#}"), "unreadable tuple snapshot");
                None
            }
        };
        let tuple = loaded.ok_or_else(|| not_found(id))?;
        debug!(tuple_id = id, "tuple installed from snapshot");
        self.memory.save(&tuple)?;
        Ok(tuple)
    }

    /// Like [`TupleStore::get`], but an unknown or invalid id is simply absent.
    pub fn find(&mut self, id: &str) -> Option<Tuple> {
        match self.get(id) {
            Ok(tuple) => Some(tuple),
            Err(err) => {
                debug!(tuple_id = id, error = %err, "tuple not resolvable");
                None
            }
        }
    }

    /// Apply a slot update and persist; returns the updated tuple.
    pub fn update_slot(
        &mut self,
        id: &str,
        slot: Slot,
        action: SlotAction,
        items: Vec<String>,
    ) -> Result<Tuple> {
        let (tuple, ()) = self.modify(id, |tuple| {
            tuple.apply_slot_update(slot, action, items, Utc::now());
        })?;
        Ok(tuple)
    }

    /// Read-modify-write-persist on one tuple.
    pub fn modify<R>(&mut self, id: &str, f: impl FnOnce(&mut Tuple) -> R) -> Result<(Tuple, R)> {
        let mut tuple = self.get(id)?;
        let out = f(&mut tuple);
        self.write_through(&tuple)?;
        Ok((tuple, out))
    }

    fn write_through(&mut self, tuple: &Tuple) -> Result<()> {
        self.memory.save(tuple)?;
        if let Err(err) = self.snapshots.save(tuple) {
            warn!(tuple_id = %tuple.id, error = %format!("{err:#}"), "tuple snapshot failed; keeping in-memory state");
        }
        Ok(())
    }
}

fn not_found(id: &str) -> KernelError {
    KernelError::NotFound(format!(
        "Tuple '{id}' not found. Use tuple_init to create one."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TupleStatus;
    use crate::error::classify;
    use crate::test_support::FailingRepository;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn generated_ids_have_stable_shape() {
        let id = generate_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3, "{id}");
        assert_eq!(parts[0], "run");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(validate_id(&id).is_ok());
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn unsafe_ids_are_rejected() {
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("").is_err());
        assert!(validate_id(".hidden").is_err());
        assert!(validate_id("run-1-abc").is_ok());
    }

    #[test]
    fn snapshot_reload_matches_saved_tuple() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = TupleStore::new(FileRepository::new(temp.path()));
        let created = store
            .create("add auth", strings(&["uses sessions"]), strings(&["login works"]))
            .expect("create");
        store
            .update_slot(&created.id, Slot::Strategy, SlotAction::Append, strings(&["oauth"]))
            .expect("update");

        // A fresh store has an empty memory index and must read through.
        let mut fresh = TupleStore::new(FileRepository::new(temp.path()));
        let reloaded = fresh.get(&created.id).expect("reload");
        assert_eq!(reloaded.task, "add auth");
        assert_eq!(reloaded.constraints, strings(&["uses sessions"]));
        assert_eq!(reloaded.invariant, strings(&["login works"]));
        assert_eq!(reloaded.strategy, strings(&["oauth"]));
        assert_eq!(reloaded.status, TupleStatus::Running);
        assert!(fresh.memory.load(&created.id).expect("memory").is_some());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = TupleStore::new(FileRepository::new(temp.path()));
        let err = store.get("run-0-nothing").unwrap_err();
        assert!(matches!(classify(&err), Some(KernelError::NotFound(_))));
        assert!(store.find("run-0-nothing").is_none());
    }

    #[test]
    fn unsafe_id_lookup_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = TupleStore::new(FileRepository::new(temp.path()));
        for id in ["a b", "../escape", ""] {
            let err = store.get(id).unwrap_err();
            assert!(matches!(classify(&err), Some(KernelError::NotFound(_))), "{id}");
        }
    }

    #[test]
    fn corrupt_snapshot_is_treated_as_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("run-1-broken.json"), "{not json").expect("write");
        let mut store = TupleStore::new(FileRepository::new(temp.path()));
        let err = store.get("run-1-broken").unwrap_err();
        assert!(matches!(classify(&err), Some(KernelError::NotFound(_))));
    }

    #[test]
    fn snapshot_failures_do_not_fail_mutations() {
        let mut store = TupleStore::new(FailingRepository);
        let created = store.create("task", Vec::new(), Vec::new()).expect("create");
        let updated = store
            .update_slot(&created.id, Slot::Check, SlotAction::Append, strings(&["PASS"]))
            .expect("update");
        assert_eq!(updated.check, strings(&["PASS"]));
        assert_eq!(store.get(&created.id).expect("get").check, strings(&["PASS"]));
    }

    #[test]
    fn snapshots_are_pretty_json_with_trailing_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut store = TupleStore::new(FileRepository::new(temp.path().join("runs")));
        let created = store.create("task", Vec::new(), Vec::new()).expect("create");
        let path = store.snapshots().snapshot_path(&created.id);
        let contents = fs::read_to_string(path).expect("read");
        assert!(contents.starts_with("{\n  \"id\": "));
        assert!(contents.ends_with("}\n"));
        assert!(contents.contains("\"gradient_history\": []"));
    }
}
