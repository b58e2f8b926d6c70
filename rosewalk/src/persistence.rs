//! Failed-seed persistence and replay.
//!
//! When a check fails, the seed of the failing run is written to a small JSON file named after
//! the test. The next run of the same test replays that seed first (unless a seed was given
//! explicitly), so the exact failing samples come back until the property passes again, at
//! which point the file is removed.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::report::PropertyFailureInput;

/// A recorded failing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSeed {
    /// Name of the test the seed belongs to
    pub test_name: String,

    /// The seed that produced the failure
    pub seed: u64,

    /// Attempt number on which the property failed
    pub attempts: usize,

    /// Original and shrunk inputs as they were reported
    pub inputs: Vec<PropertyFailureInput<String>>,

    /// The `Caused by` line of the report
    pub cause: String,

    /// When this failure was recorded
    pub recorded_at: DateTime<Utc>,
}

impl FailedSeed {
    /// Record a failure now
    pub fn new(
        test_name: impl Into<String>,
        seed: u64,
        attempts: usize,
        inputs: Vec<PropertyFailureInput<String>>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            seed,
            attempts,
            inputs,
            cause: cause.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Directory of failed seeds, one file per test
#[derive(Debug, Clone)]
pub struct SeedStore {
    root_dir: PathBuf,
}

impl SeedStore {
    /// Open a store at the given directory, creating it if needed
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let root_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Path of the file holding `test_name`'s seed
    pub fn path_for(&self, test_name: &str) -> PathBuf {
        self.root_dir.join(format!("{}.json", sanitize(test_name)))
    }

    /// Save a failed seed, replacing any earlier one for the same test
    pub fn save(&self, failure: &FailedSeed) -> io::Result<PathBuf> {
        let path = self.path_for(&failure.test_name);
        let json = serde_json::to_string_pretty(failure)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Load the failed seed of a test, if one was saved
    pub fn load(&self, test_name: &str) -> io::Result<Option<FailedSeed>> {
        let path = self.path_for(test_name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Remove the failed seed of a test
    pub fn clear(&self, test_name: &str) -> io::Result<()> {
        let path = self.path_for(test_name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Names of all tests with a saved seed, sorted
    pub fn list(&self) -> io::Result<Vec<String>> {
        let mut tests = Vec::new();

        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<FailedSeed>(&contents) {
                Ok(failure) => tests.push(failure.test_name),
                Err(e) => debug!("Skipping unreadable seed file {}: {}", path.display(), e),
            }
        }

        tests.sort();
        Ok(tests)
    }
}

/// Turn a test name into a file stem.
fn sanitize(test_name: &str) -> String {
    test_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Configuration for failed-seed persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Directory of the seed store
    pub root_dir: PathBuf,

    /// Name the seed is stored under
    pub test_name: String,

    /// Replay a stored seed when no seed is configured
    pub replay_failed_seed: bool,

    /// Store the seed of a failing run
    pub persist_failures: bool,
}

impl PersistenceConfig {
    /// Default directory of the seed store
    pub const DEFAULT_ROOT: &'static str = ".rosewalk/failed-seeds";

    /// Persist and replay seeds for the named test in the default directory
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            root_dir: PathBuf::from(Self::DEFAULT_ROOT),
            test_name: test_name.into(),
            replay_failed_seed: true,
            persist_failures: true,
        }
    }

    /// Set the store directory
    pub fn with_root_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.root_dir = dir.into();
        self
    }

    /// Enable or disable replaying a stored seed
    pub fn replay_failed_seed(mut self, replay: bool) -> Self {
        self.replay_failed_seed = replay;
        self
    }

    /// Enable or disable storing failing seeds
    pub fn persist_failures(mut self, persist: bool) -> Self {
        self.persist_failures = persist;
        self
    }

    fn store(&self) -> io::Result<SeedStore> {
        SeedStore::new(&self.root_dir)
    }

    // Reads and removals must not create the directory.
    fn existing_store(&self) -> SeedStore {
        SeedStore {
            root_dir: self.root_dir.clone(),
        }
    }
}

/// The stored seed to replay, if replay is enabled and one exists.
pub(crate) fn replay_seed(config: &PersistenceConfig) -> Option<u64> {
    if !config.replay_failed_seed {
        return None;
    }
    match config.existing_store().load(&config.test_name) {
        Ok(Some(failure)) => {
            info!(
                "Replaying failed seed {} for {} (recorded {})",
                failure.seed, config.test_name, failure.recorded_at
            );
            Some(failure.seed)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Could not read failed seed for {}: {}", config.test_name, e);
            None
        }
    }
}

/// Store a failing run's seed if persistence of failures is enabled.
pub(crate) fn record_failure(config: &PersistenceConfig, failure: &FailedSeed) {
    if !config.persist_failures {
        return;
    }
    match config.store().and_then(|store| store.save(failure)) {
        Ok(path) => debug!("Saved failed seed {} to {}", failure.seed, path.display()),
        Err(e) => warn!("Could not save failed seed for {}: {}", config.test_name, e),
    }
}

/// Forget the stored seed of a test that now passes.
pub(crate) fn clear_failure(config: &PersistenceConfig) {
    let store = config.existing_store();
    if !store.path_for(&config.test_name).exists() {
        return;
    }
    match store.clear(&config.test_name) {
        Ok(()) => debug!("Cleared failed seed for {}", config.test_name),
        Err(e) => warn!("Could not clear failed seed for {}: {}", config.test_name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn failure(test_name: &str, seed: u64) -> FailedSeed {
        FailedSeed::new(
            test_name,
            seed,
            3,
            vec![PropertyFailureInput::new("100".to_string(), "6".to_string())],
            "Caused by: too big",
        )
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeedStore::new(temp_dir.path()).unwrap();

        assert_eq!(store.load("halving").unwrap(), None);

        let saved = failure("halving", 12345);
        let path = store.save(&saved).unwrap();
        assert_eq!(path, temp_dir.path().join("halving.json"));

        let loaded = store.load("halving").unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_save_replaces_previous_seed() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeedStore::new(temp_dir.path()).unwrap();

        store.save(&failure("t", 1)).unwrap();
        store.save(&failure("t", 2)).unwrap();
        assert_eq!(store.load("t").unwrap().unwrap().seed, 2);
    }

    #[test]
    fn test_clear_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeedStore::new(temp_dir.path()).unwrap();

        store.save(&failure("b::second", 2)).unwrap();
        store.save(&failure("a::first", 1)).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.list().unwrap(), vec!["a::first", "b::second"]);

        store.clear("a::first").unwrap();
        store.clear("never_saved").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b::second"]);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("module::test name"), "module__test_name");
        assert_eq!(sanitize("plain-name_1"), "plain-name_1");
    }

    #[test]
    fn test_replay_and_record_helpers() {
        let temp_dir = TempDir::new().unwrap();
        let config = PersistenceConfig::new("helpers").with_root_dir(temp_dir.path());

        assert_eq!(replay_seed(&config), None);
        record_failure(&config, &failure("helpers", 77));
        assert_eq!(replay_seed(&config), Some(77));
        assert_eq!(replay_seed(&config.clone().replay_failed_seed(false)), None);

        clear_failure(&config);
        assert_eq!(replay_seed(&config), None);
    }

    #[test]
    fn test_record_respects_persist_flag() {
        let temp_dir = TempDir::new().unwrap();
        let config = PersistenceConfig::new("off")
            .with_root_dir(temp_dir.path())
            .persist_failures(false);

        record_failure(&config, &failure("off", 5));
        let store = SeedStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.load("off").unwrap(), None);
    }

    #[test]
    fn test_replay_does_not_create_the_store() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("never").join("created");
        let config = PersistenceConfig::new("absent").with_root_dir(&root);

        assert_eq!(replay_seed(&config), None);
        clear_failure(&config);
        assert!(!root.exists());

        record_failure(&config, &failure("absent", 9));
        assert!(root.is_dir());
        assert_eq!(replay_seed(&config), Some(9));
    }
}
