//! Durable record of failed errors, one JSON array per run and code.
//!
//! Layout: `<root>/<run_id>/<code>.json`. Each write replaces the file
//! atomically so a crash never leaves a half-written array behind.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::code::ErrorCode;
use super::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct FailedErrorStore {
    root: PathBuf,
}

fn read_array(path: &Path) -> Result<Vec<PipelineError>> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn by_time(errors: &mut [PipelineError]) {
    errors.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}

impl FailedErrorStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, run_id: &str, code: ErrorCode) -> PathBuf {
        self.root.join(run_id).join(format!("{}.json", code.as_str()))
    }

    /// Append `error` to its run/code file.
    pub fn record(&self, run_id: &str, error: &PipelineError) -> Result<PathBuf> {
        let path = self.file_for(run_id, error.code);
        let run_dir = self.root.join(run_id);
        fs::create_dir_all(&run_dir)?;

        let mut errors = read_array(&path)?;
        match errors.iter_mut().find(|e| e.id == error.id) {
            Some(existing) => *existing = error.clone(),
            None => errors.push(error.clone()),
        }

        let json = serde_json::to_vec_pretty(&errors)?;
        let mut tmp = NamedTempFile::new_in(&run_dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(run_id, code = %error.code, path = %path.display(), "failed error persisted");
        Ok(path)
    }

    /// Every error recorded for `run_id`, oldest first.
    pub fn load_run(&self, run_id: &str) -> Result<Vec<PipelineError>> {
        let run_dir = self.root.join(run_id);
        let entries = match fs::read_dir(&run_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut errors = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                errors.extend(read_array(&path)?);
            }
        }
        by_time(&mut errors);
        Ok(errors)
    }

    /// Run ids with persisted errors, sorted.
    pub fn runs(&self) -> Result<Vec<String>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                runs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        runs.sort();
        Ok(runs)
    }

    /// Errors from every run, oldest first.
    pub fn load_all(&self) -> Result<Vec<PipelineError>> {
        let mut errors = Vec::new();
        for run in self.runs()? {
            errors.extend(self.load_run(&run)?);
        }
        by_time(&mut errors);
        Ok(errors)
    }

    /// Delete a run's error files. Missing runs are not an error.
    pub fn clear_run(&self, run_id: &str) -> Result<()> {
        match fs::remove_dir_all(self.root.join(run_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Phase;

    fn store() -> (tempfile::TempDir, FailedErrorStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FailedErrorStore::new(dir.path().join("failed")).unwrap();
        (dir, store)
    }

    #[test]
    fn writes_one_array_per_code() {
        let (_dir, store) = store();
        let a = PipelineError::new(ErrorCode::StorageFailed, Phase::Saving, "a");
        let b = PipelineError::new(ErrorCode::StorageFailed, Phase::Saving, "b");
        let c = PipelineError::new(ErrorCode::SemanticFailed, Phase::GeneratingVariants, "c");

        let path = store.record("run-1", &a).unwrap();
        store.record("run-1", &b).unwrap();
        store.record("run-1", &c).unwrap();

        assert!(path.ends_with("run-1/storage_failed.json"));
        let on_disk: Vec<PipelineError> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(store.load_run("run-1").unwrap().len(), 3);
    }

    #[test]
    fn rerecording_replaces_by_id() {
        let (_dir, store) = store();
        let mut a = PipelineError::new(ErrorCode::ScreenshotFailed, Phase::CapturingScreenshots, "a");
        store.record("r", &a).unwrap();
        a.record_retry();
        store.record("r", &a).unwrap();
        let loaded = store.load_run("r").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].retry_count, 1);
    }

    #[test]
    fn load_all_merges_runs() {
        let (_dir, store) = store();
        store
            .record("r1", &PipelineError::new(ErrorCode::Unknown, Phase::Detecting, "x"))
            .unwrap();
        store
            .record("r2", &PipelineError::new(ErrorCode::Unknown, Phase::Detecting, "y"))
            .unwrap();
        assert_eq!(store.runs().unwrap(), vec!["r1".to_string(), "r2".to_string()]);
        assert_eq!(store.load_all().unwrap().len(), 2);

        store.clear_run("r1").unwrap();
        store.clear_run("missing").unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn missing_run_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load_run("nope").unwrap().is_empty());
    }
}
