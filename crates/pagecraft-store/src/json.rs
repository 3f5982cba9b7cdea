//! JSON-file metadata store.
//!
//! Layout: `<root>/<run_id>/components/<component_id>.json` and
//! `<root>/<run_id>/run.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::fs::{check_relative, write_atomic};
use crate::traits::{ComponentRecord, MetadataStore, RunRecord};

#[derive(Debug, Clone)]
pub struct JsonMetadataStore {
    root: PathBuf,
}

async fn read_json<T: DeserializeOwned>(
    path: &Path,
    kind: &'static str,
    key: String,
) -> StoreResult<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound { kind, key }),
        Err(e) => Err(e.into()),
    }
}

impl JsonMetadataStore {
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn components_dir(&self, run_id: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(check_relative(run_id)?).join("components"))
    }

    fn run_path(&self, run_id: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(check_relative(run_id)?).join("run.json"))
    }

    /// Run ids with a saved run record, sorted.
    pub async fn runs(&self) -> StoreResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().join("run.json").is_file() {
                runs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        runs.sort();
        Ok(runs)
    }
}

#[async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn save_component(&self, record: &ComponentRecord) -> StoreResult<()> {
        let path = self
            .components_dir(&record.run_id)?
            .join(format!("{}.json", record.component.id));
        let superseded: Vec<Uuid> = self
            .list_components(&record.run_id)
            .await?
            .into_iter()
            .filter(|r| {
                r.component.region_id == record.component.region_id
                    && r.component.id != record.component.id
            })
            .map(|r| r.component.id)
            .collect();

        write_atomic(&path, &serde_json::to_vec_pretty(record)?)?;
        let dir = self.components_dir(&record.run_id)?;
        for id in &superseded {
            match tokio::fs::remove_file(dir.join(format!("{id}.json"))).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(
            run_id = %record.run_id,
            component_id = %record.component.id,
            region_id = %record.component.region_id,
            superseded = superseded.len(),
            "component record saved"
        );
        Ok(())
    }

    async fn get_component(&self, run_id: &str, component_id: Uuid) -> StoreResult<ComponentRecord> {
        let path = self
            .components_dir(run_id)?
            .join(format!("{component_id}.json"));
        read_json(&path, "component", format!("{run_id}/{component_id}")).await
    }

    async fn list_components(&self, run_id: &str) -> StoreResult<Vec<ComponentRecord>> {
        let dir = self.components_dir(run_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            records.push(serde_json::from_slice::<ComponentRecord>(&bytes)?);
        }
        records.sort_by_key(|r| r.component.order);
        Ok(records)
    }

    async fn save_run(&self, run: &RunRecord) -> StoreResult<()> {
        let path = self.run_path(&run.run_id)?;
        write_atomic(&path, &serde_json::to_vec_pretty(run)?)?;
        debug!(run_id = %run.run_id, success = run.success, "run record saved");
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> StoreResult<RunRecord> {
        let path = self.run_path(run_id)?;
        read_json(&path, "run", run_id.to_string()).await
    }
}
