//! In-memory fakes for the store traits.
//!
//! Used by pipeline tests and by the CLI's `--dry-run` mode. A fake built with
//! `failing(..)` rejects every write with `StoreError::Backend`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use pagecraft_core::{GeneratedComponent, Variant};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    source_file_name, ComponentRecord, MetadataStore, OutputStore, RunRecord, SourceDigest,
    StoredVariant,
};

fn location_for(run_id: &str, component: &GeneratedComponent, variant: &Variant) -> String {
    format!(
        "{}/{}/{}",
        run_id,
        component.region_id,
        source_file_name(component.kind, variant.strategy)
    )
}

/// In-memory output store.
#[derive(Debug, Default)]
pub struct MemoryOutputStore {
    sources: Mutex<HashMap<String, String>>,
    index: Mutex<Vec<StoredVariant>>,
    fail_with: Option<String>,
}

impl MemoryOutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.sources.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OutputStore for MemoryOutputStore {
    async fn put_variant(
        &self,
        run_id: &str,
        component: &GeneratedComponent,
        variant: &Variant,
    ) -> StoreResult<StoredVariant> {
        if let Some(message) = &self.fail_with {
            return Err(StoreError::Backend(message.clone()));
        }
        let location = location_for(run_id, component, variant);
        let stored = StoredVariant {
            run_id: run_id.to_string(),
            component_id: component.id,
            region_id: component.region_id.clone(),
            kind: component.kind,
            variant_id: variant.id,
            strategy: variant.strategy,
            location: location.clone(),
            digest: SourceDigest::from_bytes(variant.code.as_bytes()),
            bytes: variant.code.len(),
            stored_at: Utc::now(),
        };

        self.sources
            .lock()
            .unwrap()
            .insert(location.clone(), variant.code.clone());
        let mut index = self.index.lock().unwrap();
        index.retain(|s| s.location != location);
        index.push(stored.clone());
        Ok(stored)
    }

    async fn get_source(&self, location: &str) -> StoreResult<String> {
        self.sources
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "source",
                key: location.to_string(),
            })
    }

    async fn list(&self, run_id: &str) -> StoreResult<Vec<StoredVariant>> {
        Ok(self
            .index
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.run_id == run_id)
            .cloned()
            .collect())
    }
}

/// In-memory metadata store.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    components: Mutex<HashMap<(String, Uuid), ComponentRecord>>,
    runs: Mutex<HashMap<String, RunRecord>>,
    fail_with: Option<String>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    fn check(&self) -> StoreResult<()> {
        match &self.fail_with {
            Some(message) => Err(StoreError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn save_component(&self, record: &ComponentRecord) -> StoreResult<()> {
        self.check()?;
        let mut components = self.components.lock().unwrap();
        components.retain(|(run_id, id), existing| {
            run_id != &record.run_id
                || *id == record.component.id
                || existing.component.region_id != record.component.region_id
        });
        components.insert(
            (record.run_id.clone(), record.component.id),
            record.clone(),
        );
        Ok(())
    }

    async fn get_component(&self, run_id: &str, component_id: Uuid) -> StoreResult<ComponentRecord> {
        self.components
            .lock()
            .unwrap()
            .get(&(run_id.to_string(), component_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "component",
                key: format!("{run_id}/{component_id}"),
            })
    }

    async fn list_components(&self, run_id: &str) -> StoreResult<Vec<ComponentRecord>> {
        let mut records: Vec<ComponentRecord> = self
            .components
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.component.order);
        Ok(records)
    }

    async fn save_run(&self, run: &RunRecord) -> StoreResult<()> {
        self.check()?;
        self.runs
            .lock()
            .unwrap()
            .insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> StoreResult<RunRecord> {
        self.runs
            .lock()
            .unwrap()
            .get(run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "run",
                key: run_id.to_string(),
            })
    }
}
