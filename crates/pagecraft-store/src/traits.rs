//! Storage trait definitions for PageCraft
//!
//! - `OutputStore`: generated source files, one entry per variant
//! - `MetadataStore`: one record per component plus a per-run summary
//!
//! Both traits are async and backend-agnostic. In-memory fakes live in the
//! `fakes` module; filesystem and JSON adapters in `fs` and `json`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagecraft_core::{GeneratedComponent, SemanticType, StrategyKind, Variant};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// SHA-256 hex digest of a stored source file.
///
/// The inner string is always lowercase hex, produced by `from_bytes` or
/// validated by `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceDigest(String);

impl SourceDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        SourceDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for SourceDigest {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StoreError::InvalidDigest { digest: s });
        }
        Ok(SourceDigest(s.to_ascii_lowercase()))
    }
}

impl From<SourceDigest> for String {
    fn from(d: SourceDigest) -> Self {
        d.0
    }
}

impl std::fmt::Display for SourceDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where and what one stored variant is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVariant {
    pub run_id: String,
    pub component_id: Uuid,
    pub region_id: String,
    pub kind: SemanticType,
    pub variant_id: Uuid,
    pub strategy: StrategyKind,
    /// Backend-specific key (relative path for the filesystem store).
    pub location: String,
    pub digest: SourceDigest,
    pub bytes: usize,
    pub stored_at: DateTime<Utc>,
}

/// File name for a variant's source: `HeroSemantic.tsx`.
pub fn source_file_name(kind: SemanticType, strategy: StrategyKind) -> String {
    format!("{}{}.tsx", kind.component_name(), strategy.component_suffix())
}

/// Per-component metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub run_id: String,
    pub component: GeneratedComponent,
    pub stored: Vec<StoredVariant>,
    pub saved_at: DateTime<Utc>,
}

impl ComponentRecord {
    pub fn new(run_id: &str, component: GeneratedComponent, stored: Vec<StoredVariant>) -> Self {
        Self {
            run_id: run_id.to_string(),
            component,
            stored,
            saved_at: Utc::now(),
        }
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub detected: usize,
    pub generated: usize,
    pub failed: usize,
    pub error_count: usize,
    pub version: String,
}

/// Store for generated source text.
///
/// Guarantees:
/// - `put_variant` returns the SHA-256 digest of exactly the bytes written.
/// - `get_source(location)` returns those bytes while the entry exists.
/// - Writing the same variant twice replaces the earlier entry.
#[async_trait]
pub trait OutputStore: Send + Sync {
    async fn put_variant(
        &self,
        run_id: &str,
        component: &GeneratedComponent,
        variant: &Variant,
    ) -> StoreResult<StoredVariant>;

    /// Fetch stored source by location. `StoreError::NotFound` if absent.
    async fn get_source(&self, location: &str) -> StoreResult<String>;

    /// Every variant stored for `run_id`, in write order.
    async fn list(&self, run_id: &str) -> StoreResult<Vec<StoredVariant>>;
}

/// Store for component and run metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert or replace the record for `record.component.id`.
    ///
    /// A run keeps one record per region: an older record for the same
    /// `region_id` under another component id is dropped.
    async fn save_component(&self, record: &ComponentRecord) -> StoreResult<()>;

    async fn get_component(&self, run_id: &str, component_id: Uuid) -> StoreResult<ComponentRecord>;

    /// Records for `run_id`, ordered by component order.
    async fn list_components(&self, run_id: &str) -> StoreResult<Vec<ComponentRecord>>;

    async fn save_run(&self, run: &RunRecord) -> StoreResult<()>;

    async fn get_run(&self, run_id: &str) -> StoreResult<RunRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        let d = SourceDigest::from_bytes(b"export default function A() {}");
        assert_eq!(d.as_str().len(), 64);
        assert_eq!(d.short().len(), 12);
        assert_eq!(SourceDigest::try_from(d.as_str().to_uppercase()).unwrap(), d);
    }

    #[test]
    fn invalid_digest_rejected() {
        assert!(matches!(
            SourceDigest::try_from("xyz".to_string()),
            Err(StoreError::InvalidDigest { .. })
        ));
        assert!(serde_json::from_str::<SourceDigest>("\"abc\"").is_err());
    }

    #[test]
    fn file_names_follow_component_names() {
        assert_eq!(
            source_file_name(SemanticType::Cta, StrategyKind::Accessible),
            "CallToActionAccessible.tsx"
        );
    }
}
