//! pagecraft-store: persistence for generated components
//!
//! - [`OutputStore`]: generated `.tsx` sources, addressed by location and
//!   tagged with a SHA-256 [`SourceDigest`]
//! - [`MetadataStore`]: one [`ComponentRecord`] per component and one
//!   [`RunRecord`] per run
//!
//! Adapters: [`FsOutputStore`], [`JsonMetadataStore`]. In-memory fakes for
//! tests: [`MemoryOutputStore`], [`MemoryMetadataStore`].

pub mod error;
pub mod fakes;
pub mod fs;
pub mod json;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fakes::{MemoryMetadataStore, MemoryOutputStore};
pub use fs::FsOutputStore;
pub use json::JsonMetadataStore;
pub use traits::{
    source_file_name, ComponentRecord, MetadataStore, OutputStore, RunRecord, SourceDigest,
    StoredVariant,
};
