//! Contract tests for the store traits.
//!
//! Every adapter must satisfy the same behavior: digests match written bytes,
//! re-writes replace, lookups of unknown keys return `NotFound`.

use pagecraft_core::{
    BoundingBox, GeneratedComponent, Region, SemanticType, StrategyKind, SynthesisOutcome,
    Variant,
};
use pagecraft_store::{
    ComponentRecord, FsOutputStore, JsonMetadataStore, MemoryMetadataStore, MemoryOutputStore,
    MetadataStore, OutputStore, RunRecord, SourceDigest, StoreError,
};
use tempfile::tempdir;

fn component(kind: SemanticType, order: usize) -> GeneratedComponent {
    let region = Region::new(
        kind,
        order,
        BoundingBox::new(0.0, 0.0, 1280.0, 400.0),
        "<section></section>".to_string(),
    );
    let outcome = SynthesisOutcome {
        variants: vec![
            Variant::new(
                StrategyKind::Semantic,
                "semantic",
                "export default function HeroSemantic() { return <section />; }".to_string(),
            ),
            Variant::new(
                StrategyKind::Accessible,
                "accessible",
                "export default function HeroAccessible() { return <section />; }".to_string(),
            ),
        ],
        metadata: Default::default(),
    };
    GeneratedComponent::from_outcome(&region, outcome)
}

fn run_record(run_id: &str) -> RunRecord {
    let now = chrono::Utc::now();
    RunRecord {
        run_id: run_id.to_string(),
        source: "page.json".to_string(),
        started_at: now,
        finished_at: now,
        success: true,
        detected: 2,
        generated: 2,
        failed: 0,
        error_count: 0,
        version: "test".to_string(),
    }
}

// ---------------------------------------------------------------------------
// OutputStore contract
// ---------------------------------------------------------------------------

async fn output_store_contract(store: &dyn OutputStore) {
    let hero = component(SemanticType::Hero, 0);
    let semantic = &hero.variants()[0];

    let stored = store.put_variant("run-1", &hero, semantic).await.unwrap();
    assert_eq!(stored.digest, SourceDigest::from_bytes(semantic.code.as_bytes()));
    assert_eq!(stored.bytes, semantic.code.len());
    assert!(stored.location.ends_with("HeroSemantic.tsx"));
    assert_eq!(store.get_source(&stored.location).await.unwrap(), semantic.code);

    // same variant again replaces
    store.put_variant("run-1", &hero, semantic).await.unwrap();
    store
        .put_variant("run-1", &hero, &hero.variants()[1])
        .await
        .unwrap();
    let listed = store.list("run-1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].strategy, StrategyKind::Accessible);

    assert!(store.list("run-2").await.unwrap().is_empty());
    assert!(matches!(
        store.get_source("run-1/nope/Missing.tsx").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn memory_output_store_contract() {
    output_store_contract(&MemoryOutputStore::new()).await;
}

#[tokio::test]
async fn fs_output_store_contract() {
    let dir = tempdir().unwrap();
    let store = FsOutputStore::new(dir.path()).await.unwrap();
    output_store_contract(&store).await;
    assert!(dir.path().join("run-1/hero-0/HeroSemantic.tsx").is_file());
    assert!(dir.path().join("run-1/index.json").is_file());
}

#[tokio::test]
async fn fs_output_store_detects_tampering() {
    let dir = tempdir().unwrap();
    let store = FsOutputStore::new(dir.path()).await.unwrap();
    let hero = component(SemanticType::Hero, 0);
    let stored = store
        .put_variant("run-1", &hero, &hero.variants()[0])
        .await
        .unwrap();
    store.verify(&stored).await.unwrap();

    std::fs::write(store.path_for(&stored.location).unwrap(), "tampered").unwrap();
    assert!(matches!(
        store.verify(&stored).await,
        Err(StoreError::DigestMismatch { .. })
    ));
}

#[tokio::test]
async fn fs_output_store_rejects_escaping_keys() {
    let dir = tempdir().unwrap();
    let store = FsOutputStore::new(dir.path()).await.unwrap();
    assert!(store.get_source("../outside.tsx").await.is_err());
    let hero = component(SemanticType::Hero, 0);
    assert!(store
        .put_variant("../escape", &hero, &hero.variants()[0])
        .await
        .is_err());
}

#[tokio::test]
async fn failing_output_fake_rejects_writes() {
    let store = MemoryOutputStore::failing("disk full");
    let hero = component(SemanticType::Hero, 0);
    let err = store
        .put_variant("run-1", &hero, &hero.variants()[0])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(store.is_empty());
}

// ---------------------------------------------------------------------------
// MetadataStore contract
// ---------------------------------------------------------------------------

async fn metadata_store_contract(store: &dyn MetadataStore) {
    let footer = component(SemanticType::Footer, 3);
    let hero = component(SemanticType::Hero, 1);

    store
        .save_component(&ComponentRecord::new("run-1", footer.clone(), vec![]))
        .await
        .unwrap();
    store
        .save_component(&ComponentRecord::new("run-1", hero.clone(), vec![]))
        .await
        .unwrap();

    let listed = store.list_components("run-1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].component.kind, SemanticType::Hero);
    assert_eq!(listed[1].component.kind, SemanticType::Footer);

    let fetched = store.get_component("run-1", hero.id).await.unwrap();
    assert_eq!(fetched.component, hero);

    // saving again replaces rather than duplicates
    let mut selected = hero.clone();
    let id = selected.variants()[1].id;
    assert!(selected.select_variant(id));
    store
        .save_component(&ComponentRecord::new("run-1", selected, vec![]))
        .await
        .unwrap();
    assert_eq!(store.list_components("run-1").await.unwrap().len(), 2);
    let fetched = store.get_component("run-1", hero.id).await.unwrap();
    assert_eq!(fetched.component.selected_variant().map(|v| v.id), Some(id));

    // a regenerated region supersedes its earlier record
    let regenerated = component(SemanticType::Hero, 1);
    assert_ne!(regenerated.id, hero.id);
    store
        .save_component(&ComponentRecord::new("run-1", regenerated.clone(), vec![]))
        .await
        .unwrap();
    let listed = store.list_components("run-1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].component.id, regenerated.id);
    assert!(matches!(
        store.get_component("run-1", hero.id).await,
        Err(StoreError::NotFound { .. })
    ));

    assert!(matches!(
        store.get_component("run-1", uuid::Uuid::new_v4()).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(store.list_components("run-9").await.unwrap().is_empty());

    store.save_run(&run_record("run-1")).await.unwrap();
    assert_eq!(store.get_run("run-1").await.unwrap().generated, 2);
    assert!(matches!(
        store.get_run("run-9").await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn memory_metadata_store_contract() {
    metadata_store_contract(&MemoryMetadataStore::new()).await;
}

#[tokio::test]
async fn json_metadata_store_contract() {
    let dir = tempdir().unwrap();
    let store = JsonMetadataStore::new(dir.path()).await.unwrap();
    metadata_store_contract(&store).await;
    assert_eq!(store.runs().await.unwrap(), vec!["run-1".to_string()]);
}

#[tokio::test]
async fn json_metadata_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let hero = component(SemanticType::Hero, 0);
    {
        let store = JsonMetadataStore::new(dir.path()).await.unwrap();
        store
            .save_component(&ComponentRecord::new("run-1", hero.clone(), vec![]))
            .await
            .unwrap();
    }
    let reopened = JsonMetadataStore::new(dir.path()).await.unwrap();
    let record = reopened.get_component("run-1", hero.id).await.unwrap();
    assert_eq!(record.component.variants().len(), 2);
}
