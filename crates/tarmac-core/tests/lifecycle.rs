//! End-to-end lifecycle coverage over the in-memory store and scripted
//! builders.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tarmac_core::{
    ArchiveBuilder, ArchiveRecord, ArchiveStatus, LifecycleError, LifecycleManager, NewArchive,
    RecordStore,
};
use tarmac_test_support::{MemoryStore, RecordingBuilder, StaticBuilder, fixtures};

fn checkout(prefix: Option<&str>) -> NewArchive {
    NewArchive::Checkout {
        workdir: "/repo".into(),
        refid: "abc123".into(),
        prefix: prefix.map(str::to_string),
    }
}

/// Poll until the record leaves `Building` or the test budget expires.
async fn settle(manager: &LifecycleManager, id: &str) -> Result<ArchiveRecord> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let record = manager.get(id).await?;
        if record.status != ArchiveStatus::Building {
            return Ok(record);
        }
        if tokio::time::Instant::now() >= deadline {
            bail!("archive {id} never settled");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn create_returns_building_record_with_derived_path() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let manager = LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticBuilder::succeeding("")),
        base.path(),
    );

    let record = manager.create(checkout(None)).await?;
    assert!(!record.id.is_empty());
    assert_eq!(record.status, ArchiveStatus::Building);
    assert!(record.log.is_empty());
    assert_eq!(record.created_at, record.updated_at);
    assert_eq!(
        record.path,
        base.path().join(format!("{}.tar.gz", record.id))
    );
    Ok(())
}

#[tokio::test]
async fn successful_build_settles_ready_with_captured_log() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::new(StaticBuilder::succeeding("archived 12 objects")),
        base.path(),
    );

    let created = manager.create(checkout(None)).await?;
    let settled = settle(&manager, &created.id).await?;
    assert_eq!(settled.status, ArchiveStatus::Ready);
    assert_eq!(settled.log, "archived 12 objects");
    assert!(settled.updated_at > created.updated_at);

    // Exactly one transition out of `Building`; nothing reverts.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.updates_applied(), 1);
    assert_eq!(
        manager.get(&created.id).await?.status,
        ArchiveStatus::Ready
    );
    Ok(())
}

#[tokio::test]
async fn failing_build_settles_error_with_failure_detail() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::new(StaticBuilder::failing("fatal: not a valid ref")),
        base.path(),
    );

    let created = manager.create(checkout(None)).await?;
    let settled = settle(&manager, &created.id).await?;
    assert_eq!(settled.status, ArchiveStatus::Error);
    assert_eq!(settled.log, "fatal: not a valid ref");
    assert!(!settled.path.exists());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.updates_applied(), 1);
    Ok(())
}

#[tokio::test]
async fn upload_persists_exact_bytes() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let manager = LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticBuilder::succeeding("")),
        base.path(),
    );

    let created = manager
        .create(NewArchive::Upload {
            name: "app.tar.gz".into(),
            payload: Box::new(b"hello world!".as_slice()),
        })
        .await?;
    let settled = settle(&manager, &created.id).await?;
    assert_eq!(settled.status, ArchiveStatus::Ready);
    assert_eq!(tokio::fs::read(&settled.path).await?, b"hello world!");
    Ok(())
}

#[tokio::test]
async fn builder_receives_normalized_prefix_and_output_path() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let builder = Arc::new(RecordingBuilder::new());
    let manager = LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        Arc::clone(&builder) as Arc<dyn ArchiveBuilder>,
        base.path(),
    );

    let created = manager.create(checkout(Some("proj"))).await?;
    settle(&manager, &created.id).await?;

    let request = builder
        .last_request()
        .ok_or_else(|| anyhow::anyhow!("builder never invoked"))?;
    assert_eq!(request.workdir, std::path::PathBuf::from("/repo"));
    assert_eq!(request.refid, "abc123");
    assert_eq!(request.normalized_prefix().as_deref(), Some("proj/"));
    assert_eq!(request.output, created.path);
    assert_eq!(
        request.output,
        base.path().join(format!("{}.tar.gz", created.id))
    );
    Ok(())
}

#[tokio::test]
async fn get_unknown_id_is_not_found() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let manager = LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticBuilder::succeeding("")),
        base.path(),
    );

    let err = manager.get("no-such-archive").await.expect_err("must miss");
    assert!(matches!(err, LifecycleError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn store_outage_is_reported_as_infrastructure_error() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::new(StaticBuilder::succeeding("")),
        base.path(),
    );

    store.set_fail_lookups(true);
    let err = manager.get("anything").await.expect_err("store is down");
    assert!(matches!(err, LifecycleError::Store { .. }));
    Ok(())
}

#[tokio::test]
async fn destroy_tombstones_record_and_removes_payload() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let manager = LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticBuilder::succeeding("done")),
        base.path(),
    );

    let created = manager.create(checkout(None)).await?;
    let ready = settle(&manager, &created.id).await?;
    assert!(ready.path.exists());

    manager.destroy(&created.id).await?;
    let destroyed = manager.get(&created.id).await?;
    assert_eq!(destroyed.status, ArchiveStatus::Destroyed);
    assert!(destroyed.updated_at > ready.updated_at);
    assert!(!destroyed.path.exists());

    // The tombstone keeps answering; a second destroy finds nothing left to
    // remove and succeeds.
    manager.destroy(&created.id).await?;
    assert_eq!(
        manager.get(&created.id).await?.status,
        ArchiveStatus::Destroyed
    );
    Ok(())
}

#[tokio::test]
async fn destroy_of_errored_archive_preserves_diagnostics() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::new(StaticBuilder::failing("fatal: not a valid ref")),
        base.path(),
    );

    let created = manager.create(checkout(None)).await?;
    let settled = settle(&manager, &created.id).await?;
    assert_eq!(settled.status, ArchiveStatus::Error);

    // Terminal records admit no further transition; the failure detail
    // stays available for later reads.
    manager.destroy(&created.id).await?;
    let after = manager.get(&created.id).await?;
    assert_eq!(after.status, ArchiveStatus::Error);
    assert_eq!(after.log, "fatal: not a valid ref");
    assert_eq!(store.updates_applied(), 1);
    Ok(())
}

#[tokio::test]
async fn destroy_unknown_id_is_not_found() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let manager = LifecycleManager::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticBuilder::succeeding("")),
        base.path(),
    );

    let err = manager.destroy("missing").await.expect_err("must miss");
    assert!(matches!(err, LifecycleError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn destroy_with_unreachable_store_leaves_payload_in_place() -> Result<()> {
    let base = fixtures::temp_base_dir()?;
    let store = Arc::new(MemoryStore::new());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::new(StaticBuilder::succeeding("done")),
        base.path(),
    );

    let created = manager.create(checkout(None)).await?;
    let ready = settle(&manager, &created.id).await?;

    store.set_fail_updates(true);
    let err = manager.destroy(&created.id).await.expect_err("store down");
    assert!(matches!(err, LifecycleError::Store { .. }));
    // Status update precedes removal, so a failed update never unlinks.
    assert!(ready.path.exists());
    Ok(())
}
