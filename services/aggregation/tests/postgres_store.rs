//! Postgres container store tests. Need Docker: `cargo test -- --ignored`.

use chrono::Utc;
use unitrace_aggregation::{
    coordinator::{MAX_PAGE, MAX_PAGE_SIZE},
    migration_dirs,
    store::{ContainerRecord, ContainerStore, PgContainerStore},
};
use unitrace_db::{Database, DbConfig, StoreError};
use unitrace_id::{ContainerId, Serial};
use unitrace_testing::{init_tracing, start_postgres};

#[tokio::test]
#[ignore = "requires docker"]
async fn test_pg_container_roundtrip_and_uniqueness() {
    init_tracing();
    let pg = start_postgres().await;
    let db = Database::connect(&DbConfig {
        database_url: pg.database_url.clone(),
        ..Default::default()
    })
    .await
    .unwrap();
    db.run_migrations(&migration_dirs()).await.unwrap();
    let store = PgContainerStore::new(db.pool().clone());

    let record = ContainerRecord {
        container_id: ContainerId::parse("PALLET-9").unwrap(),
        members: vec![Serial::from_number(10000001), Serial::from_number(10000002)],
        created_at: Utc::now(),
    };
    store.insert(&record).await.unwrap();

    let err = store.insert(&record).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));

    let fetched = store.get(&record.container_id).await.unwrap().unwrap();
    assert_eq!(fetched.members, record.members);
    assert!(store.exists(&record.container_id).await.unwrap());

    let page = store.list(0, 10).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].member_count, 2);
    assert_eq!(store.count().await.unwrap(), 1);

    let last_offset = (MAX_PAGE - 1) * MAX_PAGE_SIZE;
    assert!(store
        .list(last_offset, MAX_PAGE_SIZE)
        .await
        .unwrap()
        .is_empty());
}
