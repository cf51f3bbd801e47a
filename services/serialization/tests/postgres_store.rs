//! Postgres identifier store tests. Need Docker: `cargo test -- --ignored`.

use std::sync::Arc;

use unitrace_db::{Database, DbConfig};
use unitrace_serialization::{
    allocator::{AllocationRequest, AllocationStrategy, Allocator},
    lifecycle::{Status, StoredStatus},
    migration_dirs,
    store::{IdentifierStore, PgIdentifierStore},
};
use unitrace_service::ServiceError;
use unitrace_testing::{init_tracing, start_postgres};

fn request() -> AllocationRequest {
    AllocationRequest {
        product_code: Some("09506000134352".into()),
        batch: Some("LOT-PG".into()),
        manufacture_date: Some("2025-01-01".into()),
        expiry_date: Some("2026-06-30".into()),
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_pg_allocation_and_lifecycle() {
    init_tracing();
    let pg = start_postgres().await;
    let db = Database::connect(&DbConfig {
        database_url: pg.database_url.clone(),
        ..Default::default()
    })
    .await
    .unwrap();
    db.run_migrations(&migration_dirs()).await.unwrap();

    let store = Arc::new(PgIdentifierStore::new(db.pool().clone()));
    let allocator = Allocator::new(store.clone(), AllocationStrategy::Counter);
    allocator.prime().await.unwrap();

    let first = allocator.allocate(request()).await.unwrap();
    let second = allocator.allocate(request()).await.unwrap();
    assert_eq!(first.serial.as_str(), "10000001");
    assert_eq!(second.serial.as_str(), "10000002");

    let updated = allocator
        .transition(first.serial.as_str(), Some("PRINTED"))
        .await
        .unwrap();
    assert_eq!(updated.status, StoredStatus::Known(Status::Printed));

    let err = allocator
        .transition(first.serial.as_str(), Some("GENERATED"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    let stats = allocator.stats().await.unwrap();
    assert_eq!((stats.generated, stats.printed, stats.total), (1, 1, 2));

    // Scan allocation picks up where the counter left off.
    let scan = Allocator::new(store.clone(), AllocationStrategy::Scan);
    assert_eq!(
        scan.allocate(request()).await.unwrap().serial.as_str(),
        "10000003"
    );

    // The counter is behind now; the unique key turns the clash into a conflict.
    let err = allocator.allocate(request()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    store.health_check().await.unwrap();
}
