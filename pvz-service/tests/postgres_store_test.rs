//! Store invariants against a live PostgreSQL.
//!
//! Requires `TEST_DATABASE_URL`; run with `cargo test -- --ignored`.

mod common;

use common::{init_tracing, test_config};
use pvz_service::models::{City, PickupPoint, Product, ProductType, Reception, ReceptionStatus};
use pvz_service::repository::{Stores, RECEPTION_ALREADY_OPEN, RECEPTION_CLOSED};
use pvz_service::services::{Database, ProductService, ReceptionService};
use serial_test::serial;
use service_core::error::AppError;
use std::sync::Arc;

async fn setup() -> (Arc<Database>, Stores, PickupPoint) {
    init_tracing();
    let config = test_config();
    let db = Database::new(&config.database.url, 10, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    let db = Arc::new(db);
    let stores = Stores::postgres(db.clone());
    let pvz = PickupPoint::new(City::Kazan);
    stores.pvz.create_pvz(&pvz).await.unwrap();
    (db, stores, pvz)
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn test_second_open_reception_is_rejected_by_index() {
    let (_db, stores, pvz) = setup().await;

    stores
        .receptions
        .create_reception(&Reception::open(pvz.id))
        .await
        .unwrap();

    // Bypasses the service-level check: the partial unique index must hold on its own.
    let err = stores
        .receptions
        .create_reception(&Reception::open(pvz.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref e) if e.to_string() == RECEPTION_ALREADY_OPEN));
    assert_eq!(stores.receptions.get_all_for_pvz(pvz.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires database
#[serial]
async fn test_concurrent_starts_admit_exactly_one() {
    let (_db, stores, pvz) = setup().await;
    let service = ReceptionService::new(stores.receptions.clone());

    let attempts = (0..8).map(|_| {
        let service = service.clone();
        let pvz_id = pvz.id;
        tokio::spawn(async move { service.start_reception(pvz_id).await })
    });
    let results = futures::future::join_all(attempts).await;

    let winners = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter(|result| match result {
            Ok(_) => true,
            Err(e) => {
                assert!(matches!(e, AppError::Conflict(_)), "unexpected error: {}", e);
                false
            }
        })
        .count();
    assert_eq!(winners, 1);

    let all = stores.receptions.get_all_for_pvz(pvz.id).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, ReceptionStatus::InProgress);
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn test_products_are_removed_newest_first() {
    let (_db, stores, pvz) = setup().await;
    let receptions = ReceptionService::new(stores.receptions.clone());
    let products = ProductService::new(stores.products.clone(), stores.receptions.clone());

    let reception = receptions.start_reception(pvz.id).await.unwrap();

    let first = Product::new(ProductType::Electronics, reception.id);
    // Same timestamp: the insertion sequence breaks the tie.
    let mut second = Product::new(ProductType::Clothes, reception.id);
    second.date_time = first.date_time;
    let third = Product::new(ProductType::Shoes, reception.id);
    for product in [&first, &second, &third] {
        products.add_product(product.clone()).await.unwrap();
    }

    let listed = products.list_products(reception.id).await.unwrap();
    assert_eq!(listed, vec![first.clone(), second.clone(), third.clone()]);

    assert_eq!(products.remove_last_product(reception.id).await.unwrap(), third);
    assert_eq!(products.remove_last_product(reception.id).await.unwrap(), second);
    assert_eq!(products.remove_last_product(reception.id).await.unwrap(), first);

    let err = products.remove_last_product(reception.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn test_closed_reception_rejects_writes_at_store_level() {
    let (_db, stores, pvz) = setup().await;
    let reception = Reception::open(pvz.id);
    stores.receptions.create_reception(&reception).await.unwrap();
    let kept = Product::new(ProductType::Shoes, reception.id);
    stores.products.append_product(&kept).await.unwrap();

    let closed = stores.receptions.close_most_recent(pvz.id).await.unwrap();
    assert_eq!(closed.id, reception.id);
    assert_eq!(closed.status, ReceptionStatus::Closed);
    assert!(!stores.receptions.is_open(reception.id).await.unwrap());

    let err = stores.receptions.close_most_recent(pvz.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = stores
        .products
        .append_product(&Product::new(ProductType::Clothes, reception.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref e) if e.to_string() == RECEPTION_CLOSED));

    let err = stores
        .products
        .remove_most_recent_product(reception.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert_eq!(stores.products.list_products(reception.id).await.unwrap(), vec![kept]);
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn test_reception_for_unknown_point_is_not_found() {
    let (_db, stores, _pvz) = setup().await;
    let err = stores
        .receptions
        .create_reception(&Reception::open(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn test_health_ping() {
    let (db, stores, _pvz) = setup().await;
    db.health_check().await.unwrap();
    stores.health.ping().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn test_equal_reception_timestamps_resolve_to_insertion_order() {
    let (_db, stores, pvz) = setup().await;

    let first = Reception::open(pvz.id);
    stores.receptions.create_reception(&first).await.unwrap();
    stores.receptions.close_most_recent(pvz.id).await.unwrap();

    let mut second = Reception::open(pvz.id);
    second.date_time = first.date_time;
    stores.receptions.create_reception(&second).await.unwrap();

    let latest = stores.receptions.get_most_recent(pvz.id).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);

    let all = stores.receptions.get_all_for_pvz(pvz.id).await.unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let closed = stores.receptions.close_most_recent(pvz.id).await.unwrap();
    assert_eq!(closed.id, second.id);
}
