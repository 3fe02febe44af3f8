//! Service-layer tests against the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{Duration, TimeZone, Utc};
use pharmacy_core::analytics::AnalyticsQuery;
use pharmacy_core::drug::{DrugId, DrugPatch, NewDrug};
use pharmacy_core::environment::Clock;
use pharmacy_core::sale::{CreateSale, SaleLine};
use pharmacy_core::service::{AnalyticsService, InventoryService, SalesService};
use pharmacy_core::{Decimal, PharmacyError};
use pharmacy_testing::mocks::{test_clock, FixedClock};
use pharmacy_testing::{fixtures, InMemoryStore};
use std::str::FromStr;
use std::sync::Arc;

struct Harness {
    store: InMemoryStore,
    clock: FixedClock,
    inventory: InventoryService<InMemoryStore>,
    sales: SalesService<InMemoryStore>,
    analytics: AnalyticsService<InMemoryStore>,
}

fn harness() -> Harness {
    let store = InMemoryStore::new();
    let clock = test_clock();
    Harness {
        inventory: InventoryService::new(store.clone(), Arc::new(clock.clone())),
        sales: SalesService::new(store.clone(), Arc::new(clock.clone())),
        analytics: AnalyticsService::new(store.clone(), Arc::new(clock.clone())),
        store,
        clock,
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn sell(lines: &[(DrugId, i64)]) -> CreateSale {
    CreateSale {
        items: lines
            .iter()
            .map(|(drug_id, quantity)| SaleLine {
                drug_id: *drug_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════════
// Sales
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn test_sale_worked_example() {
    let h = harness();
    let a = h.store.seed_drug(fixtures::drug("A", "10.00", 5)).unwrap();
    let b = h.store.seed_drug(fixtures::drug("B", "4.50", 2)).unwrap();

    let sale = h
        .sales
        .create(&fixtures::clerk(), sell(&[(a.id, 3), (b.id, 2)]))
        .await
        .unwrap();

    assert_eq!(sale.total, dec("39.00"));
    assert_eq!(sale.items.len(), 2);
    assert_eq!(sale.items[0].subtotal, dec("30.00"));
    assert_eq!(sale.items[1].subtotal, dec("9.00"));
    assert_eq!(sale.created_at, h.clock.now());
    assert_eq!(h.store.stock_of(a.id).unwrap(), Some(2));
    assert_eq!(h.store.stock_of(b.id).unwrap(), Some(0));
}

#[tokio::test]
async fn test_sale_of_unknown_drug_writes_nothing() {
    let h = harness();
    let a = h.store.seed_drug(fixtures::drug("A", "10.00", 5)).unwrap();
    let missing = DrugId::new();

    let result = h
        .sales
        .create(&fixtures::clerk(), sell(&[(a.id, 1), (missing, 1)]))
        .await;

    assert_eq!(result, Err(PharmacyError::not_found("Drug", missing)));
    assert_eq!(h.store.stock_of(a.id).unwrap(), Some(5));
    assert!(h.sales.list(&fixtures::clerk()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_sale_is_rejected() {
    let h = harness();
    let result = h.sales.create(&fixtures::clerk(), sell(&[])).await;
    assert!(matches!(result, Err(PharmacyError::InvalidInput(_))));
}

#[tokio::test]
async fn test_exact_stock_is_allowed_and_next_sale_fails() {
    let h = harness();
    let a = h.store.seed_drug(fixtures::drug("Amoxicillin", "3.00", 4)).unwrap();
    let clerk = fixtures::clerk();

    h.sales.create(&clerk, sell(&[(a.id, 4)])).await.unwrap();
    assert_eq!(h.store.stock_of(a.id).unwrap(), Some(0));

    let result = h.sales.create(&clerk, sell(&[(a.id, 1)])).await;
    assert_eq!(
        result,
        Err(PharmacyError::InsufficientStock {
            drug_name: "Amoxicillin".to_string(),
            available: 0,
            requested: 1,
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sales_of_last_unit() {
    let h = harness();
    let a = h.store.seed_drug(fixtures::drug("A", "1.00", 1)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sales = h.sales.clone();
            let id = a.id;
            tokio::spawn(async move { sales.create(&fixtures::clerk(), sell(&[(id, 1)])).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(PharmacyError::InsufficientStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(out_of_stock, 7);
    assert_eq!(h.store.stock_of(a.id).unwrap(), Some(0));
    assert_eq!(h.sales.list(&fixtures::clerk()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sale_snapshots_survive_drug_edits() {
    let h = harness();
    let admin = fixtures::admin();
    let a = h.store.seed_drug(fixtures::drug("Old name", "2.00", 10)).unwrap();

    h.sales.create(&fixtures::clerk(), sell(&[(a.id, 2)])).await.unwrap();

    let patch: DrugPatch = serde_json::from_str(r#"{"name":"New name","price":"9.99"}"#).unwrap();
    h.inventory.update(&admin, a.id, patch).await.unwrap();

    let sales = h.sales.list(&admin).await.unwrap();
    assert_eq!(sales[0].items[0].drug_name, "Old name");
    assert_eq!(sales[0].items[0].price, dec("2.00"));
    assert_eq!(sales[0].total, dec("4.00"));
}

// ═══════════════════════════════════════════════════════════
// Inventory
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn test_inventory_writes_require_admin() {
    let h = harness();
    let clerk = fixtures::clerk();
    let body = NewDrug {
        name: "Ibuprofen".to_string(),
        category: None,
        price: dec("5.00"),
        quantity: 10,
        expiry_date: None,
        description: None,
    };

    assert!(matches!(
        h.inventory.create(&clerk, body.clone()).await,
        Err(PharmacyError::Forbidden(_))
    ));
    let drug = h.inventory.create(&fixtures::admin(), body).await.unwrap();

    assert!(matches!(
        h.inventory.delete(&clerk, drug.id).await,
        Err(PharmacyError::Forbidden(_))
    ));
    assert!(matches!(
        h.inventory.update(&clerk, drug.id, DrugPatch::default()).await,
        Err(PharmacyError::Forbidden(_))
    ));
    // reads stay open
    assert_eq!(h.inventory.list(&clerk).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_and_delete_unknown_drug() {
    let h = harness();
    let admin = fixtures::admin();
    let missing = DrugId::new();

    assert!(matches!(
        h.inventory.update(&admin, missing, DrugPatch::default()).await,
        Err(PharmacyError::NotFound { .. })
    ));
    assert!(matches!(
        h.inventory.delete(&admin, missing).await,
        Err(PharmacyError::NotFound { .. })
    ));
    assert!(matches!(
        h.inventory.get(&admin, missing).await,
        Err(PharmacyError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_cascades_items_but_keeps_totals() {
    let h = harness();
    let admin = fixtures::admin();
    let a = h.store.seed_drug(fixtures::drug("A", "10.00", 5)).unwrap();
    let b = h.store.seed_drug(fixtures::drug("B", "4.50", 2)).unwrap();
    h.sales
        .create(&admin, sell(&[(a.id, 3), (b.id, 2)]))
        .await
        .unwrap();

    let deletion = h.inventory.delete(&admin, a.id).await.unwrap();
    assert_eq!(deletion.deleted_sale_items, 1);

    let sales = h.sales.list(&admin).await.unwrap();
    assert_eq!(sales[0].items.len(), 1);
    assert_eq!(sales[0].items[0].drug_id, b.id);
    assert_eq!(sales[0].total, dec("39.00"));
}

#[tokio::test]
async fn test_drugs_listed_newest_first() {
    let h = harness();
    let admin = fixtures::admin();
    for name in ["First", "Second", "Third"] {
        h.inventory
            .create(
                &admin,
                NewDrug {
                    name: name.to_string(),
                    category: None,
                    price: dec("1.00"),
                    quantity: 1,
                    expiry_date: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        h.clock.advance(Duration::minutes(1));
    }

    let names: Vec<String> = h
        .inventory
        .list(&admin)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
}

// ═══════════════════════════════════════════════════════════
// Analytics
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn test_analytics_window_and_role() {
    let h = harness();
    let admin = fixtures::admin();
    let a = h.store.seed_drug(fixtures::drug("A", "10.00", 100)).unwrap();
    let b = h.store.seed_drug(fixtures::drug("B", "4.50", 100)).unwrap();

    // ten days ago: outside a 7d window
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap();
    h.clock.set(now - Duration::days(10));
    h.sales.create(&admin, sell(&[(a.id, 50)])).await.unwrap();

    h.clock.set(now - Duration::hours(2));
    h.sales.create(&admin, sell(&[(a.id, 1), (b.id, 4)])).await.unwrap();
    h.clock.set(now);

    let query = AnalyticsQuery {
        period: Some("7d".to_string()),
        ..AnalyticsQuery::default()
    };
    let report = h.analytics.report(&admin, &query).await.unwrap();
    assert_eq!(report.summary.sales_count, 1);
    assert_eq!(report.summary.total_revenue, dec("28.00"));
    assert_eq!(report.summary.total_drugs_sold, 5);
    assert_eq!(report.summary.top_selling_drugs[0].drug_id, b.id);
    assert_eq!(report.to_date, now);

    assert!(matches!(
        h.analytics.report(&fixtures::clerk(), &query).await,
        Err(PharmacyError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_quick_stats_counts_utc_day() {
    let h = harness();
    let clerk = fixtures::clerk();
    let a = h.store.seed_drug(fixtures::drug("A", "2.00", 100)).unwrap();
    h.store.seed_drug(fixtures::drug("B", "1.00", 100)).unwrap();

    let today = Utc.with_ymd_and_hms(2026, 3, 15, 0, 5, 0).unwrap();
    h.clock.set(today - Duration::minutes(10));
    h.sales.create(&clerk, sell(&[(a.id, 5)])).await.unwrap();
    h.clock.set(today);
    h.sales.create(&clerk, sell(&[(a.id, 2)])).await.unwrap();

    let stats = h.analytics.quick_stats(&clerk).await.unwrap();
    assert_eq!(stats.total_drugs, 2);
    assert_eq!(stats.sales_today, 1);
    assert_eq!(stats.revenue_today, dec("4.00"));
}
