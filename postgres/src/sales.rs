use crate::drugs::{DrugRow, DRUG_COLUMNS};
use crate::error::db_error;
use crate::PgStore;
use chrono::{DateTime, Utc};
use pharmacy_core::analytics::DateRange;
use pharmacy_core::drug::{Drug, DrugId};
use pharmacy_core::repository::SaleRepository;
use pharmacy_core::sale::{plan_sale, NewSale, Sale, SaleId, SaleItem, SaleItemId};
use pharmacy_core::{PharmacyError, Result};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    total: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    id: Uuid,
    sale_id: Uuid,
    drug_id: Uuid,
    drug_name: String,
    quantity: i32,
    price: Decimal,
    subtotal: Decimal,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        Self {
            id: SaleItemId(row.id),
            sale_id: SaleId(row.sale_id),
            drug_id: DrugId(row.drug_id),
            drug_name: row.drug_name,
            quantity: row.quantity,
            price: row.price,
            subtotal: row.subtotal,
        }
    }
}

/// Attach items (already in position order) to their sales.
async fn with_items(pool: &PgPool, sales: Vec<SaleRow>) -> Result<Vec<Sale>> {
    let ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
    let rows: Vec<SaleItemRow> = sqlx::query_as(
        r"
        SELECT id, sale_id, drug_id, drug_name, quantity, price, subtotal
        FROM sale_items
        WHERE sale_id = ANY($1)
        ORDER BY sale_id, position
        ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(db_error("load sale items"))?;

    let mut items: HashMap<Uuid, Vec<SaleItem>> = HashMap::new();
    for row in rows {
        items.entry(row.sale_id).or_default().push(row.into());
    }

    Ok(sales
        .into_iter()
        .map(|sale| Sale {
            id: SaleId(sale.id),
            total: sale.total,
            created_at: sale.created_at,
            items: items.remove(&sale.id).unwrap_or_default(),
        })
        .collect())
}

impl SaleRepository for PgStore {
    #[tracing::instrument(skip_all, fields(sale_id = %sale.id))]
    async fn create_sale(&self, sale: &NewSale) -> Result<Sale> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        // Lock every referenced drug in id order; concurrent sales touching the
        // same drugs queue here and re-read stock once the lock is theirs.
        let mut ids: Vec<Uuid> = sale.lines.iter().map(|line| line.drug_id.0).collect();
        ids.sort_unstable();
        ids.dedup();

        let rows: Vec<DrugRow> = sqlx::query_as(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("lock drugs"))?;

        let catalog: HashMap<DrugId, Drug> = rows
            .into_iter()
            .map(|row| {
                let drug = Drug::from(row);
                (drug.id, drug)
            })
            .collect();

        // any error from here on drops `tx`, which rolls back
        let plan = plan_sale(&sale.lines, &catalog)?;
        let decrements = plan.decrements.clone();
        let record = plan.into_sale(sale.id, sale.created_at);

        sqlx::query("INSERT INTO sales (id, total, created_at) VALUES ($1, $2, $3)")
            .bind(record.id.0)
            .bind(record.total)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("insert sale"))?;

        for (position, item) in (0i32..).zip(&record.items) {
            sqlx::query(
                r"
                INSERT INTO sale_items
                    (id, sale_id, drug_id, position, drug_name, quantity, price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(item.id.0)
            .bind(item.sale_id.0)
            .bind(item.drug_id.0)
            .bind(position)
            .bind(&item.drug_name)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await
            .map_err(db_error("insert sale item"))?;
        }

        for (drug_id, quantity) in decrements {
            let updated = sqlx::query(
                r"
                UPDATE drugs
                SET quantity = quantity - $2, updated_at = $3
                WHERE id = $1 AND quantity >= $2
                ",
            )
            .bind(drug_id.0)
            .bind(quantity)
            .bind(sale.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("decrement stock"))?
            .rows_affected();

            if updated == 0 {
                let (drug_name, available) = catalog
                    .get(&drug_id)
                    .map_or_else(|| (drug_id.to_string(), 0), |d| (d.name.clone(), i64::from(d.quantity)));
                tracing::warn!(%drug_id, "Stock changed between check and write");
                return Err(PharmacyError::InsufficientStock {
                    drug_name,
                    available,
                    requested: i64::from(quantity),
                });
            }
        }

        tx.commit().await.map_err(db_error("commit sale"))?;
        Ok(record)
    }

    async fn list_sales(&self) -> Result<Vec<Sale>> {
        let sales: Vec<SaleRow> =
            sqlx::query_as("SELECT id, total, created_at FROM sales ORDER BY created_at DESC, id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("list sales"))?;

        with_items(&self.pool, sales).await
    }

    async fn sales_between(&self, range: DateRange) -> Result<Vec<Sale>> {
        let sales: Vec<SaleRow> = sqlx::query_as(
            r"
            SELECT id, total, created_at
            FROM sales
            WHERE created_at >= $1 AND created_at <= $2
            ORDER BY created_at DESC, id
            ",
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("load sales in range"))?;

        with_items(&self.pool, sales).await
    }
}
