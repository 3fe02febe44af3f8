use crate::error::db_error;
use crate::PgStore;
use chrono::{DateTime, NaiveDate, Utc};
use pharmacy_core::drug::{Drug, DrugDeletion, DrugId, ValidDrugPatch};
use pharmacy_core::repository::DrugRepository;
use pharmacy_core::{PharmacyError, Result};
use rust_decimal::Decimal;
use uuid::Uuid;

pub(crate) const DRUG_COLUMNS: &str =
    "id, name, category, price, quantity, expiry_date, description, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct DrugRow {
    id: Uuid,
    name: String,
    category: Option<String>,
    price: Decimal,
    quantity: i32,
    expiry_date: Option<NaiveDate>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DrugRow> for Drug {
    fn from(row: DrugRow) -> Self {
        Self {
            id: DrugId(row.id),
            name: row.name,
            category: row.category,
            price: row.price,
            quantity: row.quantity,
            expiry_date: row.expiry_date,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl DrugRepository for PgStore {
    async fn list_drugs(&self) -> Result<Vec<Drug>> {
        let rows: Vec<DrugRow> = sqlx::query_as(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list drugs"))?;

        Ok(rows.into_iter().map(Drug::from).collect())
    }

    async fn get_drug(&self, id: DrugId) -> Result<Option<Drug>> {
        let row: Option<DrugRow> =
            sqlx::query_as(&format!("SELECT {DRUG_COLUMNS} FROM drugs WHERE id = $1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("get drug"))?;

        Ok(row.map(Drug::from))
    }

    async fn insert_drug(&self, drug: &Drug) -> Result<Drug> {
        let row: DrugRow = sqlx::query_as(&format!(
            r"
            INSERT INTO drugs
                (id, name, category, price, quantity, expiry_date, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DRUG_COLUMNS}
            "
        ))
        .bind(drug.id.0)
        .bind(&drug.name)
        .bind(&drug.category)
        .bind(drug.price)
        .bind(drug.quantity)
        .bind(drug.expiry_date)
        .bind(&drug.description)
        .bind(drug.created_at)
        .bind(drug.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("insert drug"))?;

        Ok(row.into())
    }

    async fn update_drug(
        &self,
        id: DrugId,
        patch: &ValidDrugPatch,
        now: DateTime<Utc>,
    ) -> Result<Drug> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        // lock against concurrent sales so the patch applies to current stock
        let row: Option<DrugRow> = sqlx::query_as(&format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock drug"))?;

        let mut drug: Drug = row
            .ok_or_else(|| PharmacyError::not_found("Drug", id))?
            .into();
        patch.apply(&mut drug, now);

        let row: DrugRow = sqlx::query_as(&format!(
            r"
            UPDATE drugs
            SET name = $2, category = $3, price = $4, quantity = $5,
                expiry_date = $6, description = $7, updated_at = $8
            WHERE id = $1
            RETURNING {DRUG_COLUMNS}
            "
        ))
        .bind(drug.id.0)
        .bind(&drug.name)
        .bind(&drug.category)
        .bind(drug.price)
        .bind(drug.quantity)
        .bind(drug.expiry_date)
        .bind(&drug.description)
        .bind(drug.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("update drug"))?;

        tx.commit().await.map_err(db_error("commit drug update"))?;
        Ok(row.into())
    }

    async fn delete_drug(&self, id: DrugId) -> Result<DrugDeletion> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM drugs WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("lock drug"))?;
        if exists.is_none() {
            return Err(PharmacyError::not_found("Drug", id));
        }

        let deleted_sale_items = sqlx::query("DELETE FROM sale_items WHERE drug_id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete sale items"))?
            .rows_affected();

        sqlx::query("DELETE FROM drugs WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete drug"))?;

        tx.commit().await.map_err(db_error("commit drug deletion"))?;

        Ok(DrugDeletion {
            drug_id: id,
            deleted_sale_items,
        })
    }

    async fn count_drugs(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM drugs")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count drugs"))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
