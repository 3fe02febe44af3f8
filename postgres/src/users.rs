use crate::error::{db_error, db_error_or_conflict};
use crate::PgStore;
use chrono::{DateTime, Utc};
use pharmacy_core::repository::UserRepository;
use pharmacy_core::user::{Role, User, UserId, UserRecord};
use pharmacy_core::{PharmacyError, Result};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = PharmacyError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| PharmacyError::Internal(format!("Stored role is invalid: {}", row.role)))?;
        Ok(Self {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRecordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl UserRepository for PgStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, email, role, created_at FROM users ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list users"))?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, role, created_at FROM users WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("get user"))?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRecordRow> = sqlx::query_as(
            "SELECT id, name, email, role, created_at, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find user by email"))?;

        row.map(|row| -> Result<UserRecord> {
            Ok(UserRecord {
                user: row.user.try_into()?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, role, created_at
            ",
        )
        .bind(record.user.id.0)
        .bind(&record.user.name)
        .bind(&record.user.email)
        .bind(&record.password_hash)
        .bind(record.user.role.as_str())
        .bind(record.user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error_or_conflict("insert user", "User already exists"))?;

        row.try_into()
    }

    async fn update_role(&self, id: UserId, role: Role) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING id, name, email, role, created_at",
        )
        .bind(id.0)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update role"))?;

        row.ok_or_else(|| PharmacyError::not_found("User", id))?
            .try_into()
    }
}
