use crate::error::db_error;
use crate::PgStore;
use chrono::{DateTime, Utc};
use pharmacy_core::repository::{Session, SessionRepository};
use pharmacy_core::user::UserId;
use pharmacy_core::Result;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct SessionRow {
    token_hash: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRepository for PgStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token_hash)
        .bind(session.user_id.0)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("create session"))?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find session"))?;

        Ok(row.map(|row| Session {
            token_hash: row.token_hash,
            user_id: UserId(row.user_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }))
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete session"))?;
        Ok(())
    }
}

impl PgStore {
    /// Remove every session that expired before `now`. Returns how many went.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error("purge sessions"))?
            .rows_affected();

        if purged > 0 {
            tracing::info!(purged, "Expired sessions removed");
        }
        Ok(purged)
    }
}
