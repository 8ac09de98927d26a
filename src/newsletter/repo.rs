use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Newsletter subscription, independent of membership.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Subscription {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, email, active, created_at, updated_at
            FROM newsletter_subscriptions
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Insert the address or reactivate an existing row.
    pub async fn activate(db: &PgPool, email: &str) -> anyhow::Result<Subscription> {
        let row = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO newsletter_subscriptions (email, active)
            VALUES ($1, TRUE)
            ON CONFLICT (email)
            DO UPDATE SET active = TRUE, updated_at = now()
            RETURNING id, email, active, created_at, updated_at
            "#,
        )
        .bind(email)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn deactivate(db: &PgPool, email: &str) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE newsletter_subscriptions
            SET active = FALSE, updated_at = now()
            WHERE email = $1
            RETURNING id, email, active, created_at, updated_at
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, email, active, created_at, updated_at
            FROM newsletter_subscriptions
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_active(db: &PgPool) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM newsletter_subscriptions WHERE active = TRUE",
        )
        .fetch_one(db)
        .await?;
        Ok(count)
    }
}
