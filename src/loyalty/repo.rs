use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Purchase record. Append-only, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: Uuid,
    pub member_id: Uuid,
    pub amount: f64,
    pub points_earned: i64,
    pub created_at: OffsetDateTime,
}

impl Purchase {
    pub async fn create(
        db: &PgPool,
        member_id: Uuid,
        amount: f64,
        points_earned: i64,
    ) -> anyhow::Result<Purchase> {
        let row = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (member_id, amount, points_earned)
            VALUES ($1, $2, $3)
            RETURNING id, member_id, amount, points_earned, created_at
            "#,
        )
        .bind(member_id)
        .bind(amount)
        .bind(points_earned)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_member(
        db: &PgPool,
        member_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Purchase>> {
        let rows = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, member_id, amount, points_earned, created_at
            FROM purchases
            WHERE member_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(member_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
