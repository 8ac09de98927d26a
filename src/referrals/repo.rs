use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One credited referral. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_id: Uuid,
    pub bonus_points: i64,
    pub created_at: OffsetDateTime,
}

impl Referral {
    pub async fn create(
        db: &PgPool,
        referrer_id: Uuid,
        referred_id: Uuid,
        bonus_points: i64,
    ) -> anyhow::Result<Referral> {
        let row = sqlx::query_as::<_, Referral>(
            r#"
            INSERT INTO referrals (referrer_id, referred_id, bonus_points)
            VALUES ($1, $2, $3)
            RETURNING id, referrer_id, referred_id, bonus_points, created_at
            "#,
        )
        .bind(referrer_id)
        .bind(referred_id)
        .bind(bonus_points)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_referrer(
        db: &PgPool,
        referrer_id: Uuid,
    ) -> anyhow::Result<Vec<Referral>> {
        let rows = sqlx::query_as::<_, Referral>(
            r#"
            SELECT id, referrer_id, referred_id, bonus_points, created_at
            FROM referrals
            WHERE referrer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(referrer_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
