use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::loyalty::tiers::Tier;

/// Member record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: Uuid,
    pub jc_id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub google_id: Option<String>,
    pub points: i64,
    pub tier: Tier,
    pub total_spent: f64,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub is_admin: bool,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields required to insert a member. Loyalty state starts at the
/// signup defaults chosen by the caller.
#[derive(Debug)]
pub struct NewMember {
    pub jc_id: String,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub points: i64,
    pub tier: Tier,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
}

const MEMBER_COLUMNS: &str = "id, jc_id, email, name, password_hash, google_id, points, tier, \
     total_spent, referral_code, referred_by, is_admin, reset_token, reset_token_expires_at, \
     created_at";

impl Member {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_jc_id(db: &PgPool, jc_id: &str) -> anyhow::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE jc_id = $1"
        ))
        .bind(jc_id)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_google_id(db: &PgPool, google_id: &str) -> anyhow::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_referral_code(db: &PgPool, code: &str) -> anyhow::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE referral_code = $1"
        ))
        .bind(code)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn find_by_reset_token(db: &PgPool, token: &str) -> anyhow::Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(member)
    }

    pub async fn create(db: &PgPool, new: &NewMember) -> anyhow::Result<Member> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "INSERT INTO members \
                 (jc_id, email, name, password_hash, google_id, points, tier, referral_code, referred_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(&new.jc_id)
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(&new.google_id)
        .bind(new.points)
        .bind(new.tier)
        .bind(&new.referral_code)
        .bind(new.referred_by)
        .fetch_one(db)
        .await?;
        Ok(member)
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Persist a new points balance with its recomputed tier. `total_spent`
    /// is written as given so purchase recording can fold the amount in.
    pub async fn update_loyalty(
        db: &PgPool,
        id: Uuid,
        points: i64,
        tier: Tier,
        total_spent: f64,
    ) -> anyhow::Result<Member> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE members SET points = $2, tier = $3, total_spent = $4 \
             WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(points)
        .bind(tier)
        .bind(total_spent)
        .fetch_one(db)
        .await?;
        Ok(member)
    }

    /// Replace the password hash and drop any outstanding reset token.
    pub async fn set_password(db: &PgPool, id: Uuid, hash: &str) -> anyhow::Result<Member> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE members SET password_hash = $2, reset_token = NULL, \
                 reset_token_expires_at = NULL \
             WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(hash)
        .fetch_one(db)
        .await?;
        Ok(member)
    }

    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE members SET reset_token = $2, reset_token_expires_at = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires_at)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn link_google(db: &PgPool, id: Uuid, google_id: &str) -> anyhow::Result<Member> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE members SET google_id = $2 WHERE id = $1 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(google_id)
        .fetch_one(db)
        .await?;
        Ok(member)
    }

    /// Mint a JC ID not yet present in the table.
    pub async fn fresh_jc_id(db: &PgPool) -> anyhow::Result<String> {
        loop {
            let candidate = jc_id_candidate();
            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM members WHERE jc_id = $1)")
                    .bind(&candidate)
                    .fetch_one(db)
                    .await?;
            if !taken {
                return Ok(candidate);
            }
        }
    }

    /// Mint a referral code not yet present in the table.
    pub async fn fresh_referral_code(db: &PgPool) -> anyhow::Result<String> {
        loop {
            let candidate = referral_code_candidate();
            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM members WHERE referral_code = $1)")
                    .bind(&candidate)
                    .fetch_one(db)
                    .await?;
            if !taken {
                return Ok(candidate);
            }
        }
    }
}

pub(crate) fn jc_id_candidate() -> String {
    format!("JC{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

pub(crate) fn referral_code_candidate() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

/// Activity log entry. Append-only; the log keeps the 10 most recent rows
/// per member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub member_id: Uuid,
    pub kind: String,
    pub detail: String,
    pub created_at: OffsetDateTime,
}

pub const ACTIVITY_LOG_CAP: i64 = 10;

impl Activity {
    pub async fn record(
        db: &PgPool,
        member_id: Uuid,
        kind: &str,
        detail: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO activities (member_id, kind, detail) VALUES ($1, $2, $3)")
            .bind(member_id)
            .bind(kind)
            .bind(detail)
            .execute(db)
            .await?;
        // prune beyond the cap
        sqlx::query(
            r#"
            DELETE FROM activities
            WHERE member_id = $1
              AND id NOT IN (
                SELECT id FROM activities
                WHERE member_id = $1
                ORDER BY created_at DESC
                LIMIT $2
              )
            "#,
        )
        .bind(member_id)
        .bind(ACTIVITY_LOG_CAP)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn list_for(db: &PgPool, member_id: Uuid) -> anyhow::Result<Vec<Activity>> {
        let rows = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, member_id, kind, detail, created_at
            FROM activities
            WHERE member_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(member_id)
        .bind(ACTIVITY_LOG_CAP)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jc_id_shape() {
        for _ in 0..100 {
            let id = jc_id_candidate();
            assert_eq!(id.len(), 8);
            assert!(id.starts_with("JC"));
            assert!(id[2..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn referral_code_shape() {
        for _ in 0..100 {
            let code = referral_code_candidate();
            assert_eq!(code.len(), 8);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn member_serialization_hides_credentials() {
        let member = Member {
            id: Uuid::new_v4(),
            jc_id: "JC000042".into(),
            email: "kim@example.com".into(),
            name: "Kim".into(),
            password_hash: Some("secret-hash".into()),
            google_id: None,
            points: 10,
            tier: Tier::Pearl,
            total_spent: 0.0,
            referral_code: "AB12CD34".into(),
            referred_by: None,
            is_admin: false,
            reset_token: Some("reset-secret".into()),
            reset_token_expires_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&member).unwrap();
        assert!(json.contains("JC000042"));
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("reset-secret"));
    }
}
