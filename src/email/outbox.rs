use sqlx::PgPool;

use crate::email::client::EmailMessage;

/// Store a composed email that no endpoint accepted, so the content is not
/// lost and can be replayed by hand.
pub async fn log_fallback(db: &PgPool, msg: &EmailMessage, error: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO email_outbox (recipient, subject, body_html, event, error)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&msg.to)
    .bind(&msg.subject)
    .bind(&msg.html)
    .bind(msg.event)
    .bind(error)
    .execute(db)
    .await?;
    Ok(())
}
