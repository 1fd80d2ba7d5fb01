use anyhow::Result;
use sqlx::PgPool;

/// Resolve an opaque session token to the owning user id.
///
/// Token issuance lives in the account service; this side only ever reads.
pub async fn user_id_for_token(pool: &PgPool, token: &str) -> Result<Option<i64>> {
    let user_id = sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user_id)
}
