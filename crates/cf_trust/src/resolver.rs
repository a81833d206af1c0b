//! Point-in-time trusted-key resolution
//!
//! Read-only query over the surrounding schema's `user_public_keys`
//! table. The result is a trust *set*: a user may hold several active
//! keys at once (one per device). Varying the effective instant answers
//! both "what is valid now" and "what was valid when record X was
//! signed".

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::TrustError;
use crate::models::{SessionContext, TrustedKeyRow};

/// Query parameters. Everything optional: user id falls back to the
/// session, the instant to now.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveKeyQuery {
    pub user_id: Option<i64>,
    pub effective_date: Option<DateTime<Utc>>,
}

impl ActiveKeyQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn at(mut self, instant: DateTime<Utc>) -> Self {
        self.effective_date = Some(instant);
        self
    }

    /// Accept the instant as an RFC 3339 string, the form it usually
    /// arrives in from callers outside this crate.
    pub fn at_str(self, instant: &str) -> Result<Self, TrustError> {
        let parsed = DateTime::parse_from_rfc3339(instant)
            .map_err(|e| TrustError::InvalidDate(format!("{instant}: {e}")))?;
        Ok(self.at(parsed.with_timezone(&Utc)))
    }
}

/// Public keys valid for the user at the query instant.
///
/// The user id comes from the query or else the authenticated session;
/// neither resolving is an authorisation error, never an empty set.
pub async fn active_user_public_keys(
    pool: &SqlitePool,
    session: &SessionContext,
    query: &ActiveKeyQuery,
) -> Result<Vec<String>, TrustError> {
    let user_id = query
        .user_id
        .or(session.user_id)
        .ok_or(TrustError::Unauthorized)?;
    let at = query.effective_date.unwrap_or_else(Utc::now);

    let rows: Vec<TrustedKeyRow> = sqlx::query_as(
        "SELECT user_id, public_key, effective_date, expiration_date
         FROM user_public_keys
         WHERE user_id = ?
           AND effective_date <= ?
           AND (expiration_date IS NULL OR expiration_date > ?)
         ORDER BY effective_date",
    )
    .bind(user_id)
    .bind(at)
    .bind(at)
    .fetch_all(pool)
    .await?;

    debug!(user_id, at = %at, count = rows.len(), "resolved active trust set");
    Ok(rows.into_iter().map(|row| row.public_key).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sqlx::sqlite::SqliteConnectOptions;
    use uuid::Uuid;

    async fn seeded_pool() -> (SqlitePool, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("cf-trust-test-{}.db", Uuid::new_v4()));
        let opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await.expect("open pool");

        sqlx::query(
            "CREATE TABLE user_public_keys (
                user_id INTEGER NOT NULL,
                public_key TEXT NOT NULL,
                effective_date TEXT NOT NULL,
                expiration_date TEXT
            )",
        )
        .execute(&pool)
        .await
        .expect("create table");

        (pool, path)
    }

    async fn insert_key(
        pool: &SqlitePool,
        user_id: i64,
        key: &str,
        effective: DateTime<Utc>,
        expiration: Option<DateTime<Utc>>,
    ) {
        sqlx::query(
            "INSERT INTO user_public_keys (user_id, public_key, effective_date, expiration_date)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(key)
        .bind(effective)
        .bind(expiration)
        .execute(pool)
        .await
        .expect("insert");
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn window_bounds_are_honoured() {
        let (pool, path) = seeded_pool().await;
        insert_key(&pool, 1, "bounded", date(2024, 1, 1), Some(date(2024, 6, 1))).await;

        let session = SessionContext::for_user(1);

        let mid = active_user_public_keys(
            &pool,
            &session,
            &ActiveKeyQuery::new().at(date(2024, 3, 1)),
        )
        .await
        .expect("query");
        assert_eq!(mid, vec!["bounded".to_string()]);

        let after = active_user_public_keys(
            &pool,
            &session,
            &ActiveKeyQuery::new().at(date(2024, 7, 1)),
        )
        .await
        .expect("query");
        assert!(after.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn open_ended_key_is_always_returned() {
        let (pool, path) = seeded_pool().await;
        insert_key(&pool, 1, "open-ended", date(2024, 1, 1), None).await;

        let keys = active_user_public_keys(
            &pool,
            &SessionContext::for_user(1),
            &ActiveKeyQuery::new().at(date(2090, 1, 1)),
        )
        .await
        .expect("query");
        assert_eq!(keys, vec!["open-ended".to_string()]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn trust_set_may_hold_several_keys() {
        let (pool, path) = seeded_pool().await;
        insert_key(&pool, 1, "laptop", date(2024, 1, 1), None).await;
        insert_key(&pool, 1, "phone", date(2024, 2, 1), None).await;
        insert_key(&pool, 2, "someone-else", date(2024, 1, 1), None).await;

        let keys = active_user_public_keys(
            &pool,
            &SessionContext::for_user(1),
            &ActiveKeyQuery::new().at(date(2024, 3, 1)),
        )
        .await
        .expect("query");
        assert_eq!(keys, vec!["laptop".to_string(), "phone".to_string()]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn explicit_user_overrides_session() {
        let (pool, path) = seeded_pool().await;
        insert_key(&pool, 2, "target-user", date(2024, 1, 1), None).await;

        let keys = active_user_public_keys(
            &pool,
            &SessionContext::for_user(1),
            &ActiveKeyQuery::new().for_user(2).at(date(2024, 3, 1)),
        )
        .await
        .expect("query");
        assert_eq!(keys, vec!["target-user".to_string()]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_user_is_an_authorisation_error() {
        let (pool, path) = seeded_pool().await;
        let result = active_user_public_keys(
            &pool,
            &SessionContext::default(),
            &ActiveKeyQuery::new(),
        )
        .await;
        assert!(matches!(result, Err(TrustError::Unauthorized)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rfc3339_instants_parse() {
        let query = ActiveKeyQuery::new()
            .at_str("2024-03-01T00:00:00Z")
            .expect("parse");
        assert_eq!(query.effective_date, Some(date(2024, 3, 1)));

        assert!(matches!(
            ActiveKeyQuery::new().at_str("last tuesday"),
            Err(TrustError::InvalidDate(_))
        ));
    }
}
