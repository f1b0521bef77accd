use async_trait::async_trait;
use crate::models::{LikeRecord, MatchPair, MatchRecord, ProfileId};
use crate::services::{Insert, LikeMatchStore, StoreError};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

/// PostgreSQL-backed like/match store
///
/// The `likes` primary key on `(liker_id, liked_id)` and the `matches`
/// primary key on the canonical `(profile_a_id, profile_b_id)` pair are what
/// make concurrent reciprocal likes produce a single match.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn like_from_row(row: &PgRow) -> LikeRecord {
    LikeRecord {
        liker_id: ProfileId::new(row.get::<String, _>("liker_id")),
        liked_id: ProfileId::new(row.get::<String, _>("liked_id")),
        is_super: row.get("is_super"),
        created_at: row.get("created_at"),
    }
}

fn match_from_row(row: &PgRow) -> MatchRecord {
    MatchRecord {
        pair: MatchPair::new(
            ProfileId::new(row.get::<String, _>("profile_a_id")),
            ProfileId::new(row.get::<String, _>("profile_b_id")),
        ),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl LikeMatchStore for PostgresClient {
    /// Uses INSERT ... ON CONFLICT DO NOTHING; an empty RETURNING means the
    /// like already existed.
    async fn insert_like(
        &self,
        liker_id: &ProfileId,
        liked_id: &ProfileId,
        is_super: bool,
    ) -> Result<Insert<LikeRecord>, StoreError> {
        let query = r#"
            INSERT INTO likes (liker_id, liked_id, is_super, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (liker_id, liked_id) DO NOTHING
            RETURNING liker_id, liked_id, is_super, created_at
        "#;

        let row = sqlx::query(query)
            .bind(liker_id.as_str())
            .bind(liked_id.as_str())
            .bind(is_super)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Insert::Created(like_from_row(&row)),
            None => Insert::AlreadyExists,
        })
    }

    async fn find_like(
        &self,
        a_id: &ProfileId,
        b_id: &ProfileId,
    ) -> Result<Option<LikeRecord>, StoreError> {
        let query = r#"
            SELECT liker_id, liked_id, is_super, created_at
            FROM likes
            WHERE liker_id = $1 AND liked_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(a_id.as_str())
            .bind(b_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(like_from_row))
    }

    async fn insert_match(&self, pair: &MatchPair) -> Result<Insert<MatchRecord>, StoreError> {
        let query = r#"
            INSERT INTO matches (profile_a_id, profile_b_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (profile_a_id, profile_b_id) DO NOTHING
            RETURNING profile_a_id, profile_b_id, created_at
        "#;

        let row = sqlx::query(query)
            .bind(pair.profile_a().as_str())
            .bind(pair.profile_b().as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Insert::Created(match_from_row(&row)),
            None => Insert::AlreadyExists,
        })
    }

    async fn record_pass(
        &self,
        viewer_id: &ProfileId,
        target_id: &ProfileId,
    ) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO passes (viewer_id, target_id, passed_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (viewer_id, target_id)
            DO UPDATE SET passed_at = EXCLUDED.passed_at
        "#;

        sqlx::query(query)
            .bind(viewer_id.as_str())
            .bind(target_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn decided_targets(&self, viewer_id: &ProfileId) -> Result<Vec<ProfileId>, StoreError> {
        let query = r#"
            SELECT liked_id AS target_id FROM likes WHERE liker_id = $1
            UNION
            SELECT target_id FROM passes WHERE viewer_id = $1
        "#;

        let rows = sqlx::query(query)
            .bind(viewer_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<ProfileId> = rows
            .iter()
            .map(|row| ProfileId::new(row.get::<String, _>("target_id")))
            .collect();

        tracing::debug!("Profile {} has decided on {} profiles", viewer_id, ids.len());

        Ok(ids)
    }

    async fn matches_for(&self, profile_id: &ProfileId) -> Result<Vec<MatchRecord>, StoreError> {
        let query = r#"
            SELECT profile_a_id, profile_b_id, created_at
            FROM matches
            WHERE profile_a_id = $1 OR profile_b_id = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(profile_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(match_from_row).collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
