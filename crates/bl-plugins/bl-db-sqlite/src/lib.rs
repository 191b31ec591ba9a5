//! # bl-db-sqlite Implementation
//!
//! Implements the `bl-core` ports on top of SQLite. Stands in for the
//! hosted backend in local runs and tests, and is the authority on
//! duplicate appeals through the `appeals` primary key.

use std::str::FromStr;

use async_trait::async_trait;
use bl_core::error::{AppError, Result};
use bl_core::models::{
    ActionId, Appeal, AppealStatus, FollowState, PrivacyLevel, Relationship, Suspension, UserId,
    Warning,
};
use bl_core::moderation::is_active;
use bl_core::traits::{ModerationRepo, SocialGraph, SocialGraphAdmin};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

/// Applied in order on every connect; each statement is idempotent.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id              BLOB PRIMARY KEY,
        privacy_default TEXT NOT NULL DEFAULT 'public'
                        CHECK (privacy_default IN ('public', 'friends', 'private')),
        created_at      TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS follows (
        follower_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        followee_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        state       TEXT NOT NULL CHECK (state IN ('pending', 'accepted')),
        created_at  TEXT NOT NULL,
        PRIMARY KEY (follower_id, followee_id)
    )",
    "CREATE TABLE IF NOT EXISTS moderation_actions (
        id           BLOB PRIMARY KEY,
        user_id      BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        kind         TEXT NOT NULL CHECK (kind IN ('warning', 'suspension')),
        reason       TEXT NOT NULL,
        moderator_id BLOB NOT NULL,
        issued_at    TEXT NOT NULL,
        end_date     TEXT,
        is_permanent INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS moderation_actions_user ON moderation_actions (user_id, kind)",
    "CREATE TABLE IF NOT EXISTS appeals (
        action_id    BLOB PRIMARY KEY REFERENCES moderation_actions(id) ON DELETE CASCADE,
        user_id      BLOB NOT NULL,
        message      TEXT NOT NULL,
        status       TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
        submitted_at TEXT NOT NULL
    )",
];

const ACTION_COLUMNS: &str = "a.id, a.user_id, a.reason, a.moderator_id, a.issued_at, \
     a.end_date, a.is_permanent, \
     ap.status AS appeal_status, ap.message AS appeal_message, ap.submitted_at AS appeal_submitted_at";

pub struct SqliteBackend {
    pool: SqlitePool,
}

fn read_err(e: sqlx::Error) -> AppError {
    AppError::Lookup(e.to_string())
}

fn write_err(e: sqlx::Error) -> AppError {
    AppError::Internal(e.to_string())
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("corrupt {column} column: {detail}"))
}

fn row_user_id(row: &SqliteRow, column: &str) -> Result<UserId> {
    row.try_get::<Uuid, _>(column).map(UserId).map_err(read_err)
}

/// Decodes the LEFT JOINed appeal columns, if an appeal exists.
fn row_appeal(row: &SqliteRow) -> Result<Option<Appeal>> {
    let status: Option<String> = row.try_get("appeal_status").map_err(read_err)?;
    let Some(status) = status else {
        return Ok(None);
    };
    Ok(Some(Appeal {
        status: AppealStatus::from_str(&status).map_err(|e| corrupt("appeals.status", e))?,
        message: row.try_get("appeal_message").map_err(read_err)?,
        submitted_at: row.try_get("appeal_submitted_at").map_err(read_err)?,
    }))
}

fn row_warning(row: &SqliteRow) -> Result<Warning> {
    Ok(Warning {
        id: ActionId(row.try_get("id").map_err(read_err)?),
        user_id: row_user_id(row, "user_id")?,
        reason: row.try_get("reason").map_err(read_err)?,
        moderator_id: row_user_id(row, "moderator_id")?,
        issued_at: row.try_get("issued_at").map_err(read_err)?,
        appeal: row_appeal(row)?,
    })
}

fn row_suspension(row: &SqliteRow) -> Result<Suspension> {
    Ok(Suspension {
        id: ActionId(row.try_get("id").map_err(read_err)?),
        user_id: row_user_id(row, "user_id")?,
        reason: row.try_get("reason").map_err(read_err)?,
        moderator_id: row_user_id(row, "moderator_id")?,
        issued_at: row.try_get("issued_at").map_err(read_err)?,
        end_date: row.try_get("end_date").map_err(read_err)?,
        is_permanent: row.try_get("is_permanent").map_err(read_err)?,
        appeal: row_appeal(row)?,
    })
}

impl SqliteBackend {
    pub async fn new(url: &str) -> Result<Self> {
        Self::connect(url, 5).await
    }

    /// Opens (creating if needed) the database and applies the schema.
    ///
    /// In-memory databases are pinned to a single long-lived connection,
    /// since every SQLite connection to `:memory:` is its own database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(write_err)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await.map_err(write_err)?;
        let backend = Self { pool };
        backend.apply_schema().await?;
        info!(url, "sqlite backend ready");
        Ok(backend)
    }

    async fn apply_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(write_err)?;
        }
        Ok(())
    }

    async fn user_exists(&self, user: UserId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;
        Ok(row.is_some())
    }

    async fn follow_state(&self, follower: UserId, followee: UserId) -> Result<Option<FollowState>> {
        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(follower.0)
                .bind(followee.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(read_err)?;

        state
            .map(|s| FollowState::from_str(&s).map_err(|e| corrupt("follows.state", e)))
            .transpose()
    }

    /// Records a moderator warning. Moderation tooling lives elsewhere;
    /// this exists for seeding and tests.
    pub async fn issue_warning(
        &self,
        user: UserId,
        moderator: UserId,
        reason: &str,
    ) -> Result<ActionId> {
        self.insert_action(user, moderator, "warning", reason, None, false)
            .await
    }

    /// Records a suspension. `end_date` is ignored for permanent ones.
    pub async fn issue_suspension(
        &self,
        user: UserId,
        moderator: UserId,
        reason: &str,
        end_date: Option<DateTime<Utc>>,
        is_permanent: bool,
    ) -> Result<ActionId> {
        let end_date = if is_permanent { None } else { end_date };
        self.insert_action(user, moderator, "suspension", reason, end_date, is_permanent)
            .await
    }

    async fn insert_action(
        &self,
        user: UserId,
        moderator: UserId,
        kind: &str,
        reason: &str,
        end_date: Option<DateTime<Utc>>,
        is_permanent: bool,
    ) -> Result<ActionId> {
        let id = ActionId::new();
        sqlx::query(
            "INSERT INTO moderation_actions (id, user_id, kind, reason, moderator_id, issued_at, end_date, is_permanent) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0)
        .bind(user.0)
        .bind(kind)
        .bind(reason)
        .bind(moderator.0)
        .bind(Utc::now())
        .bind(end_date)
        .bind(is_permanent)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        debug!(%user, %id, kind, "moderation action recorded");
        Ok(id)
    }

    /// Moderator decision on a pending appeal.
    pub async fn review_appeal(&self, action: ActionId, status: AppealStatus) -> Result<()> {
        let result = sqlx::query("UPDATE appeals SET status = ? WHERE action_id = ?")
            .bind(status.as_str())
            .bind(action.0)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Appeal".into(), action.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SocialGraph for SqliteBackend {
    /// Derived fresh from both directed edges on every call.
    async fn get_relationship(&self, viewer: UserId, owner: UserId) -> Result<Relationship> {
        let outgoing = self.follow_state(viewer, owner).await?;
        let incoming = self.follow_state(owner, viewer).await?;
        Ok(Relationship::from_edges(outgoing, incoming))
    }

    async fn get_privacy_default(&self, owner: UserId) -> Result<PrivacyLevel> {
        let privacy: Option<String> =
            sqlx::query_scalar("SELECT privacy_default FROM users WHERE id = ?")
                .bind(owner.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(read_err)?;

        match privacy {
            Some(p) => PrivacyLevel::from_str(&p).map_err(|e| corrupt("users.privacy_default", e)),
            None => Err(AppError::NotFound("User".into(), owner.to_string())),
        }
    }
}

#[async_trait]
impl SocialGraphAdmin for SqliteBackend {
    async fn ensure_user(&self, user: UserId, privacy: PrivacyLevel) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, privacy_default, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(user.0)
        .bind(privacy.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn follow(&self, follower: UserId, followee: UserId) -> Result<FollowState> {
        if follower == followee {
            return Err(AppError::Conflict("cannot follow yourself".into()));
        }
        if !self.user_exists(follower).await? {
            return Err(AppError::NotFound("User".into(), follower.to_string()));
        }

        // Public accounts accept every follower; the rest approve by hand.
        let state = match self.get_privacy_default(followee).await? {
            PrivacyLevel::Public => FollowState::Accepted,
            PrivacyLevel::Friends | PrivacyLevel::Private => FollowState::Pending,
        };

        sqlx::query(
            "INSERT INTO follows (follower_id, followee_id, state, created_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(follower_id, followee_id) DO NOTHING",
        )
        .bind(follower.0)
        .bind(followee.0)
        .bind(state.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        // An existing edge keeps its state; report what is stored.
        let stored = self.follow_state(follower, followee).await?.unwrap_or(state);
        debug!(%follower, %followee, state = stored.as_str(), "follow recorded");
        Ok(stored)
    }

    async fn accept_follow(&self, follower: UserId, followee: UserId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE follows SET state = 'accepted' WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower.0)
        .bind(followee.0)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Follow request".into(),
                format!("{follower} -> {followee}"),
            ));
        }
        Ok(())
    }

    async fn unfollow(&self, follower: UserId, followee: UserId) -> Result<()> {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower.0)
            .bind(followee.0)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    async fn set_privacy_default(&self, owner: UserId, privacy: PrivacyLevel) -> Result<()> {
        let result = sqlx::query("UPDATE users SET privacy_default = ? WHERE id = ?")
            .bind(privacy.as_str())
            .bind(owner.0)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".into(), owner.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ModerationRepo for SqliteBackend {
    async fn get_warnings(&self, user: UserId) -> Result<Vec<Warning>> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM moderation_actions a \
             LEFT JOIN appeals ap ON ap.action_id = a.id \
             WHERE a.user_id = ? AND a.kind = 'warning'"
        );
        let rows = sqlx::query(&sql)
            .bind(user.0)
            .fetch_all(&self.pool)
            .await
            .map_err(read_err)?;

        let mut warnings = rows.iter().map(row_warning).collect::<Result<Vec<_>>>()?;
        warnings.sort_by_key(|w| (w.issued_at, w.id));
        Ok(warnings)
    }

    /// Latest-issued suspension that is still in force.
    async fn get_active_suspension(&self, user: UserId) -> Result<Option<Suspension>> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM moderation_actions a \
             LEFT JOIN appeals ap ON ap.action_id = a.id \
             WHERE a.user_id = ? AND a.kind = 'suspension'"
        );
        let rows = sqlx::query(&sql)
            .bind(user.0)
            .fetch_all(&self.pool)
            .await
            .map_err(read_err)?;

        // Overlapping suspensions: the one that lasts longest wins, permanent first.
        let now = Utc::now();
        let suspensions = rows.iter().map(row_suspension).collect::<Result<Vec<_>>>()?;
        Ok(suspensions
            .into_iter()
            .filter(|s| is_active(s, now))
            .max_by_key(|s| (s.is_permanent, s.end_date, s.issued_at, s.id)))
    }

    async fn submit_appeal(&self, user: UserId, action: ActionId, message: &str) -> Result<()> {
        // Appeals only target the caller's own actions; anything else looks missing.
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM moderation_actions WHERE id = ?")
                .bind(action.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(read_err)?;
        if owner != Some(user.0) {
            return Err(AppError::NotFound("Moderation action".into(), action.to_string()));
        }

        let inserted = sqlx::query(
            "INSERT INTO appeals (action_id, user_id, message, status, submitted_at) \
             VALUES (?, ?, ?, 'pending', ?)",
        )
        .bind(action.0)
        .bind(user.0)
        .bind(message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateAppeal(action))
            }
            Err(e) => Err(write_err(e)),
        }
    }
}
