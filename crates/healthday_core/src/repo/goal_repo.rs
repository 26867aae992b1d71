//! Goal provider contracts and SQLite implementation.
//!
//! # Invariants
//! - Reads never fail because a goal is missing; defaults fill the gap.
//! - Only strictly positive finite targets are persisted.

use crate::model::goal::{GoalKind, GoalSet};
use crate::model::metric::UserId;
use crate::repo::day_repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Source of per-user goals.
pub trait GoalRepository {
    /// All goals for `user_id`, defaults substituted for unset ones.
    fn goals(&self, user_id: UserId) -> RepoResult<GoalSet>;

    /// Upserts one target.
    fn set_goal(&self, user_id: UserId, kind: GoalKind, target: f64) -> RepoResult<()>;

    /// One goal for `user_id`, default when unset.
    fn goal(&self, user_id: UserId, kind: GoalKind) -> RepoResult<f64> {
        Ok(self.goals(user_id)?.target(kind))
    }
}

/// SQLite-backed goal provider.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn goals(&self, user_id: UserId) -> RepoResult<GoalSet> {
        let mut stmt = self.conn.prepare(
            "SELECT goal_kind, target
             FROM goals
             WHERE user_id = ?1;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;

        let mut goals = GoalSet::default();
        while let Some(row) = rows.next()? {
            let kind_text: String = row.get(0)?;
            let kind = GoalKind::parse(&kind_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid goal kind `{kind_text}` in goals.goal_kind"))
            })?;
            goals.set_target(kind, row.get(1)?);
        }
        Ok(goals)
    }

    fn set_goal(&self, user_id: UserId, kind: GoalKind, target: f64) -> RepoResult<()> {
        if !target.is_finite() || target <= 0.0 {
            return Err(RepoError::InvalidData(format!(
                "goal `{}` must be a positive number, got {target}",
                kind.as_str()
            )));
        }

        self.conn.execute(
            "INSERT INTO goals (user_id, goal_kind, target)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, goal_kind) DO UPDATE SET
                target = excluded.target,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id.to_string(), kind.as_str(), target],
        )?;
        Ok(())
    }
}
