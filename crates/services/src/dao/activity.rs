use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use teamforge_db::models::{ActivityAction, ActivityLog, ActorType, Team};

use super::base::{BaseDao, DaoResult, PaginatedResult, PaginationParams};

/// Append-only audit trail. Every mutating operation goes through
/// `append` so none can skip the log; entries are never updated or
/// deleted. Appending also bumps the team's `last_activity_at`.
pub struct ActivityDao {
    base: BaseDao<ActivityLog>,
    teams: BaseDao<Team>,
}

impl ActivityDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, ActivityLog::COLLECTION),
            teams: BaseDao::new(db, Team::COLLECTION),
        }
    }

    pub async fn append(
        &self,
        team_id: ObjectId,
        action: ActivityAction,
        actor_id: ObjectId,
        actor_type: ActorType,
        description: impl Into<String>,
    ) -> DaoResult<()> {
        let entry = ActivityLog {
            id: None,
            team_id,
            action,
            description: description.into(),
            actor_id,
            actor_type,
            created_at: DateTime::now(),
        };
        self.base.insert_one(&entry).await?;

        self.teams
            .update_by_id(
                team_id,
                doc! { "$set": { "last_activity_at": DateTime::now() } },
            )
            .await?;

        Ok(())
    }

    pub async fn feed(
        &self,
        team_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<ActivityLog>> {
        self.base
            .find_paginated(
                doc! { "team_id": team_id },
                Some(doc! { "created_at": -1 }),
                params,
            )
            .await
    }
}
