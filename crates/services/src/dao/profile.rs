use bson::{doc, oid::ObjectId};
use mongodb::Database;
use std::sync::Arc;
use std::time::Duration;
use teamforge_db::models::{MemberRole, Mentor, Student};
use tracing::{error, warn};

use super::base::{BaseDao, DaoError, DaoResult};

/// Profile-store boundary: student/mentor summary reads, and the
/// denormalized team-membership pointer written back after roster
/// changes. Pointer writes are fired after the team mutation commits
/// and never roll it back; failures are retried a bounded number of
/// times and then logged.
pub struct ProfileDao {
    students: BaseDao<Student>,
    mentors: BaseDao<Mentor>,
    sync_retries: u32,
}

impl ProfileDao {
    pub fn new(db: &Database, sync_retries: u32) -> Self {
        Self {
            students: BaseDao::new(db, Student::COLLECTION),
            mentors: BaseDao::new(db, Mentor::COLLECTION),
            sync_retries,
        }
    }

    pub async fn student_summary(&self, id: ObjectId) -> DaoResult<Student> {
        self.students.find_by_id(id).await
    }

    pub async fn mentor_summary(&self, id: ObjectId) -> DaoResult<Mentor> {
        self.mentors.find_by_id(id).await
    }

    async fn set_membership(
        &self,
        student_id: ObjectId,
        team_id: ObjectId,
        role: &MemberRole,
    ) -> DaoResult<()> {
        self.students
            .update_by_id(
                student_id,
                doc! { "$set": {
                    "team_id": team_id,
                    "team_role": bson::to_bson(role)?,
                }},
            )
            .await?;
        Ok(())
    }

    /// Clears the pointer only if it still references `team_id`, so a
    /// stale retry cannot clobber a newer membership.
    async fn clear_membership(&self, student_id: ObjectId, team_id: ObjectId) -> DaoResult<()> {
        self.students
            .update_one(
                doc! { "_id": student_id, "team_id": team_id },
                doc! { "$set": { "team_id": null, "team_role": null } },
            )
            .await?;
        Ok(())
    }

    pub fn spawn_set_membership(
        self: &Arc<Self>,
        student_id: ObjectId,
        team_id: ObjectId,
        role: MemberRole,
    ) {
        let dao = Arc::clone(self);
        tokio::spawn(async move {
            dao.with_retries(|dao| {
                let role = role.clone();
                async move { dao.set_membership(student_id, team_id, &role).await }
            })
            .await;
        });
    }

    pub fn spawn_clear_membership(self: &Arc<Self>, student_id: ObjectId, team_id: ObjectId) {
        let dao = Arc::clone(self);
        tokio::spawn(async move {
            dao.with_retries(|dao| async move {
                dao.clear_membership(student_id, team_id).await
            })
            .await;
        });
    }

    async fn with_retries<F, Fut>(self: &Arc<Self>, op: F)
    where
        F: Fn(Arc<Self>) -> Fut,
        Fut: Future<Output = DaoResult<()>>,
    {
        let mut attempt = 0u32;
        loop {
            match op(Arc::clone(self)).await {
                Ok(()) => return,
                Err(DaoError::NotFound) => {
                    // Profile record missing upstream; nothing to sync.
                    return;
                }
                Err(err) if attempt < self.sync_retries => {
                    attempt += 1;
                    warn!(%err, attempt, "Membership pointer sync failed, retrying");
                    tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                }
                Err(err) => {
                    error!(%err, "Membership pointer sync exhausted retries");
                    return;
                }
            }
        }
    }
}
