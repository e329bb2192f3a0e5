use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use serde::Serialize;
use std::sync::Arc;
use teamforge_db::models::{
    ActivityAction, ActorType, ApplicationStatus, InvitationStatus, Mentor, MentorApplication,
    MentorLink, MentorLinkStatus, Team, TeamMember, TeamStatus,
};
use tracing::{error, warn};

use super::activity::ActivityDao;
use super::base::{BaseDao, DaoError, DaoResult};
use super::profile::ProfileDao;
use super::roster;
use crate::locks::TeamLocks;

#[derive(Serialize)]
pub struct ApplicationWithMentor {
    pub application: MentorApplication,
    pub mentor: Option<Mentor>,
}

/// Cross-aggregate Team <-> Mentor binding. The accepted application is
/// the authoritative record; the team's embedded mentor slot mirrors it.
/// Accept is two-phase: CAS the application first, then apply the team
/// mirror with a bounded retry budget, flagging the application for
/// reconciliation if the mirror cannot be applied.
pub struct MentorDao {
    applications: BaseDao<MentorApplication>,
    teams: BaseDao<Team>,
    members: BaseDao<TeamMember>,
    activity: ActivityDao,
    profiles: Arc<ProfileDao>,
    locks: Arc<TeamLocks>,
    max_retries: u32,
}

impl MentorDao {
    pub fn new(
        db: &Database,
        locks: Arc<TeamLocks>,
        profiles: Arc<ProfileDao>,
        max_retries: u32,
    ) -> Self {
        Self {
            applications: BaseDao::new(db, MentorApplication::COLLECTION),
            teams: BaseDao::new(db, Team::COLLECTION),
            members: BaseDao::new(db, TeamMember::COLLECTION),
            activity: ActivityDao::new(db),
            profiles,
            locks,
            max_retries,
        }
    }

    pub async fn apply_to_mentor(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        mentor_id: ObjectId,
        message: Option<String>,
    ) -> DaoResult<MentorApplication> {
        let _guard = self.locks.acquire(team_id).await;

        let team = self.teams.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;
        if team.status != TeamStatus::Active {
            return Err(DaoError::Conflict("Team is not active".to_string()));
        }
        if team.has_active_mentor() {
            return Err(DaoError::Conflict("Team already has a mentor".to_string()));
        }

        self.profiles.mentor_summary(mentor_id).await?;

        let open = self
            .applications
            .count(doc! {
                "team_id": team_id,
                "mentor_id": mentor_id,
                "status": { "$in": ["pending", "accepted"] },
            })
            .await?;
        if open > 0 {
            return Err(DaoError::Conflict(
                "An application to this mentor is already open".to_string(),
            ));
        }

        let now = DateTime::now();
        let application = MentorApplication {
            id: None,
            team_id,
            mentor_id,
            message,
            status: ApplicationStatus::Pending,
            applied_at: now,
            decided_at: None,
            needs_reconciliation: false,
            created_at: now,
            updated_at: now,
        };
        let id = self.applications.insert_one(&application).await?;

        self.activity
            .append(
                team_id,
                ActivityAction::MentorApplicationSent,
                actor_id,
                ActorType::Student,
                "The team applied to a mentor",
            )
            .await?;

        self.applications.find_by_id(id).await
    }

    pub async fn cancel_application(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        application_id: ObjectId,
    ) -> DaoResult<()> {
        let team = self.teams.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;

        let application = self
            .applications
            .find_one(doc! { "_id": application_id, "team_id": team_id })
            .await?
            .ok_or(DaoError::NotFound)?;
        if application.status != ApplicationStatus::Pending {
            return Err(DaoError::Conflict(
                "Only pending applications can be cancelled".to_string(),
            ));
        }

        let cancelled = self
            .applications
            .update_one(
                doc! { "_id": application_id, "status": "pending" },
                doc! { "$set": { "status": "cancelled", "decided_at": DateTime::now() } },
            )
            .await?;
        if !cancelled {
            return Err(DaoError::Conflict(
                "Only pending applications can be cancelled".to_string(),
            ));
        }

        self.activity
            .append(
                team_id,
                ActivityAction::MentorApplicationCancelled,
                actor_id,
                ActorType::Student,
                "A mentor application was cancelled",
            )
            .await?;

        Ok(())
    }

    pub async fn decide_application(
        &self,
        mentor_id: ObjectId,
        application_id: ObjectId,
        accept: bool,
    ) -> DaoResult<MentorApplication> {
        let application = self.applications.find_by_id(application_id).await?;
        if application.mentor_id != mentor_id {
            return Err(DaoError::Forbidden(
                "This application is addressed to another mentor".to_string(),
            ));
        }
        if application.status != ApplicationStatus::Pending {
            return Err(DaoError::Conflict(
                "Application has already been decided".to_string(),
            ));
        }

        if !accept {
            let rejected = self
                .applications
                .update_one(
                    doc! { "_id": application_id, "status": "pending" },
                    doc! { "$set": { "status": "rejected", "decided_at": DateTime::now() } },
                )
                .await?;
            if !rejected {
                return Err(DaoError::Conflict(
                    "Application has already been decided".to_string(),
                ));
            }
            self.activity
                .append(
                    application.team_id,
                    ActivityAction::MentorApplicationRejected,
                    mentor_id,
                    ActorType::Mentor,
                    "A mentor application was rejected",
                )
                .await?;
            return self.applications.find_by_id(application_id).await;
        }

        let team_id = application.team_id;
        let _guard = self.locks.acquire(team_id).await;

        let team = self.teams.find_by_id(team_id).await?;
        if team.status != TeamStatus::Active {
            return Err(DaoError::Conflict("Team is not active".to_string()));
        }
        if team.has_active_mentor() {
            return Err(DaoError::Conflict("Team already has a mentor".to_string()));
        }
        let already_accepted = self
            .applications
            .count(doc! { "team_id": team_id, "status": "accepted" })
            .await?;
        if already_accepted > 0 {
            return Err(DaoError::Conflict(
                "Team already has an accepted mentor application".to_string(),
            ));
        }

        let mentor = self.profiles.mentor_summary(mentor_id).await?;

        // Phase 1: the authoritative record.
        let accepted = self
            .applications
            .update_one(
                doc! { "_id": application_id, "status": "pending" },
                doc! { "$set": { "status": "accepted", "decided_at": DateTime::now() } },
            )
            .await?;
        if !accepted {
            return Err(DaoError::Conflict(
                "Application has already been decided".to_string(),
            ));
        }

        // Phase 2: mirror onto the team. Bounded retries, then flag for
        // reconciliation; the caller sees a retryable error, never a
        // silent partial success.
        let link = MentorLink {
            mentor_id,
            name: mentor.name.clone(),
            joined_at: DateTime::now(),
            status: MentorLinkStatus::Active,
            invitation_status: InvitationStatus::Accepted,
        };
        let mut attempt = 0u32;
        loop {
            match self.mirror_accept(team_id, mentor_id, &link).await {
                Ok(()) => break,
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%err, attempt, %team_id, "Mentor mirror write failed, retrying");
                }
                Err(err) => {
                    error!(
                        %err, %team_id, %application_id,
                        "Mentor mirror write exhausted retries; flagged for reconciliation"
                    );
                    self.applications
                        .update_by_id(
                            application_id,
                            doc! { "$set": { "needs_reconciliation": true } },
                        )
                        .await
                        .ok();
                    return Err(DaoError::Inconsistent(
                        "Mentor accepted but the team record is not yet updated".to_string(),
                    ));
                }
            }
        }

        self.applications.find_by_id(application_id).await
    }

    async fn mirror_accept(
        &self,
        team_id: ObjectId,
        mentor_id: ObjectId,
        link: &MentorLink,
    ) -> DaoResult<()> {
        self.teams
            .update_by_id(team_id, doc! { "$set": { "mentor": bson::to_bson(link)? } })
            .await?;
        self.activity
            .append(
                team_id,
                ActivityAction::MentorJoined,
                mentor_id,
                ActorType::Mentor,
                format!("Mentor {} joined the team", link.name),
            )
            .await?;
        Ok(())
    }

    pub async fn applications_for_team(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
    ) -> DaoResult<Vec<ApplicationWithMentor>> {
        let team = self.teams.find_by_id(team_id).await?;
        let is_member = roster::find_active_member(&self.members, team_id, actor_id)
            .await?
            .is_some();
        if !is_member && team.leader_id != actor_id {
            return Err(DaoError::Forbidden(
                "Only team members can see mentor applications".to_string(),
            ));
        }

        let applications = self
            .applications
            .find_many(doc! { "team_id": team_id }, Some(doc! { "applied_at": -1 }))
            .await?;

        let mut joined = Vec::with_capacity(applications.len());
        for application in applications {
            let mentor = self
                .profiles
                .mentor_summary(application.mentor_id)
                .await
                .ok();
            joined.push(ApplicationWithMentor { application, mentor });
        }
        Ok(joined)
    }

    pub async fn pending_for_mentor(
        &self,
        mentor_id: ObjectId,
    ) -> DaoResult<Vec<MentorApplication>> {
        self.applications
            .find_many(
                doc! { "mentor_id": mentor_id, "status": "pending" },
                Some(doc! { "applied_at": 1 }),
            )
            .await
    }

    /// Feedback from the team's active mentor, recorded on the activity
    /// trail.
    pub async fn record_feedback(
        &self,
        team_id: ObjectId,
        mentor_id: ObjectId,
        text: String,
    ) -> DaoResult<()> {
        if text.trim().is_empty() {
            return Err(DaoError::InvalidArgument("Feedback text is required".to_string()));
        }

        let team = self.teams.find_by_id(team_id).await?;
        let is_active_mentor = matches!(
            &team.mentor,
            Some(link) if link.mentor_id == mentor_id && link.status == MentorLinkStatus::Active
        );
        if !is_active_mentor {
            return Err(DaoError::Forbidden(
                "Only the team's active mentor can leave feedback".to_string(),
            ));
        }

        self.activity
            .append(
                team_id,
                ActivityAction::MentorFeedback,
                mentor_id,
                ActorType::Mentor,
                text,
            )
            .await?;

        Ok(())
    }
}
