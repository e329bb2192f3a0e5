use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Duration, Utc};
use mongodb::Database;
use std::sync::Arc;
use teamforge_config::RecruitmentSettings;
use teamforge_db::models::{
    ActivityAction, ActorType, Invitation, InvitationStatus, JoinRequest, JoinRequestStatus,
    MemberRole, Team, TeamMember, TeamStatus,
};
use tracing::debug;

use super::activity::ActivityDao;
use super::base::{BaseDao, DaoError, DaoResult};
use super::profile::ProfileDao;
use super::roster;
use crate::locks::{StudentLocks, TeamLocks};

/// The two symmetric recruitment state machines. Invitations are
/// leader-initiated and lapse after a TTL; join requests are
/// student-initiated and never lapse. Every resolution is a
/// compare-and-set on `status: pending`, so a pending entry reaches a
/// terminal state exactly once and terminal states are never re-entered.
pub struct RecruitmentDao {
    invitations: BaseDao<Invitation>,
    join_requests: BaseDao<JoinRequest>,
    teams: BaseDao<Team>,
    members: BaseDao<TeamMember>,
    activity: ActivityDao,
    profiles: Arc<ProfileDao>,
    locks: Arc<TeamLocks>,
    student_locks: Arc<StudentLocks>,
    settings: RecruitmentSettings,
}

impl RecruitmentDao {
    pub fn new(
        db: &Database,
        locks: Arc<TeamLocks>,
        student_locks: Arc<StudentLocks>,
        profiles: Arc<ProfileDao>,
        settings: RecruitmentSettings,
    ) -> Self {
        Self {
            invitations: BaseDao::new(db, Invitation::COLLECTION),
            join_requests: BaseDao::new(db, JoinRequest::COLLECTION),
            teams: BaseDao::new(db, Team::COLLECTION),
            members: BaseDao::new(db, TeamMember::COLLECTION),
            activity: ActivityDao::new(db),
            profiles,
            locks,
            student_locks,
            settings,
        }
    }

    pub async fn invite(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        recipient_id: ObjectId,
        role: MemberRole,
        message: Option<String>,
    ) -> DaoResult<Invitation> {
        let _guard = self.locks.acquire(team_id).await;

        let team = self.teams.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;
        if team.status != TeamStatus::Active {
            return Err(DaoError::Conflict("Team is not active".to_string()));
        }

        self.profiles.student_summary(recipient_id).await?;

        if roster::find_active_member(&self.members, team_id, recipient_id)
            .await?
            .is_some()
        {
            return Err(DaoError::Conflict(
                "Student is already a member of this team".to_string(),
            ));
        }

        let pending = self
            .invitations
            .count(doc! {
                "team_id": team_id,
                "recipient_id": recipient_id,
                "status": "pending",
            })
            .await?;
        if pending > 0 {
            return Err(DaoError::Conflict(
                "Student already has a pending invitation from this team".to_string(),
            ));
        }

        let current = roster::active_member_count(&self.members, team_id).await?;
        roster::require_capacity(&team, current)?;

        let now = DateTime::now();
        let expires_at = DateTime::from_chrono(
            Utc::now() + Duration::days(self.settings.invite_ttl_days),
        );
        let invitation = Invitation {
            id: None,
            team_id,
            recipient_id,
            role,
            message,
            invited_by: actor_id,
            sent_at: now,
            expires_at,
            status: InvitationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let id = self.invitations.insert_one(&invitation).await?;

        self.activity
            .append(
                team_id,
                ActivityAction::InvitationSent,
                actor_id,
                ActorType::Student,
                "An invitation was sent",
            )
            .await?;

        self.invitations.find_by_id(id).await
    }

    pub async fn respond_to_invitation(
        &self,
        invitation_id: ObjectId,
        student_id: ObjectId,
        accept: bool,
    ) -> DaoResult<Invitation> {
        let invitation = self.invitations.find_by_id(invitation_id).await?;
        if invitation.recipient_id != student_id {
            return Err(DaoError::Forbidden(
                "This invitation belongs to another student".to_string(),
            ));
        }
        if invitation.status != InvitationStatus::Pending {
            return Err(DaoError::Conflict(
                "Invitation has already been resolved".to_string(),
            ));
        }
        if invitation.is_expired(DateTime::now()) {
            // Lazy TTL: transition now instead of honoring the response.
            self.invitations
                .update_one(
                    doc! { "_id": invitation_id, "status": "pending" },
                    doc! { "$set": { "status": "expired" } },
                )
                .await?;
            return Err(DaoError::Conflict("Invitation has expired".to_string()));
        }

        if !accept {
            let declined = self
                .invitations
                .update_one(
                    doc! { "_id": invitation_id, "status": "pending" },
                    doc! { "$set": { "status": "declined" } },
                )
                .await?;
            if !declined {
                return Err(DaoError::Conflict(
                    "Invitation has already been resolved".to_string(),
                ));
            }
            self.activity
                .append(
                    invitation.team_id,
                    ActivityAction::InvitationDeclined,
                    student_id,
                    ActorType::Student,
                    "An invitation was declined",
                )
                .await?;
            return self.invitations.find_by_id(invitation_id).await;
        }

        let team_id = invitation.team_id;
        // Student lock first, then team lock (fixed order, see locks.rs):
        // two accepts by the same student on different teams must not
        // both pass the free-agent check.
        let _student_guard = self.student_locks.acquire(student_id).await;
        let _guard = self.locks.acquire(team_id).await;

        let team = self.teams.find_by_id(team_id).await?;
        if team.status != TeamStatus::Active {
            return Err(DaoError::Conflict("Team is not active".to_string()));
        }
        let current = roster::active_member_count(&self.members, team_id).await?;
        roster::require_capacity(&team, current)?;
        roster::assert_free_agent(&self.members, &self.teams, student_id).await?;

        let accepted = self
            .invitations
            .update_one(
                doc! { "_id": invitation_id, "status": "pending" },
                doc! { "$set": { "status": "accepted" } },
            )
            .await?;
        if !accepted {
            return Err(DaoError::Conflict(
                "Invitation has already been resolved".to_string(),
            ));
        }

        roster::admit(
            &self.members,
            &self.teams,
            team_id,
            student_id,
            invitation.role.clone(),
        )
        .await?;

        self.activity
            .append(
                team_id,
                ActivityAction::InvitationAccepted,
                student_id,
                ActorType::Student,
                "An invitation was accepted and the student joined",
            )
            .await?;

        // Accepting one invitation lapses every other pending invitation
        // this student holds, across all teams.
        let expired = self
            .invitations
            .update_many(
                doc! {
                    "recipient_id": student_id,
                    "status": "pending",
                    "_id": { "$ne": invitation_id },
                },
                doc! { "$set": { "status": "expired" } },
            )
            .await?;
        debug!(%student_id, expired, "Cross-expired sibling invitations");

        drop(_guard);
        drop(_student_guard);
        self.profiles
            .spawn_set_membership(student_id, team_id, invitation.role.clone());

        self.invitations.find_by_id(invitation_id).await
    }

    pub async fn apply_to_join(
        &self,
        team_id: ObjectId,
        student_id: ObjectId,
        message: Option<String>,
    ) -> DaoResult<JoinRequest> {
        let team = self.teams.find_by_id(team_id).await?;
        if team.status != TeamStatus::Active || !team.is_recruiting {
            return Err(DaoError::Conflict("Team is not recruiting".to_string()));
        }

        self.profiles.student_summary(student_id).await?;

        if roster::find_active_member(&self.members, team_id, student_id)
            .await?
            .is_some()
        {
            return Err(DaoError::Conflict(
                "Student is already a member of this team".to_string(),
            ));
        }

        let pending = self
            .join_requests
            .count(doc! {
                "team_id": team_id,
                "student_id": student_id,
                "status": "pending",
            })
            .await?;
        if pending > 0 {
            return Err(DaoError::Conflict(
                "A pending join request from this student already exists".to_string(),
            ));
        }

        let now = DateTime::now();
        let request = JoinRequest {
            id: None,
            team_id,
            student_id,
            message,
            requested_at: now,
            status: JoinRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let id = self.join_requests.insert_one(&request).await?;

        self.activity
            .append(
                team_id,
                ActivityAction::JoinRequestSent,
                student_id,
                ActorType::Student,
                "A join request was submitted",
            )
            .await?;

        self.join_requests.find_by_id(id).await
    }

    pub async fn respond_to_join_request(
        &self,
        team_id: ObjectId,
        request_id: ObjectId,
        actor_id: ObjectId,
        accept: bool,
    ) -> DaoResult<JoinRequest> {
        // Unlocked read to learn the applicant, so the student lock can
        // be taken before the team lock (fixed order, see locks.rs).
        let request = self
            .join_requests
            .find_one(doc! { "_id": request_id, "team_id": team_id })
            .await?
            .ok_or(DaoError::NotFound)?;

        let _student_guard = if accept {
            Some(self.student_locks.acquire(request.student_id).await)
        } else {
            None
        };
        let _guard = self.locks.acquire(team_id).await;

        let team = self.teams.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;

        // Re-read under the locks; the request may have been resolved
        // in the meantime.
        let request = self
            .join_requests
            .find_one(doc! { "_id": request_id, "team_id": team_id })
            .await?
            .ok_or(DaoError::NotFound)?;
        if request.status != JoinRequestStatus::Pending {
            return Err(DaoError::Conflict(
                "Join request has already been resolved".to_string(),
            ));
        }

        if !accept {
            let declined = self
                .join_requests
                .update_one(
                    doc! { "_id": request_id, "status": "pending" },
                    doc! { "$set": { "status": "declined" } },
                )
                .await?;
            if !declined {
                return Err(DaoError::Conflict(
                    "Join request has already been resolved".to_string(),
                ));
            }
            self.activity
                .append(
                    team_id,
                    ActivityAction::JoinRequestDeclined,
                    actor_id,
                    ActorType::Student,
                    "A join request was declined",
                )
                .await?;
            return self.join_requests.find_by_id(request_id).await;
        }

        if team.status != TeamStatus::Active {
            return Err(DaoError::Conflict("Team is not active".to_string()));
        }
        let current = roster::active_member_count(&self.members, team_id).await?;
        roster::require_capacity(&team, current)?;
        roster::assert_free_agent(&self.members, &self.teams, request.student_id).await?;

        let accepted = self
            .join_requests
            .update_one(
                doc! { "_id": request_id, "status": "pending" },
                doc! { "$set": { "status": "accepted" } },
            )
            .await?;
        if !accepted {
            return Err(DaoError::Conflict(
                "Join request has already been resolved".to_string(),
            ));
        }

        let role = MemberRole::default();
        roster::admit(
            &self.members,
            &self.teams,
            team_id,
            request.student_id,
            role.clone(),
        )
        .await?;

        self.activity
            .append(
                team_id,
                ActivityAction::JoinRequestAccepted,
                actor_id,
                ActorType::Student,
                "A join request was accepted",
            )
            .await?;

        drop(_guard);
        drop(_student_guard);
        self.profiles
            .spawn_set_membership(request.student_id, team_id, role);

        self.join_requests.find_by_id(request_id).await
    }

    /// Invitations addressed to a student. Pending entries past their
    /// deadline are expired in place before being returned.
    pub async fn list_invitations_for_student(
        &self,
        student_id: ObjectId,
    ) -> DaoResult<Vec<Invitation>> {
        let now = DateTime::now();
        self.invitations
            .update_many(
                doc! {
                    "recipient_id": student_id,
                    "status": "pending",
                    "expires_at": { "$lte": now },
                },
                doc! { "$set": { "status": "expired" } },
            )
            .await?;

        self.invitations
            .find_many(
                doc! { "recipient_id": student_id },
                Some(doc! { "sent_at": -1 }),
            )
            .await
    }

    pub async fn list_team_invitations(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
    ) -> DaoResult<Vec<Invitation>> {
        let team = self.teams.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;
        self.invitations
            .find_many(doc! { "team_id": team_id }, Some(doc! { "sent_at": -1 }))
            .await
    }

    pub async fn list_team_join_requests(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
    ) -> DaoResult<Vec<JoinRequest>> {
        let team = self.teams.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;
        self.join_requests
            .find_many(doc! { "team_id": team_id }, Some(doc! { "requested_at": -1 }))
            .await
    }
}
