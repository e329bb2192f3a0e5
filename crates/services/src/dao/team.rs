use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;
use teamforge_config::RecruitmentSettings;
use teamforge_db::models::{
    ActivityAction, ActorType, Invitation, JoinRequest, MemberRole, Project, ProjectStatus,
    StandardRole, Team, TeamMember, TeamStatus,
};

use super::activity::ActivityDao;
use super::base::{BaseDao, DaoError, DaoResult};
use super::profile::ProfileDao;
use super::roster;
use crate::locks::{StudentLocks, TeamLocks};

pub struct CreateTeamSpec {
    pub name: String,
    pub description: Option<String>,
    pub max_team_size: Option<u32>,
    pub is_public: bool,
    pub is_recruiting: bool,
    pub recruitment_message: Option<String>,
    pub skills_needed: Vec<String>,
}

#[derive(Default)]
pub struct TeamSettingsPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub max_team_size: Option<u32>,
    pub is_public: Option<bool>,
    pub is_recruiting: Option<bool>,
    pub recruitment_message: Option<String>,
    pub skills_needed: Option<Vec<String>>,
}

/// Role-scoped projection of one team. The api layer decides field
/// exposure from the `is_leader` / `is_member` flags.
#[derive(Serialize)]
pub struct TeamView {
    pub team: Team,
    pub roster: Vec<TeamMember>,
    pub is_member: bool,
    pub is_leader: bool,
    pub pending_invitations: Option<Vec<Invitation>>,
    pub pending_join_requests: Option<Vec<JoinRequest>>,
}

pub struct RecruitingFilter {
    pub skill: Option<String>,
    pub query: Option<String>,
}

pub struct TeamDao {
    pub base: BaseDao<Team>,
    pub members: BaseDao<TeamMember>,
    invitations: BaseDao<Invitation>,
    join_requests: BaseDao<JoinRequest>,
    projects: BaseDao<Project>,
    activity: ActivityDao,
    profiles: Arc<ProfileDao>,
    locks: Arc<TeamLocks>,
    student_locks: Arc<StudentLocks>,
    defaults: RecruitmentSettings,
}

impl TeamDao {
    pub fn new(
        db: &Database,
        locks: Arc<TeamLocks>,
        student_locks: Arc<StudentLocks>,
        profiles: Arc<ProfileDao>,
        defaults: RecruitmentSettings,
    ) -> Self {
        Self {
            base: BaseDao::new(db, Team::COLLECTION),
            members: BaseDao::new(db, TeamMember::COLLECTION),
            invitations: BaseDao::new(db, Invitation::COLLECTION),
            join_requests: BaseDao::new(db, JoinRequest::COLLECTION),
            projects: BaseDao::new(db, Project::COLLECTION),
            activity: ActivityDao::new(db),
            profiles,
            locks,
            student_locks,
            defaults,
        }
    }

    pub async fn create(&self, founder_id: ObjectId, spec: CreateTeamSpec) -> DaoResult<Team> {
        if spec.name.trim().is_empty() {
            return Err(DaoError::InvalidArgument("Team name is required".to_string()));
        }
        let max_team_size = spec
            .max_team_size
            .unwrap_or(self.defaults.default_max_team_size);
        if !(Team::MIN_SIZE..=Team::MAX_SIZE).contains(&max_team_size) {
            return Err(DaoError::InvalidArgument(format!(
                "max_team_size must be between {} and {}",
                Team::MIN_SIZE,
                Team::MAX_SIZE
            )));
        }

        // The one-led-team and one-membership rules span teams, so the
        // founder's own lock serializes this against any concurrent
        // admission of the same student.
        let founder_guard = self.student_locks.acquire(founder_id).await;

        let leading = self
            .base
            .count(doc! { "leader_id": founder_id, "status": { "$ne": "disbanded" } })
            .await?;
        if leading > 0 {
            return Err(DaoError::Conflict(
                "Student already leads an active team".to_string(),
            ));
        }
        roster::assert_free_agent(&self.members, &self.base, founder_id).await?;

        // Confirms the founder profile resolves before creating anything.
        self.profiles.student_summary(founder_id).await?;

        let now = DateTime::now();
        let mut team = Team {
            id: None,
            name: spec.name,
            description: spec.description,
            logo: None,
            leader_id: founder_id,
            created_by: founder_id,
            max_team_size,
            is_public: spec.is_public,
            is_recruiting: spec.is_recruiting,
            recruitment_message: spec.recruitment_message,
            skills_needed: spec.skills_needed,
            join_code: generate_join_code(),
            mentor: None,
            status: TeamStatus::Active,
            member_count: 0,
            formation_date: now,
            last_activity_at: now,
            created_at: now,
            updated_at: now,
        };

        // The 8-hex code space makes collisions negligible, but the
        // unique index can still fire; draw a fresh code and retry.
        let team_id = loop {
            match self.base.insert_one(&team).await {
                Ok(id) => break id,
                Err(DaoError::DuplicateKey(_)) => {
                    team.join_code = generate_join_code();
                }
                Err(err) => return Err(err),
            }
        };

        let leader_role = MemberRole::Standard(StandardRole::Leader);
        roster::admit(&self.members, &self.base, team_id, founder_id, leader_role.clone())
            .await?;

        self.activity
            .append(
                team_id,
                ActivityAction::TeamCreated,
                founder_id,
                ActorType::Student,
                format!("Team \"{}\" was created", team.name),
            )
            .await?;

        drop(founder_guard);
        self.profiles
            .spawn_set_membership(founder_id, team_id, leader_role);

        self.base.find_by_id(team_id).await
    }

    pub async fn update_settings(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        patch: TeamSettingsPatch,
    ) -> DaoResult<Team> {
        let _guard = self.locks.acquire(team_id).await;

        let team = self.base.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;

        let mut set_doc = doc! {};
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(DaoError::InvalidArgument("Team name is required".to_string()));
            }
            set_doc.insert("name", name);
        }
        if let Some(description) = patch.description {
            set_doc.insert("description", description);
        }
        if let Some(logo) = patch.logo {
            set_doc.insert("logo", logo);
        }
        if let Some(max_team_size) = patch.max_team_size {
            if !(Team::MIN_SIZE..=Team::MAX_SIZE).contains(&max_team_size) {
                return Err(DaoError::InvalidArgument(format!(
                    "max_team_size must be between {} and {}",
                    Team::MIN_SIZE,
                    Team::MAX_SIZE
                )));
            }
            let current = roster::active_member_count(&self.members, team_id).await?;
            if (max_team_size as u64) < current {
                return Err(DaoError::InvalidArgument(
                    "max_team_size cannot be below the current roster size".to_string(),
                ));
            }
            set_doc.insert("max_team_size", max_team_size as i32);
        }
        if let Some(is_public) = patch.is_public {
            set_doc.insert("is_public", is_public);
        }
        if let Some(is_recruiting) = patch.is_recruiting {
            set_doc.insert("is_recruiting", is_recruiting);
        }
        if let Some(message) = patch.recruitment_message {
            set_doc.insert("recruitment_message", message);
        }
        if let Some(skills) = patch.skills_needed {
            set_doc.insert("skills_needed", skills);
        }

        if set_doc.is_empty() {
            return Err(DaoError::InvalidArgument("No settings to update".to_string()));
        }

        self.base
            .update_by_id(team_id, doc! { "$set": set_doc })
            .await?;

        self.activity
            .append(
                team_id,
                ActivityAction::SettingsUpdated,
                actor_id,
                ActorType::Student,
                "Team settings were updated",
            )
            .await?;

        self.base.find_by_id(team_id).await
    }

    pub async fn regenerate_join_code(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
    ) -> DaoResult<String> {
        let _guard = self.locks.acquire(team_id).await;

        let team = self.base.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;

        let code = loop {
            let code = generate_join_code();
            match self
                .base
                .update_by_id(team_id, doc! { "$set": { "join_code": &code } })
                .await
            {
                Ok(_) => break code,
                Err(DaoError::DuplicateKey(_)) => continue,
                Err(err) => return Err(err),
            }
        };

        self.activity
            .append(
                team_id,
                ActivityAction::JoinCodeRegenerated,
                actor_id,
                ActorType::Student,
                "Join code was regenerated",
            )
            .await?;

        Ok(code)
    }

    /// Direct roster admission by code, bypassing the approval flows.
    /// Serialized on the team lock so two students racing for the last
    /// slot cannot both pass the capacity check, and so a concurrent
    /// code regeneration cannot be redeemed stale.
    pub async fn join_with_code(&self, code: &str, student_id: ObjectId) -> DaoResult<Team> {
        let team = self
            .base
            .find_one(doc! { "join_code": code })
            .await?
            .ok_or(DaoError::NotFound)?;
        let team_id = team.id.expect("loaded team has id");

        // Student lock first, then team lock (fixed order, see locks.rs).
        let _student_guard = self.student_locks.acquire(student_id).await;
        let _guard = self.locks.acquire(team_id).await;

        // Re-read under the lock: the code may have been rotated.
        let team = self.base.find_by_id(team_id).await?;
        if team.join_code != code {
            return Err(DaoError::Conflict("Join code is no longer valid".to_string()));
        }
        if team.status != TeamStatus::Active {
            return Err(DaoError::Conflict("Team is not active".to_string()));
        }

        self.profiles.student_summary(student_id).await?;

        let current = roster::active_member_count(&self.members, team_id).await?;
        roster::require_capacity(&team, current)?;
        roster::assert_free_agent(&self.members, &self.base, student_id).await?;

        let role = MemberRole::default();
        roster::admit(&self.members, &self.base, team_id, student_id, role.clone()).await?;

        self.activity
            .append(
                team_id,
                ActivityAction::MemberJoined,
                student_id,
                ActorType::Student,
                "Student joined with the team code",
            )
            .await?;

        drop(_guard);
        drop(_student_guard);
        self.profiles.spawn_set_membership(student_id, team_id, role);

        self.base.find_by_id(team_id).await
    }

    pub async fn remove_member(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        student_id: ObjectId,
    ) -> DaoResult<()> {
        let _guard = self.locks.acquire(team_id).await;

        let team = self.base.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;

        if student_id == team.leader_id {
            return Err(DaoError::InvalidArgument(
                "The team leader cannot be removed".to_string(),
            ));
        }

        let removed = self
            .members
            .update_one(
                doc! { "team_id": team_id, "student_id": student_id, "status": "active" },
                doc! { "$set": { "status": "left" } },
            )
            .await?;
        if !removed {
            return Err(DaoError::NotFound);
        }

        self.base
            .update_by_id(team_id, doc! { "$inc": { "member_count": -1 } })
            .await?;

        self.activity
            .append(
                team_id,
                ActivityAction::MemberRemoved,
                actor_id,
                ActorType::Student,
                "A member was removed from the team",
            )
            .await?;

        drop(_guard);
        self.profiles.spawn_clear_membership(student_id, team_id);

        Ok(())
    }

    pub async fn disband(&self, team_id: ObjectId, actor_id: ObjectId) -> DaoResult<()> {
        let _guard = self.locks.acquire(team_id).await;

        let team = self.base.find_by_id(team_id).await?;
        roster::require_leader(&team, actor_id)?;
        if team.status == TeamStatus::Disbanded {
            return Err(DaoError::Conflict("Team is already disbanded".to_string()));
        }

        self.base
            .update_by_id(team_id, doc! { "$set": { "status": "disbanded" } })
            .await?;

        self.activity
            .append(
                team_id,
                ActivityAction::TeamDisbanded,
                actor_id,
                ActorType::Student,
                "Team was disbanded",
            )
            .await?;

        let members = self
            .members
            .find_many(doc! { "team_id": team_id, "status": "active" }, None)
            .await?;

        drop(_guard);
        for member in members {
            self.profiles.spawn_clear_membership(member.student_id, team_id);
        }

        Ok(())
    }

    pub async fn get_view(&self, team_id: ObjectId, actor_id: ObjectId) -> DaoResult<TeamView> {
        let team = self.base.find_by_id(team_id).await?;

        let membership =
            roster::find_active_member(&self.members, team_id, actor_id).await?;
        let is_member = membership.is_some();
        let is_leader = team.leader_id == actor_id;

        if !team.is_public && !is_member {
            return Err(DaoError::Forbidden(
                "This team is private".to_string(),
            ));
        }

        let roster = self
            .members
            .find_many(
                doc! { "team_id": team_id, "status": "active" },
                Some(doc! { "joined_at": 1 }),
            )
            .await?;

        let (pending_invitations, pending_join_requests) = if is_leader {
            let invitations = self
                .invitations
                .find_many(
                    doc! { "team_id": team_id, "status": "pending" },
                    Some(doc! { "sent_at": -1 }),
                )
                .await?;
            let requests = self
                .join_requests
                .find_many(
                    doc! { "team_id": team_id, "status": "pending" },
                    Some(doc! { "requested_at": -1 }),
                )
                .await?;
            (Some(invitations), Some(requests))
        } else {
            (None, None)
        };

        Ok(TeamView {
            team,
            roster,
            is_member,
            is_leader,
            pending_invitations,
            pending_join_requests,
        })
    }

    pub async fn roster(&self, team_id: ObjectId, actor_id: ObjectId) -> DaoResult<Vec<TeamMember>> {
        let view = self.get_view(team_id, actor_id).await?;
        Ok(view.roster)
    }

    pub async fn list_for_student(&self, student_id: ObjectId) -> DaoResult<Vec<Team>> {
        let memberships = self
            .members
            .find_many(doc! { "student_id": student_id, "status": "active" }, None)
            .await?;

        let team_ids: Vec<ObjectId> = memberships.iter().map(|m| m.team_id).collect();
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": team_ids }, "status": { "$ne": "disbanded" } },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn list_recruiting(&self, filter: RecruitingFilter) -> DaoResult<Vec<Team>> {
        let mut query = doc! {
            "status": "active",
            "is_public": true,
            "is_recruiting": true,
        };

        if let Some(skill) = filter.skill {
            query.insert("skills_needed", skill);
        }
        if let Some(text) = filter.query {
            // Escape regex special chars for safe MongoDB $regex usage
            let escaped: String = text
                .chars()
                .flat_map(|c| {
                    if ".*+?^${}()|[]\\".contains(c) {
                        vec!['\\', c]
                    } else {
                        vec![c]
                    }
                })
                .collect();
            query.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": &escaped, "$options": "i" } },
                    doc! { "description": { "$regex": &escaped, "$options": "i" } },
                    doc! { "recruitment_message": { "$regex": &escaped, "$options": "i" } },
                ],
            );
        }

        self.base
            .find_many(query, Some(doc! { "last_activity_at": -1 }))
            .await
    }

    pub async fn add_project(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        name: String,
        description: Option<String>,
        tech_stack: Vec<String>,
    ) -> DaoResult<Project> {
        if name.trim().is_empty() {
            return Err(DaoError::InvalidArgument("Project name is required".to_string()));
        }

        self.base.find_by_id(team_id).await?;
        if roster::find_active_member(&self.members, team_id, actor_id)
            .await?
            .is_none()
        {
            return Err(DaoError::Forbidden(
                "Only team members can manage projects".to_string(),
            ));
        }

        let now = DateTime::now();
        let project = Project {
            id: None,
            team_id,
            name,
            description,
            status: ProjectStatus::Planning,
            tech_stack,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let id = self.projects.insert_one(&project).await?;

        self.activity
            .append(
                team_id,
                ActivityAction::ProjectAdded,
                actor_id,
                ActorType::Student,
                format!("Project \"{}\" was added", project.name),
            )
            .await?;

        self.projects.find_by_id(id).await
    }

    pub async fn update_project_status(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
        project_id: ObjectId,
        status: ProjectStatus,
    ) -> DaoResult<()> {
        self.base.find_by_id(team_id).await?;
        if roster::find_active_member(&self.members, team_id, actor_id)
            .await?
            .is_none()
        {
            return Err(DaoError::Forbidden(
                "Only team members can manage projects".to_string(),
            ));
        }

        let mut set_doc = doc! { "status": bson::to_bson(&status)? };
        match status {
            ProjectStatus::InProgress => {
                set_doc.insert("started_at", DateTime::now());
            }
            ProjectStatus::Completed => {
                set_doc.insert("completed_at", DateTime::now());
            }
            _ => {}
        }

        let updated = self
            .projects
            .update_one(
                doc! { "_id": project_id, "team_id": team_id },
                doc! { "$set": set_doc },
            )
            .await?;
        if !updated {
            return Err(DaoError::NotFound);
        }

        self.activity
            .append(
                team_id,
                ActivityAction::ProjectUpdated,
                actor_id,
                ActorType::Student,
                "Project status was updated",
            )
            .await?;

        Ok(())
    }

    pub async fn list_projects(
        &self,
        team_id: ObjectId,
        actor_id: ObjectId,
    ) -> DaoResult<Vec<Project>> {
        // Same visibility rule as the team view.
        self.get_view(team_id, actor_id).await?;
        self.projects
            .find_many(doc! { "team_id": team_id }, Some(doc! { "created_at": 1 }))
            .await
    }
}

/// 8 hex chars from the thread-local CSPRNG.
fn generate_join_code() -> String {
    let mut bytes = [0u8; 4];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
