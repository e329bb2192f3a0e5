use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::actor::Actor, state::AppState};
use teamforge_db::models::{MemberRole, Project, ProjectStatus, Team, TeamMember};
use teamforge_services::dao::team::{
    CreateTeamSpec, RecruitingFilter, TeamSettingsPatch, TeamView,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub max_team_size: Option<u32>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_recruiting: bool,
    pub recruitment_message: Option<String>,
    #[serde(default)]
    pub skills_needed: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub max_team_size: Option<u32>,
    pub is_public: Option<bool>,
    pub is_recruiting: Option<bool>,
    pub recruitment_message: Option<String>,
    pub skills_needed: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub leader_id: String,
    pub max_team_size: u32,
    pub member_count: u32,
    pub is_public: bool,
    pub is_recruiting: bool,
    pub recruitment_message: Option<String>,
    pub skills_needed: Vec<String>,
    pub status: String,
    pub mentor: Option<MentorLinkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MentorLinkResponse {
    pub mentor_id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub student_id: String,
    pub role: MemberRole,
    pub responsibilities: Option<String>,
    pub joined_at: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct TeamViewResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub roster: Vec<MemberResponse>,
    pub is_member: bool,
    pub is_leader: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_invitation_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_join_request_count: Option<usize>,
}

pub(crate) fn team_response(team: Team, include_join_code: bool) -> TeamResponse {
    let join_code = include_join_code.then(|| team.join_code.clone());
    TeamResponse {
        id: team.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: team.name,
        description: team.description,
        leader_id: team.leader_id.to_hex(),
        max_team_size: team.max_team_size,
        member_count: team.member_count,
        is_public: team.is_public,
        is_recruiting: team.is_recruiting,
        recruitment_message: team.recruitment_message,
        skills_needed: team.skills_needed,
        status: format!("{:?}", team.status).to_lowercase(),
        mentor: team.mentor.map(|link| MentorLinkResponse {
            mentor_id: link.mentor_id.to_hex(),
            name: link.name,
            status: format!("{:?}", link.status).to_lowercase(),
        }),
        join_code,
    }
}

pub(crate) fn member_response(member: TeamMember) -> MemberResponse {
    MemberResponse {
        student_id: member.student_id.to_hex(),
        role: member.role,
        responsibilities: member.responsibilities,
        joined_at: member
            .joined_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
        status: format!("{:?}", member.status).to_lowercase(),
    }
}

fn view_response(view: TeamView) -> TeamViewResponse {
    let is_leader = view.is_leader;
    TeamViewResponse {
        team: team_response(view.team, is_leader),
        roster: view.roster.into_iter().map(member_response).collect(),
        is_member: view.is_member,
        is_leader,
        pending_invitation_count: view.pending_invitations.map(|i| i.len()),
        pending_join_request_count: view.pending_join_requests.map(|r| r.len()),
    }
}

pub(crate) fn parse_object_id(value: &str, field: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateTeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let founder_id = actor.require_student()?;
    body.validate()?;

    let team = state
        .teams
        .create(
            founder_id,
            CreateTeamSpec {
                name: body.name,
                description: body.description,
                max_team_size: body.max_team_size,
                is_public: body.is_public,
                is_recruiting: body.is_recruiting,
                recruitment_message: body.recruitment_message,
                skills_needed: body.skills_needed,
            },
        )
        .await?;

    Ok(Json(team_response(team, true)))
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let student_id = actor.require_student()?;
    let teams = state.teams.list_for_student(student_id).await?;

    let response = teams
        .into_iter()
        .map(|team| {
            let is_leader = team.leader_id == student_id;
            team_response(team, is_leader)
        })
        .collect();
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub skill: Option<String>,
    pub q: Option<String>,
}

pub async fn explore(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<ExploreQuery>,
) -> Result<Json<Vec<TeamResponse>>, ApiError> {
    let teams = state
        .teams
        .list_recruiting(RecruitingFilter {
            skill: query.skill,
            query: query.q,
        })
        .await?;

    let response = teams
        .into_iter()
        .map(|team| team_response(team, false))
        .collect();
    Ok(Json(response))
}

pub async fn get(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<TeamViewResponse>, ApiError> {
    let tid = parse_object_id(&team_id, "team_id")?;
    let view = state.teams.get_view(tid, actor.id).await?;
    Ok(Json(view_response(view)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Json(body): Json<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    let team = state
        .teams
        .update_settings(
            tid,
            actor_id,
            TeamSettingsPatch {
                name: body.name,
                description: body.description,
                logo: body.logo,
                max_team_size: body.max_team_size,
                is_public: body.is_public,
                is_recruiting: body.is_recruiting,
                recruitment_message: body.recruitment_message,
                skills_needed: body.skills_needed,
            },
        )
        .await?;

    Ok(Json(team_response(team, true)))
}

pub async fn regenerate_join_code(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    let code = state.teams.regenerate_join_code(tid, actor_id).await?;
    Ok(Json(serde_json::json!({ "join_code": code })))
}

#[derive(Debug, Deserialize)]
pub struct JoinWithCodeRequest {
    pub code: String,
}

pub async fn join_with_code(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<JoinWithCodeRequest>,
) -> Result<Json<TeamResponse>, ApiError> {
    let student_id = actor.require_student()?;
    let team = state.teams.join_with_code(&body.code, student_id).await?;
    Ok(Json(team_response(team, false)))
}

pub async fn disband(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    state.teams.disband(tid, actor_id).await?;
    Ok(Json(serde_json::json!({ "disbanded": true })))
}

pub async fn roster(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let tid = parse_object_id(&team_id, "team_id")?;
    let members = state.teams.roster(tid, actor.id).await?;
    Ok(Json(members.into_iter().map(member_response).collect()))
}

pub async fn remove_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((team_id, student_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    let sid = parse_object_id(&student_id, "student_id")?;

    state.teams.remove_member(tid, actor_id, sid).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub tech_stack: Vec<String>,
}

fn project_response(project: Project) -> ProjectResponse {
    ProjectResponse {
        id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: project.name,
        description: project.description,
        status: project.status,
        tech_stack: project.tech_stack,
    }
}

pub async fn add_project(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    body.validate()?;

    let project = state
        .teams
        .add_project(tid, actor_id, body.name, body.description, body.tech_stack)
        .await?;
    Ok(Json(project_response(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let tid = parse_object_id(&team_id, "team_id")?;
    let projects = state.teams.list_projects(tid, actor.id).await?;
    Ok(Json(projects.into_iter().map(project_response).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub status: ProjectStatus,
}

pub async fn update_project(
    State(state): State<AppState>,
    actor: Actor,
    Path((team_id, project_id)): Path<(String, String)>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    let pid = parse_object_id(&project_id, "project_id")?;

    state
        .teams
        .update_project_status(tid, actor_id, pid, body.status)
        .await?;
    Ok(Json(serde_json::json!({ "updated": true })))
}
