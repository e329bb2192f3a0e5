use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extractors::actor::Actor,
    routes::team::parse_object_id,
    state::AppState,
};
use teamforge_db::models::{Invitation, JoinRequest, MemberRole};

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub recipient_id: String,
    #[serde(default)]
    pub role: MemberRole,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub team_id: String,
    pub recipient_id: String,
    pub role: MemberRole,
    pub message: Option<String>,
    pub status: String,
    pub sent_at: String,
    pub expires_at: String,
}

fn invitation_response(invitation: Invitation) -> InvitationResponse {
    InvitationResponse {
        id: invitation.id.map(|id| id.to_hex()).unwrap_or_default(),
        team_id: invitation.team_id.to_hex(),
        recipient_id: invitation.recipient_id.to_hex(),
        role: invitation.role,
        message: invitation.message,
        status: format!("{:?}", invitation.status).to_lowercase(),
        sent_at: invitation.sent_at.try_to_rfc3339_string().unwrap_or_default(),
        expires_at: invitation
            .expires_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

#[derive(Debug, Serialize)]
pub struct JoinRequestResponse {
    pub id: String,
    pub team_id: String,
    pub student_id: String,
    pub message: Option<String>,
    pub status: String,
    pub requested_at: String,
}

fn join_request_response(request: JoinRequest) -> JoinRequestResponse {
    JoinRequestResponse {
        id: request.id.map(|id| id.to_hex()).unwrap_or_default(),
        team_id: request.team_id.to_hex(),
        student_id: request.student_id.to_hex(),
        message: request.message,
        status: format!("{:?}", request.status).to_lowercase(),
        requested_at: request
            .requested_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub accept: bool,
}

pub async fn invite(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Json(body): Json<InviteRequest>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    let recipient_id = parse_object_id(&body.recipient_id, "recipient_id")?;

    let invitation = state
        .recruitment
        .invite(tid, actor_id, recipient_id, body.role, body.message)
        .await?;
    Ok(Json(invitation_response(invitation)))
}

pub async fn list_team_invitations(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    let invitations = state
        .recruitment
        .list_team_invitations(tid, actor_id)
        .await?;
    Ok(Json(
        invitations.into_iter().map(invitation_response).collect(),
    ))
}

pub async fn list_my_invitations(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let student_id = actor.require_student()?;

    let invitations = state
        .recruitment
        .list_invitations_for_student(student_id)
        .await?;
    Ok(Json(
        invitations.into_iter().map(invitation_response).collect(),
    ))
}

pub async fn respond_to_invitation(
    State(state): State<AppState>,
    actor: Actor,
    Path(invitation_id): Path<String>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let student_id = actor.require_student()?;
    let iid = parse_object_id(&invitation_id, "invitation_id")?;

    let invitation = state
        .recruitment
        .respond_to_invitation(iid, student_id, body.accept)
        .await?;
    Ok(Json(invitation_response(invitation)))
}

#[derive(Debug, Deserialize)]
pub struct ApplyToJoinRequest {
    pub message: Option<String>,
}

pub async fn apply_to_join(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Json(body): Json<ApplyToJoinRequest>,
) -> Result<Json<JoinRequestResponse>, ApiError> {
    let student_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    let request = state
        .recruitment
        .apply_to_join(tid, student_id, body.message)
        .await?;
    Ok(Json(join_request_response(request)))
}

pub async fn list_team_join_requests(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<JoinRequestResponse>>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    let requests = state
        .recruitment
        .list_team_join_requests(tid, actor_id)
        .await?;
    Ok(Json(
        requests.into_iter().map(join_request_response).collect(),
    ))
}

pub async fn respond_to_join_request(
    State(state): State<AppState>,
    actor: Actor,
    Path((team_id, request_id)): Path<(String, String)>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<JoinRequestResponse>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    let rid = parse_object_id(&request_id, "request_id")?;

    let request = state
        .recruitment
        .respond_to_join_request(tid, rid, actor_id, body.accept)
        .await?;
    Ok(Json(join_request_response(request)))
}
