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
use teamforge_db::models::MentorApplication;
use teamforge_services::dao::mentor::ApplicationWithMentor;

#[derive(Debug, Deserialize)]
pub struct ApplyToMentorRequest {
    pub mentor_id: String,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: String,
    pub team_id: String,
    pub mentor_id: String,
    pub message: Option<String>,
    pub status: String,
    pub applied_at: String,
    pub decided_at: Option<String>,
}

fn application_response(application: MentorApplication) -> ApplicationResponse {
    ApplicationResponse {
        id: application.id.map(|id| id.to_hex()).unwrap_or_default(),
        team_id: application.team_id.to_hex(),
        mentor_id: application.mentor_id.to_hex(),
        message: application.message,
        status: format!("{:?}", application.status).to_lowercase(),
        applied_at: application
            .applied_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
        decided_at: application
            .decided_at
            .and_then(|dt| dt.try_to_rfc3339_string().ok()),
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationWithMentorResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub mentor_name: Option<String>,
    pub mentor_expertise: Vec<String>,
}

fn joined_response(entry: ApplicationWithMentor) -> ApplicationWithMentorResponse {
    let (mentor_name, mentor_expertise) = match entry.mentor {
        Some(mentor) => (Some(mentor.name), mentor.expertise),
        None => (None, Vec::new()),
    };
    ApplicationWithMentorResponse {
        application: application_response(entry.application),
        mentor_name,
        mentor_expertise,
    }
}

pub async fn apply(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Json(body): Json<ApplyToMentorRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    let mentor_id = parse_object_id(&body.mentor_id, "mentor_id")?;

    let application = state
        .mentors
        .apply_to_mentor(tid, actor_id, mentor_id, body.message)
        .await?;
    Ok(Json(application_response(application)))
}

pub async fn list_for_team(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<ApplicationWithMentorResponse>>, ApiError> {
    let tid = parse_object_id(&team_id, "team_id")?;

    let applications = state.mentors.applications_for_team(tid, actor.id).await?;
    Ok(Json(applications.into_iter().map(joined_response).collect()))
}

pub async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path((team_id, application_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor_id = actor.require_student()?;
    let tid = parse_object_id(&team_id, "team_id")?;
    let aid = parse_object_id(&application_id, "application_id")?;

    state.mentors.cancel_application(tid, actor_id, aid).await?;
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

pub async fn pending_for_mentor(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    let mentor_id = actor.require_mentor()?;

    let applications = state.mentors.pending_for_mentor(mentor_id).await?;
    Ok(Json(
        applications.into_iter().map(application_response).collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub accept: bool,
}

pub async fn decide(
    State(state): State<AppState>,
    actor: Actor,
    Path(application_id): Path<String>,
    Json(body): Json<DecideRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let mentor_id = actor.require_mentor()?;
    let aid = parse_object_id(&application_id, "application_id")?;

    let application = state
        .mentors
        .decide_application(mentor_id, aid, body.accept)
        .await?;
    Ok(Json(application_response(application)))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub text: String,
}

pub async fn record_feedback(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mentor_id = actor.require_mentor()?;
    let tid = parse_object_id(&team_id, "team_id")?;

    state.mentors.record_feedback(tid, mentor_id, body.text).await?;
    Ok(Json(serde_json::json!({ "recorded": true })))
}
