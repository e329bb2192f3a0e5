use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;

use crate::{
    error::ApiError,
    extractors::actor::Actor,
    routes::team::parse_object_id,
    state::AppState,
};
use teamforge_db::models::ActivityLog;
use teamforge_services::dao::base::PaginationParams;

#[derive(Debug, Serialize)]
pub struct ActivityEntryResponse {
    pub action: String,
    pub description: String,
    pub actor_id: String,
    pub actor_type: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityFeedResponse {
    pub items: Vec<ActivityEntryResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn entry_response(entry: ActivityLog) -> ActivityEntryResponse {
    ActivityEntryResponse {
        action: serde_json::to_value(entry.action)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        description: entry.description,
        actor_id: entry.actor_id.to_hex(),
        actor_type: format!("{:?}", entry.actor_type).to_lowercase(),
        created_at: entry
            .created_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

pub async fn feed(
    State(state): State<AppState>,
    actor: Actor,
    Path(team_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ActivityFeedResponse>, ApiError> {
    let tid = parse_object_id(&team_id, "team_id")?;

    // Same visibility rule as the team view.
    state.teams.get_view(tid, actor.id).await?;

    let feed = state.activity.feed(tid, &params).await?;
    Ok(Json(ActivityFeedResponse {
        items: feed.items.into_iter().map(entry_response).collect(),
        total: feed.total,
        page: feed.page,
        per_page: feed.per_page,
    }))
}
