pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Team routes
    let team_routes = Router::new()
        .route("/", get(routes::team::list))
        .route("/", post(routes::team::create))
        .route("/explore", get(routes::team::explore))
        .route("/join", post(routes::team::join_with_code))
        .route("/{team_id}", get(routes::team::get))
        .route("/{team_id}", put(routes::team::update))
        .route("/{team_id}/join-code", post(routes::team::regenerate_join_code))
        .route("/{team_id}/disband", post(routes::team::disband))
        .route("/{team_id}/member", get(routes::team::roster))
        .route(
            "/{team_id}/member/{student_id}",
            delete(routes::team::remove_member),
        )
        .route("/{team_id}/activity", get(routes::activity::feed));

    // Recruitment routes (under team)
    let recruitment_routes = Router::new()
        .route("/{team_id}/invitation", post(routes::recruitment::invite))
        .route(
            "/{team_id}/invitation",
            get(routes::recruitment::list_team_invitations),
        )
        .route(
            "/{team_id}/join-request",
            post(routes::recruitment::apply_to_join),
        )
        .route(
            "/{team_id}/join-request",
            get(routes::recruitment::list_team_join_requests),
        )
        .route(
            "/{team_id}/join-request/{request_id}/respond",
            post(routes::recruitment::respond_to_join_request),
        );

    // Invitation routes addressed to the signed-in student
    let invitation_routes = Router::new()
        .route("/", get(routes::recruitment::list_my_invitations))
        .route(
            "/{invitation_id}/respond",
            post(routes::recruitment::respond_to_invitation),
        );

    // Mentor matchmaking routes (under team)
    let mentor_team_routes = Router::new()
        .route("/{team_id}/mentor-application", post(routes::mentor::apply))
        .route(
            "/{team_id}/mentor-application",
            get(routes::mentor::list_for_team),
        )
        .route(
            "/{team_id}/mentor-application/{application_id}/cancel",
            post(routes::mentor::cancel),
        )
        .route("/{team_id}/feedback", post(routes::mentor::record_feedback));

    // Mentor-side routes
    let mentor_routes = Router::new()
        .route("/application", get(routes::mentor::pending_for_mentor))
        .route(
            "/application/{application_id}/decide",
            post(routes::mentor::decide),
        );

    // Project routes (under team)
    let project_routes = Router::new()
        .route("/{team_id}/project", post(routes::team::add_project))
        .route("/{team_id}/project", get(routes::team::list_projects))
        .route(
            "/{team_id}/project/{project_id}",
            put(routes::team::update_project),
        );

    // Compose API
    let api = Router::new()
        .nest(
            "/team",
            team_routes
                .merge(recruitment_routes)
                .merge(mentor_team_routes)
                .merge(project_routes),
        )
        .nest("/invitation", invitation_routes)
        .nest("/mentor", mentor_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
