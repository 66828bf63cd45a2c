use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        envelope::Success,
        session::{
            CastVoteRequest, CreateSessionRequest, EliminateRequest, JoinPayload,
            JoinSessionRequest, LocatePayload, LocateTargetRequest, PlayerActionRequest,
            SessionPayload, TaskPayload,
        },
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes handling all game session actions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/locate", post(locate_target))
        .route("/sessions/{id}/task", post(complete_task))
        .route("/sessions/{id}/meeting", post(call_meeting))
        .route("/sessions/{id}/eliminate", post(eliminate_player))
        .route("/sessions/{id}/vote", post(cast_vote))
        .route("/sessions/{id}/tick", post(tick))
}

/// Create a fresh session and persist it.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionPayload)
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::create_session(&state, payload).await?;
    Ok(Success::new(payload))
}

/// Read the current session state (the polling endpoint).
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Current session state", body = SessionPayload),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::get_session(&state, &id).await?;
    Ok(Success::new(payload))
}

/// Join a session as a new player.
#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = JoinSessionRequest,
    responses(
        (status = 200, description = "Joined (idempotent for a known player)", body = JoinPayload),
        (status = 409, description = "Session full or game already started")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinSessionRequest>>,
) -> Result<Success<JoinPayload>, AppError> {
    let payload = session_service::join_session(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Start the game (host only).
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Game started", body = SessionPayload),
        (status = 409, description = "Not host, already started, or not enough players")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerActionRequest>>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::start_session(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Hit-test a click against the hidden targets.
#[utoipa::path(
    post,
    path = "/sessions/{id}/locate",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = LocateTargetRequest,
    responses(
        (status = 200, description = "Hit-test result; misses are soft no-ops", body = LocatePayload)
    )
)]
pub async fn locate_target(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<LocateTargetRequest>>,
) -> Result<Success<LocatePayload>, AppError> {
    let payload = session_service::locate_target(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Record one completed task for a crewmate.
#[utoipa::path(
    post,
    path = "/sessions/{id}/task",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Task progress recorded", body = TaskPayload)
    )
)]
pub async fn complete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerActionRequest>>,
) -> Result<Success<TaskPayload>, AppError> {
    let payload = session_service::complete_task(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Call an emergency meeting.
#[utoipa::path(
    post,
    path = "/sessions/{id}/meeting",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Meeting opened", body = SessionPayload),
        (status = 409, description = "Caller not alive or wrong phase")
    )
)]
pub async fn call_meeting(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<PlayerActionRequest>>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::call_meeting(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Eliminate a player as an impostor.
#[utoipa::path(
    post,
    path = "/sessions/{id}/eliminate",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = EliminateRequest,
    responses(
        (status = 200, description = "Player eliminated", body = SessionPayload),
        (status = 409, description = "Actor not an impostor or target not alive")
    )
)]
pub async fn eliminate_player(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<EliminateRequest>>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::eliminate_player(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Cast a vote; omitting the target skips.
#[utoipa::path(
    post,
    path = "/sessions/{id}/vote",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = CastVoteRequest,
    responses(
        (status = 200, description = "Vote recorded, tally resolved when complete", body = SessionPayload),
        (status = 409, description = "Voter not alive or wrong phase")
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<CastVoteRequest>>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::cast_vote(&state, &id, payload).await?;
    Ok(Success::new(payload))
}

/// Advance the session countdowns by one second (external ~1 Hz cadence).
#[utoipa::path(
    post,
    path = "/sessions/{id}/tick",
    tag = "session",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Countdown advanced (idempotent)", body = SessionPayload)
    )
)]
pub async fn tick(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Success<SessionPayload>, AppError> {
    let payload = session_service::tick(&state, &id).await?;
    Ok(Success::new(payload))
}
