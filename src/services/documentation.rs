use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Crowd Hunt Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::get_session,
        crate::routes::session::join_session,
        crate::routes::session::start_session,
        crate::routes::session::locate_target,
        crate::routes::session::complete_task,
        crate::routes::session::call_meeting,
        crate::routes::session::eliminate_player,
        crate::routes::session::cast_vote,
        crate::routes::session::tick,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::JoinSessionRequest,
            crate::dto::session::PlayerActionRequest,
            crate::dto::session::LocateTargetRequest,
            crate::dto::session::EliminateRequest,
            crate::dto::session::CastVoteRequest,
            crate::dto::session::SessionSnapshot,
            crate::dto::session::SessionPayload,
            crate::dto::session::JoinPayload,
            crate::dto::session::LocatePayload,
            crate::dto::session::TaskPayload,
            crate::dto::session::PlayerSummary,
            crate::dto::session::TargetSummary,
            crate::dto::session::LeaderboardEntryDto,
            crate::dao::models::GameVariant,
            crate::dao::models::Phase,
            crate::dao::models::Role,
            crate::dao::models::PlayerStatus,
            crate::dao::models::Difficulty,
            crate::dao::models::Winner,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Game session actions"),
    )
)]
pub struct ApiDoc;
