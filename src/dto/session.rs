use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::{Difficulty, GameVariant, Phase, PlayerStatus, Role, Winner};
use crate::dto::format_system_time;
use crate::dto::validation::{validate_display_name, validate_identifier};
use crate::state::session::{GameSession, LeaderboardEntry, Player, SpawnPoint, Target};

/// Payload used to bootstrap a brand-new game session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// External session id (hosting-platform post id). Generated when omitted.
    #[serde(default)]
    #[validate(custom(function = validate_identifier))]
    pub session_id: Option<String>,
    /// Platform identity of the host.
    #[validate(custom(function = validate_identifier))]
    pub host_id: String,
    /// Display name of the host.
    #[validate(custom(function = validate_display_name))]
    pub host_name: String,
    /// Ruleset the session should run under.
    pub variant: GameVariant,
}

/// Payload for joining an existing session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinSessionRequest {
    /// Platform identity of the joining player.
    #[validate(custom(function = validate_identifier))]
    pub player_id: String,
    /// Display name chosen by the player.
    #[validate(custom(function = validate_display_name))]
    pub username: String,
}

/// Payload naming the acting player for bodyless actions.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerActionRequest {
    /// Platform identity of the acting player.
    #[validate(custom(function = validate_identifier))]
    pub player_id: String,
}

/// Payload for a locate-target attempt.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LocateTargetRequest {
    /// Platform identity of the clicking player.
    #[validate(custom(function = validate_identifier))]
    pub player_id: String,
    /// Click x in the 0-100 scene space.
    #[validate(range(min = 0.0, max = 100.0))]
    pub x: f32,
    /// Click y in the 0-100 scene space.
    #[validate(range(min = 0.0, max = 100.0))]
    pub y: f32,
}

/// Payload for an impostor elimination.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EliminateRequest {
    /// Platform identity of the acting impostor.
    #[validate(custom(function = validate_identifier))]
    pub player_id: String,
    /// Player to eliminate.
    #[validate(custom(function = validate_identifier))]
    pub target_id: String,
}

/// Payload for casting a vote; a missing target is a skip.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CastVoteRequest {
    /// Platform identity of the voter.
    #[validate(custom(function = validate_identifier))]
    pub player_id: String,
    /// Candidate voted for; omit to skip.
    #[serde(default)]
    #[validate(custom(function = validate_identifier))]
    pub target_id: Option<String>,
}

/// Spawn position exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PositionDto {
    /// Horizontal coordinate in the 0-100 scene space.
    pub x: f32,
    /// Vertical coordinate in the 0-100 scene space.
    pub y: f32,
}

/// Public projection of a target.
///
/// Bounding boxes are deliberately not serialized: hit regions stay
/// server-side so clients cannot scrape the answers.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TargetSummary {
    /// Target identifier.
    pub id: u32,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Whether the target has been found.
    pub found: bool,
    /// Player who found it.
    pub found_by: Option<String>,
    /// When it was found (RFC 3339).
    pub found_at: Option<String>,
}

/// Public projection of a participant.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Platform identity of the player.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Cumulative score.
    pub score: u32,
    /// Liveness within the session.
    pub status: PlayerStatus,
    /// Dealt role, once assigned (social-deduction variant).
    pub role: Option<Role>,
    /// Whether the player voted this round (social-deduction variant).
    pub has_voted: Option<bool>,
    /// Tasks finished so far (social-deduction variant).
    pub tasks_completed: Option<u8>,
    /// Tasks assigned at start (social-deduction variant).
    pub total_tasks: Option<u8>,
    /// Targets found by this player (hidden-object variant).
    pub found_target_ids: Option<Vec<u32>>,
    /// When the player finished their objective set (RFC 3339).
    pub completed_at: Option<String>,
    /// Spawn position (social-deduction variant).
    pub position: Option<PositionDto>,
}

/// One row of the final ranking.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntryDto {
    /// 1-based position.
    pub rank: usize,
    /// Player this row describes.
    pub player_id: String,
    /// Display name at the time the board was built.
    pub display_name: String,
    /// Final score.
    pub score: u32,
    /// Completion timestamp used as the tie-breaker (RFC 3339).
    pub completed_at: Option<String>,
}

/// Full session state returned by every action.
///
/// Per-viewer redaction (hiding other players' roles mid-game) is the
/// calling router's concern; the core always reports the authoritative
/// record.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// External session identifier.
    pub id: String,
    /// Ruleset the session runs under.
    pub variant: GameVariant,
    /// Current phase.
    pub phase: Phase,
    /// Player id of the host.
    pub host_id: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Participants in join order.
    pub players: Vec<PlayerSummary>,
    /// Target statuses (hidden-object variant).
    pub targets: Option<Vec<TargetSummary>>,
    /// Remaining round seconds (hidden-object variant).
    pub time_left: Option<u32>,
    /// Remaining discussion seconds, while in `discussion`.
    pub discussion_time_left: Option<u32>,
    /// Remaining voting seconds, while in `voting`.
    pub voting_time_left: Option<u32>,
    /// Outcome, once the session has ended.
    pub winner: Option<Winner>,
    /// Caller of the current/last meeting.
    pub meeting_caller_id: Option<String>,
    /// Most recently eliminated player.
    pub last_eliminated_id: Option<String>,
    /// When gameplay started (RFC 3339).
    pub started_at: Option<String>,
    /// When the session ended (RFC 3339).
    pub ended_at: Option<String>,
    /// Final ranking, once the session has ended.
    pub leaderboard: Option<Vec<LeaderboardEntryDto>>,
}

/// Response payload carrying only the session state.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionPayload {
    /// Authoritative session state after the action.
    pub session: SessionSnapshot,
}

/// Response payload for a join action.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinPayload {
    /// Authoritative session state after the join.
    pub session: SessionSnapshot,
    /// Identity the joining player should use from now on.
    pub player_id: String,
}

/// Response payload for a locate-target action.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct LocatePayload {
    /// Authoritative session state after the click.
    pub session: SessionSnapshot,
    /// Whether a not-yet-found target was hit.
    pub found: bool,
    /// The target that was hit.
    pub target: Option<TargetSummary>,
    /// Points awarded for this find.
    pub score_delta: u32,
}

/// Response payload for a complete-task action.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskPayload {
    /// Authoritative session state after the action.
    pub session: SessionSnapshot,
    /// Whether a task was actually completed.
    pub task_completed: bool,
}

impl From<&Target> for TargetSummary {
    fn from(target: &Target) -> Self {
        Self {
            id: target.id,
            difficulty: target.difficulty,
            found: target.found,
            found_by: target.found_by.clone(),
            found_at: target.found_at.map(format_system_time),
        }
    }
}

impl From<(&Player, GameVariant)> for PlayerSummary {
    fn from((player, variant): (&Player, GameVariant)) -> Self {
        let social = variant == GameVariant::SocialDeduction;
        Self {
            id: player.id.clone(),
            display_name: player.display_name.clone(),
            score: player.score,
            status: player.status,
            role: player.role,
            has_voted: social.then_some(player.has_voted),
            tasks_completed: social.then_some(player.tasks_completed),
            total_tasks: social.then_some(player.total_tasks),
            found_target_ids: (!social).then(|| player.found_target_ids.clone()),
            completed_at: player.completed_at.map(format_system_time),
            position: player.position.map(|SpawnPoint { x, y }| PositionDto { x, y }),
        }
    }
}

impl From<&LeaderboardEntry> for LeaderboardEntryDto {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            player_id: entry.player_id.clone(),
            display_name: entry.display_name.clone(),
            score: entry.score,
            completed_at: entry.completed_at.map(format_system_time),
        }
    }
}

impl From<&GameSession> for SessionSnapshot {
    fn from(session: &GameSession) -> Self {
        let hidden = session.variant == GameVariant::HiddenObject;
        Self {
            id: session.id.clone(),
            variant: session.variant,
            phase: session.phase,
            host_id: session.host_id.clone(),
            created_at: format_system_time(session.created_at),
            players: session
                .players
                .values()
                .map(|player| (player, session.variant).into())
                .collect(),
            targets: hidden.then(|| session.targets.iter().map(Into::into).collect()),
            time_left: hidden.then_some(session.time_left),
            discussion_time_left: (session.phase == Phase::Discussion)
                .then_some(session.discussion_time_left),
            voting_time_left: (session.phase == Phase::Voting)
                .then_some(session.voting_time_left),
            winner: session.winner.clone(),
            meeting_caller_id: session.meeting_caller_id.clone(),
            last_eliminated_id: session.last_eliminated_id.clone(),
            started_at: session.started_at.map(format_system_time),
            ended_at: session.ended_at.map(format_system_time),
            leaderboard: (session.phase == Phase::Ended)
                .then(|| session.leaderboard.iter().map(Into::into).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn locate_request_rejects_out_of_range_coordinates() {
        let bad = LocateTargetRequest {
            player_id: "alice".into(),
            x: 101.0,
            y: 50.0,
        };
        assert!(bad.validate().is_err());

        let good = LocateTargetRequest {
            player_id: "alice".into(),
            x: 100.0,
            y: 0.0,
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn join_request_rejects_blank_username() {
        let bad = JoinSessionRequest {
            player_id: "bob".into(),
            username: "   ".into(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn vote_request_accepts_missing_target_as_skip() {
        let skip = CastVoteRequest {
            player_id: "bob".into(),
            target_id: None,
        };
        assert!(skip.validate().is_ok());
    }
}
