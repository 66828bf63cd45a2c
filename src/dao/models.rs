use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;

/// Which game ruleset a session runs under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    /// Point-and-click search for hidden figures in a shared scene.
    HiddenObject,
    /// Task/vote impostor game.
    SocialDeduction,
}

/// Stage the session is currently in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Lobby: players can join, the host can start.
    Waiting,
    /// Active gameplay (clicking targets or doing tasks).
    Playing,
    /// Timed discussion after a meeting or an elimination.
    Discussion,
    /// Timed voting round following a discussion.
    Voting,
    /// Terminal state; a winner may be recorded.
    Ended,
}

/// Secret role dealt to a player when a social-deduction game starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Completes tasks and votes impostors out.
    Crewmate,
    /// Eliminates crewmates while staying hidden.
    Impostor,
}

/// Liveness of a player within a session. Players are never removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Participating normally.
    Alive,
    /// Eliminated or voted out; keeps their score but no longer acts.
    Dead,
    /// Dropped their connection; excluded from alive counts and tallies.
    Disconnected,
}

/// Difficulty tier of a hidden target, determining its base points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Large or prominent target.
    Easy,
    /// Partially obscured target.
    Medium,
    /// Well-hidden target.
    Hard,
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// A single player won (hidden-object variant).
    Player(String),
    /// The crew completed every task or voted all impostors out.
    Crewmates,
    /// Impostors reached parity with the crew.
    Impostors,
}

/// Normalized spawn coordinates assigned on join (social-deduction variant).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpawnPointEntity {
    /// Horizontal coordinate in the 0-100 scene space.
    pub x: f32,
    /// Vertical coordinate in the 0-100 scene space.
    pub y: f32,
}

/// Axis-aligned hit region of a target in the 0-100 scene space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HitBoxEntity {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Extent to the right of `x`.
    pub width: f32,
    /// Extent below `y`.
    pub height: f32,
}

/// Persisted representation of a hidden target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetEntity {
    /// Identifier, assigned in definition order at session creation.
    pub id: u32,
    /// Hit region tested against locate requests.
    pub bounds: HitBoxEntity,
    /// Difficulty tier determining the base score.
    pub difficulty: Difficulty,
    /// Whether any player has found this target. Never reverts to false.
    pub found: bool,
    /// Player who found the target, if any.
    pub found_by: Option<String>,
    /// When the target was found.
    pub found_at: Option<SystemTime>,
}

/// Persisted representation of a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerEntity {
    /// Platform identity of the player.
    pub id: String,
    /// Display name chosen on join.
    pub display_name: String,
    /// Cumulative score, non-decreasing.
    pub score: u32,
    /// Dealt role; unset until a social-deduction game starts.
    pub role: Option<Role>,
    /// Liveness within the session.
    pub status: PlayerStatus,
    /// Targets this player found, in find order.
    pub found_target_ids: Vec<u32>,
    /// When this player's round began (start of game, or late join).
    pub started_at: Option<SystemTime>,
    /// When this player finished their objective set.
    pub completed_at: Option<SystemTime>,
    /// Whether the player already voted in the current voting round.
    pub has_voted: bool,
    /// Candidate the player voted for; absent means skip.
    pub voted_for: Option<String>,
    /// Tasks finished so far (crewmates only).
    pub tasks_completed: u8,
    /// Tasks assigned at game start (crewmates only).
    pub total_tasks: u8,
    /// Spawn position assigned on join (social-deduction variant).
    pub position: Option<SpawnPointEntity>,
}

/// Persisted leaderboard row, recomputed whenever a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntryEntity {
    /// 1-based position.
    pub rank: usize,
    /// Player this row describes.
    pub player_id: String,
    /// Display name at the time the board was built.
    pub display_name: String,
    /// Final score.
    pub score: u32,
    /// Completion timestamp used as the tie-breaker.
    pub completed_at: Option<SystemTime>,
}

/// Aggregate session entity persisted by the storage layer, one per session id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntity {
    /// External session identifier (hosting-platform post/room id).
    pub id: String,
    /// Ruleset this session runs under.
    pub variant: GameVariant,
    /// Current stage of the state machine.
    pub phase: Phase,
    /// Player id of the host; always present in `players`.
    pub host_id: String,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Instant after which the record is treated as not found.
    pub expires_at: SystemTime,
    /// Participants in join order.
    pub players: Vec<PlayerEntity>,
    /// Fixed target set (hidden-object variant; empty otherwise).
    pub targets: Vec<TargetEntity>,
    /// Remaining round seconds (hidden-object countdown).
    pub time_left: u32,
    /// Remaining discussion seconds while `phase` is `discussion`.
    pub discussion_time_left: u32,
    /// Remaining voting seconds while `phase` is `voting`.
    pub voting_time_left: u32,
    /// Outcome, set exactly once when the session ends.
    pub winner: Option<Winner>,
    /// Player who called the current/last meeting.
    pub meeting_caller_id: Option<String>,
    /// Player most recently eliminated.
    pub last_eliminated_id: Option<String>,
    /// When gameplay started.
    pub started_at: Option<SystemTime>,
    /// When the session reached `ended`.
    pub ended_at: Option<SystemTime>,
    /// Final ranking, populated when the session ends.
    pub leaderboard: Vec<LeaderboardEntryEntity>,
}
