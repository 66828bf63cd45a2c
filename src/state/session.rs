use std::time::SystemTime;

use indexmap::IndexMap;
use thiserror::Error;

use crate::dao::models::{
    Difficulty, GameVariant, HitBoxEntity, LeaderboardEntryEntity, Phase, PlayerEntity,
    PlayerStatus, Role, SessionEntity, SpawnPointEntity, TargetEntity, Winner,
};
use crate::state::leaderboard;

/// Normalized spawn coordinates assigned on join (social-deduction variant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    /// Horizontal coordinate in the 0-100 scene space.
    pub x: f32,
    /// Vertical coordinate in the 0-100 scene space.
    pub y: f32,
}

/// Axis-aligned hit region of a target in the 0-100 scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Extent to the right of `x`.
    pub width: f32,
    /// Extent below `y`.
    pub height: f32,
}

impl HitBox {
    /// Whether the point lies within the box, edges included.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// A fixed hidden target defined at session creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Identifier, assigned in definition order.
    pub id: u32,
    /// Hit region tested against locate requests.
    pub bounds: HitBox,
    /// Difficulty tier determining the base score.
    pub difficulty: Difficulty,
    /// Whether any player has found this target. Never reverts.
    pub found: bool,
    /// Player who found the target.
    pub found_by: Option<String>,
    /// When the target was found.
    pub found_at: Option<SystemTime>,
}

/// Participant info tracked during a game session.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
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
    pub position: Option<SpawnPoint>,
}

impl Player {
    /// Build a fresh participant with zeroed progress.
    pub fn new(id: String, display_name: String) -> Self {
        Self {
            id,
            display_name,
            score: 0,
            role: None,
            status: PlayerStatus::Alive,
            found_target_ids: Vec::new(),
            started_at: None,
            completed_at: None,
            has_voted: false,
            voted_for: None,
            tasks_completed: 0,
            total_tasks: 0,
            position: None,
        }
    }

    /// Whether the player counts towards alive tallies and may act.
    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    /// Clear the player's vote for a new voting round.
    pub fn reset_vote(&mut self) {
        self.has_voted = false;
        self.voted_for = None;
    }
}

/// Derived leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
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

/// Aggregated state for one game instance, keyed by the external session id.
///
/// The session exclusively owns its players and targets; nothing here is
/// shared across sessions or outlives the record's expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    /// External session identifier (hosting-platform post/room id).
    pub id: String,
    /// Ruleset this session runs under.
    pub variant: GameVariant,
    /// Current stage of the state machine.
    pub phase: Phase,
    /// Player id of the host; always a key of `players`.
    pub host_id: String,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Instant after which the record is treated as not found.
    pub expires_at: SystemTime,
    /// Participants keyed by player id, in join order.
    pub players: IndexMap<String, Player>,
    /// Fixed target set (hidden-object variant; empty otherwise).
    pub targets: Vec<Target>,
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
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl GameSession {
    /// Count of alive players holding `role`.
    pub fn alive_with_role(&self, role: Role) -> usize {
        self.players
            .values()
            .filter(|p| p.is_alive() && p.role == Some(role))
            .count()
    }

    /// Whether every alive player has cast a vote this round.
    pub fn all_alive_voted(&self) -> bool {
        self.players
            .values()
            .filter(|p| p.is_alive())
            .all(|p| p.has_voted)
    }

    /// Clear every player's vote state.
    pub fn reset_votes(&mut self) {
        for player in self.players.values_mut() {
            player.reset_vote();
        }
    }

    /// Transition to `ended`, record the outcome, and freeze the leaderboard.
    ///
    /// A session ends at most once; calling this on an ended session is a
    /// no-op so the recorded winner can never change.
    pub fn finish(&mut self, winner: Option<Winner>, now: SystemTime) {
        if self.phase == Phase::Ended {
            return;
        }
        self.phase = Phase::Ended;
        self.winner = winner;
        self.ended_at = Some(now);
        self.leaderboard = leaderboard::build_leaderboard(self);
    }
}

impl From<SpawnPointEntity> for SpawnPoint {
    fn from(value: SpawnPointEntity) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<SpawnPoint> for SpawnPointEntity {
    fn from(value: SpawnPoint) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<HitBoxEntity> for HitBox {
    fn from(value: HitBoxEntity) -> Self {
        Self {
            x: value.x,
            y: value.y,
            width: value.width,
            height: value.height,
        }
    }
}

impl From<HitBox> for HitBoxEntity {
    fn from(value: HitBox) -> Self {
        Self {
            x: value.x,
            y: value.y,
            width: value.width,
            height: value.height,
        }
    }
}

impl From<TargetEntity> for Target {
    fn from(value: TargetEntity) -> Self {
        Self {
            id: value.id,
            bounds: value.bounds.into(),
            difficulty: value.difficulty,
            found: value.found,
            found_by: value.found_by,
            found_at: value.found_at,
        }
    }
}

impl From<Target> for TargetEntity {
    fn from(value: Target) -> Self {
        Self {
            id: value.id,
            bounds: value.bounds.into(),
            difficulty: value.difficulty,
            found: value.found,
            found_by: value.found_by,
            found_at: value.found_at,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            score: value.score,
            role: value.role,
            status: value.status,
            found_target_ids: value.found_target_ids,
            started_at: value.started_at,
            completed_at: value.completed_at,
            has_voted: value.has_voted,
            voted_for: value.voted_for,
            tasks_completed: value.tasks_completed,
            total_tasks: value.total_tasks,
            position: value.position.map(Into::into),
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            score: value.score,
            role: value.role,
            status: value.status,
            found_target_ids: value.found_target_ids,
            started_at: value.started_at,
            completed_at: value.completed_at,
            has_voted: value.has_voted,
            voted_for: value.voted_for,
            tasks_completed: value.tasks_completed,
            total_tasks: value.total_tasks,
            position: value.position.map(Into::into),
        }
    }
}

impl From<LeaderboardEntryEntity> for LeaderboardEntry {
    fn from(value: LeaderboardEntryEntity) -> Self {
        Self {
            rank: value.rank,
            player_id: value.player_id,
            display_name: value.display_name,
            score: value.score,
            completed_at: value.completed_at,
        }
    }
}

impl From<LeaderboardEntry> for LeaderboardEntryEntity {
    fn from(value: LeaderboardEntry) -> Self {
        Self {
            rank: value.rank,
            player_id: value.player_id,
            display_name: value.display_name,
            score: value.score,
            completed_at: value.completed_at,
        }
    }
}

impl From<SessionEntity> for GameSession {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            variant: value.variant,
            phase: value.phase,
            host_id: value.host_id,
            created_at: value.created_at,
            expires_at: value.expires_at,
            players: value
                .players
                .into_iter()
                .map(|p| (p.id.clone(), p.into()))
                .collect(),
            targets: value.targets.into_iter().map(Into::into).collect(),
            time_left: value.time_left,
            discussion_time_left: value.discussion_time_left,
            voting_time_left: value.voting_time_left,
            winner: value.winner,
            meeting_caller_id: value.meeting_caller_id,
            last_eliminated_id: value.last_eliminated_id,
            started_at: value.started_at,
            ended_at: value.ended_at,
            leaderboard: value.leaderboard.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<GameSession> for SessionEntity {
    fn from(value: GameSession) -> Self {
        Self {
            id: value.id,
            variant: value.variant,
            phase: value.phase,
            host_id: value.host_id,
            created_at: value.created_at,
            expires_at: value.expires_at,
            players: value.players.into_values().map(Into::into).collect(),
            targets: value.targets.into_iter().map(Into::into).collect(),
            time_left: value.time_left,
            discussion_time_left: value.discussion_time_left,
            voting_time_left: value.voting_time_left,
            winner: value.winner,
            meeting_caller_id: value.meeting_caller_id,
            last_eliminated_id: value.last_eliminated_id,
            started_at: value.started_at,
            ended_at: value.ended_at,
            leaderboard: value.leaderboard.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why a requested operation cannot be applied to the session.
///
/// Rejections are expected, user-facing outcomes; the session is left
/// unmodified whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The session already holds its configured maximum of players.
    #[error("session is full ({capacity} players)")]
    SessionFull {
        /// Configured player cap.
        capacity: usize,
    },
    /// Joining is not possible because the game is underway or over.
    #[error("game has already started")]
    GameAlreadyStarted,
    /// Only the host may start the game.
    #[error("player `{player_id}` is not the host")]
    NotHost {
        /// Requesting player.
        player_id: String,
    },
    /// The game was already started.
    #[error("game has already been started")]
    AlreadyStarted,
    /// Too few players to start.
    #[error("not enough players to start (need {needed}, have {have})")]
    NotEnoughPlayers {
        /// Configured minimum.
        needed: usize,
        /// Current player count.
        have: usize,
    },
    /// The named player is not part of this session.
    #[error("unknown player `{player_id}`")]
    UnknownPlayer {
        /// Offending player id.
        player_id: String,
    },
    /// The acting player is dead or disconnected.
    #[error("player `{player_id}` is not alive")]
    NotAlive {
        /// Offending player id.
        player_id: String,
    },
    /// The operation is not valid in the session's current phase.
    #[error("operation requires phase {expected:?}, session is in {actual:?}")]
    WrongPhase {
        /// Phase the operation needs.
        expected: Phase,
        /// Phase the session is in.
        actual: Phase,
    },
    /// The acting player is not an impostor.
    #[error("player `{player_id}` is not an impostor")]
    NotImpostor {
        /// Offending player id.
        player_id: String,
    },
    /// The elimination or vote target is not an alive player.
    #[error("target `{target_id}` is not an alive player")]
    TargetNotAlive {
        /// Offending target id.
        target_id: String,
    },
    /// The operation does not exist under this session's variant.
    #[error("operation is not available in the {variant:?} variant")]
    WrongVariant {
        /// Variant of the session.
        variant: GameVariant,
    },
    /// The session has ended; its outcome is frozen.
    #[error("game is over")]
    GameOver,
}
