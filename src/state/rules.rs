//! Variant parameterization: one state machine, configured per ruleset.

use serde::Deserialize;

use crate::dao::models::Difficulty;

/// How points are awarded for a found target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ScoringRules {
    /// Base points per difficulty tier plus a speed bonus that decays with
    /// the seconds elapsed since the finder's round began.
    Difficulty {
        /// Base points for an easy target.
        easy: u32,
        /// Base points for a medium target.
        medium: u32,
        /// Base points for a hard target.
        hard: u32,
        /// Bonus awarded for an instant find.
        speed_bonus_max: u32,
        /// Seconds of elapsed time that shave one point off the bonus.
        speed_bonus_decay_secs: u32,
    },
    /// Flat points per find plus the remaining global countdown divided by ten.
    Flat {
        /// Points per found target.
        points: u32,
    },
}

impl ScoringRules {
    /// Points for finding `difficulty` after `elapsed_secs` of play with
    /// `time_left` seconds remaining on the global countdown.
    ///
    /// The bonus component is monotonically non-increasing in elapsed time.
    pub fn points_for(&self, difficulty: Difficulty, elapsed_secs: u64, time_left: u32) -> u32 {
        match *self {
            ScoringRules::Difficulty {
                easy,
                medium,
                hard,
                speed_bonus_max,
                speed_bonus_decay_secs,
            } => {
                let base = match difficulty {
                    Difficulty::Easy => easy,
                    Difficulty::Medium => medium,
                    Difficulty::Hard => hard,
                };
                let decay = (elapsed_secs / u64::from(speed_bonus_decay_secs.max(1)))
                    .min(u64::from(speed_bonus_max)) as u32;
                base + (speed_bonus_max - decay)
            }
            ScoringRules::Flat { points } => points + time_left / 10,
        }
    }
}

/// End-of-round rule for the hidden-object variant.
///
/// The source games disagreed on when a multiplayer hunt ends; the rule is a
/// parameter so each deployment picks one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenObjectWin {
    /// The round ends once every target has been found by anyone; the player
    /// whose find completes the set is the winner.
    AllTargetsFound,
    /// The round ends as soon as one player has personally found every
    /// target; that player is the winner.
    SoloAllTargets,
}

/// Tunable parameters of the session state machine for one variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameRules {
    /// Fewest players required to start.
    pub min_players: usize,
    /// Join capacity.
    pub max_players: usize,
    /// Global countdown in seconds (hidden-object variant).
    pub round_seconds: u32,
    /// Discussion countdown in seconds.
    pub discussion_seconds: u32,
    /// Voting countdown in seconds.
    pub voting_seconds: u32,
    /// Whether players may join after the game has started.
    pub allow_late_join: bool,
    /// Point formula for found targets.
    pub scoring: ScoringRules,
    /// Tasks dealt to each crewmate at start (social-deduction variant).
    pub tasks_per_crewmate: u8,
    /// Points awarded per completed task.
    pub task_points: u32,
    /// End-of-round rule for the hidden-object variant.
    pub hidden_object_win: HiddenObjectWin,
}

/// Definition of one hidden target, part of the server-side scene layout.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TargetSpec {
    /// Left edge of the hit region in 0-100 scene space.
    pub x: f32,
    /// Top edge of the hit region in 0-100 scene space.
    pub y: f32,
    /// Extent to the right of `x`.
    pub width: f32,
    /// Extent below `y`.
    pub height: f32,
    /// Difficulty tier determining the base score.
    pub difficulty: Difficulty,
}
