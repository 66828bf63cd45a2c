//! Time-driven phase transitions, advanced by an external ~1 Hz cadence.

use std::time::SystemTime;

use crate::dao::models::{GameVariant, Phase, Winner};
use crate::state::rules::GameRules;
use crate::state::session::GameSession;

/// Advance the session's countdowns by one second.
///
/// Idempotent once a countdown has expired or the session has ended;
/// repeated ticks are no-ops. Never rejects.
pub fn tick(session: &mut GameSession, rules: &GameRules, now: SystemTime) {
    match (session.variant, session.phase) {
        (GameVariant::HiddenObject, Phase::Playing) => {
            session.time_left = session.time_left.saturating_sub(1);
            if session.time_left == 0 {
                let winner = top_scorer(session).map(Winner::Player);
                session.finish(winner, now);
            }
        }
        (GameVariant::SocialDeduction, Phase::Discussion) => {
            session.discussion_time_left = session.discussion_time_left.saturating_sub(1);
            if session.discussion_time_left == 0 {
                session.phase = Phase::Voting;
                session.voting_time_left = rules.voting_seconds;
                session.reset_votes();
            }
        }
        (GameVariant::SocialDeduction, Phase::Voting) => {
            session.voting_time_left = session.voting_time_left.saturating_sub(1);
            if session.voting_time_left == 0 {
                // Timed-out round defaults to a collective skip: nobody is
                // eliminated and play resumes without a tally.
                session.reset_votes();
                session.meeting_caller_id = None;
                session.phase = Phase::Playing;
            }
        }
        _ => {}
    }
}

/// Highest-scoring player, requiring a strictly positive score.
/// Ties resolve to the earliest joiner.
fn top_scorer(session: &GameSession) -> Option<String> {
    let mut best: Option<(&str, u32)> = None;
    for player in session.players.values() {
        if player.score == 0 {
            continue;
        }
        match best {
            Some((_, top)) if top >= player.score => {}
            _ => best = Some((&player.id, player.score)),
        }
    }
    best.map(|(id, _)| id.to_string())
}
