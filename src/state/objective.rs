//! Variant-specific progress operations: hit-testing, tasks, meetings,
//! eliminations, and vote resolution.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::dao::models::{GameVariant, Phase, PlayerStatus, Role, Winner};
use crate::state::rules::{GameRules, HiddenObjectWin};
use crate::state::session::{GameSession, Rejection};

/// Result of a locate request.
///
/// A miss (wrong phase, unknown player, no box hit) is not an error: stale
/// client requests are tolerated as no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateOutcome {
    /// Whether a not-yet-found target was hit.
    pub found: bool,
    /// The target that was hit.
    pub target_id: Option<u32>,
    /// Points awarded to the player for this find.
    pub score_delta: u32,
}

impl LocateOutcome {
    fn miss() -> Self {
        Self {
            found: false,
            target_id: None,
            score_delta: 0,
        }
    }
}

/// Result of a task completion request; `false` means the call was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Whether a task was actually completed.
    pub task_completed: bool,
}

/// Resolution of a voting round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyResult {
    /// The player voted out, if the tally produced a strict majority.
    pub eliminated: Option<String>,
}

/// Result of casting a vote. `tally` is present only on the vote that
/// completed the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Tally resolution, when this vote was the last outstanding one.
    pub tally: Option<TallyResult>,
}

/// Hit-test a click against the not-yet-found targets.
///
/// Scanning follows target definition order, first match wins. On a hit the
/// target is marked found, the finder is credited base points for the
/// difficulty plus the ruleset's time bonus, and the end-of-round rule is
/// evaluated. The session is mutated only on a hit.
pub fn locate_target(
    session: &mut GameSession,
    rules: &GameRules,
    player_id: &str,
    x: f32,
    y: f32,
    now: SystemTime,
) -> LocateOutcome {
    if session.variant != GameVariant::HiddenObject || session.phase != Phase::Playing {
        return LocateOutcome::miss();
    }
    let Some(player) = session.players.get(player_id) else {
        return LocateOutcome::miss();
    };
    if !player.is_alive() {
        return LocateOutcome::miss();
    }

    let elapsed_secs = player
        .started_at
        .and_then(|started| now.duration_since(started).ok())
        .map_or(0, |elapsed| elapsed.as_secs());

    let Some(hit_index) = session
        .targets
        .iter()
        .position(|target| !target.found && target.bounds.contains(x, y))
    else {
        return LocateOutcome::miss();
    };

    let target_id = session.targets[hit_index].id;
    let score_delta = rules.scoring.points_for(
        session.targets[hit_index].difficulty,
        elapsed_secs,
        session.time_left,
    );

    let target = &mut session.targets[hit_index];
    target.found = true;
    target.found_by = Some(player_id.to_string());
    target.found_at = Some(now);

    let total_targets = session.targets.len();
    let all_found = session.targets.iter().all(|target| target.found);

    let Some(player) = session.players.get_mut(player_id) else {
        return LocateOutcome::miss();
    };
    player.found_target_ids.push(target_id);
    player.score += score_delta;
    let solo_done = player.found_target_ids.len() == total_targets;
    if solo_done {
        player.completed_at = Some(now);
    }

    let won = match rules.hidden_object_win {
        HiddenObjectWin::AllTargetsFound => all_found,
        HiddenObjectWin::SoloAllTargets => solo_done,
    };
    if won {
        session.finish(Some(Winner::Player(player_id.to_string())), now);
    }

    LocateOutcome {
        found: true,
        target_id: Some(target_id),
        score_delta,
    }
}

/// Record one completed task for an alive crewmate.
///
/// No-op for impostors, dead players, unknown players, or outside the
/// `playing` phase. When every alive crewmate's allotment is complete the
/// crew wins.
pub fn complete_task(
    session: &mut GameSession,
    rules: &GameRules,
    player_id: &str,
    now: SystemTime,
) -> TaskOutcome {
    let noop = TaskOutcome {
        task_completed: false,
    };
    if session.variant != GameVariant::SocialDeduction || session.phase != Phase::Playing {
        return noop;
    }
    let Some(player) = session.players.get_mut(player_id) else {
        return noop;
    };
    if !player.is_alive()
        || player.role != Some(Role::Crewmate)
        || player.tasks_completed >= player.total_tasks
    {
        return noop;
    }

    player.tasks_completed += 1;
    player.score += rules.task_points;
    if player.tasks_completed == player.total_tasks {
        player.completed_at = Some(now);
    }

    let (done, total) = session
        .players
        .values()
        .filter(|p| p.is_alive() && p.role == Some(Role::Crewmate))
        .fold((0u32, 0u32), |(done, total), p| {
            (done + u32::from(p.tasks_completed), total + u32::from(p.total_tasks))
        });
    if total > 0 && done >= total {
        session.finish(Some(Winner::Crewmates), now);
    }

    TaskOutcome {
        task_completed: true,
    }
}

/// Open an emergency meeting: `playing` becomes `discussion` with a fresh
/// countdown, the caller is recorded, and all vote state resets.
pub fn call_meeting(
    session: &mut GameSession,
    rules: &GameRules,
    player_id: &str,
) -> Result<(), Rejection> {
    if session.variant != GameVariant::SocialDeduction {
        return Err(Rejection::WrongVariant {
            variant: session.variant,
        });
    }
    if session.phase == Phase::Ended {
        return Err(Rejection::GameOver);
    }
    if session.phase != Phase::Playing {
        return Err(Rejection::WrongPhase {
            expected: Phase::Playing,
            actual: session.phase,
        });
    }
    let player = session
        .players
        .get(player_id)
        .ok_or_else(|| Rejection::UnknownPlayer {
            player_id: player_id.to_string(),
        })?;
    if !player.is_alive() {
        return Err(Rejection::NotAlive {
            player_id: player_id.to_string(),
        });
    }

    open_meeting(session, rules, player_id);
    Ok(())
}

/// Kill an alive player as an impostor.
///
/// Reaching parity (alive impostors ≥ alive crewmates) ends the game for the
/// impostors; otherwise a meeting opens automatically to discuss the body,
/// with the impostor recorded as caller.
pub fn eliminate_player(
    session: &mut GameSession,
    rules: &GameRules,
    impostor_id: &str,
    target_id: &str,
    now: SystemTime,
) -> Result<(), Rejection> {
    if session.variant != GameVariant::SocialDeduction {
        return Err(Rejection::WrongVariant {
            variant: session.variant,
        });
    }
    if session.phase == Phase::Ended {
        return Err(Rejection::GameOver);
    }
    if session.phase != Phase::Playing {
        return Err(Rejection::WrongPhase {
            expected: Phase::Playing,
            actual: session.phase,
        });
    }

    let actor = session
        .players
        .get(impostor_id)
        .ok_or_else(|| Rejection::UnknownPlayer {
            player_id: impostor_id.to_string(),
        })?;
    if !actor.is_alive() {
        return Err(Rejection::NotAlive {
            player_id: impostor_id.to_string(),
        });
    }
    if actor.role != Some(Role::Impostor) {
        return Err(Rejection::NotImpostor {
            player_id: impostor_id.to_string(),
        });
    }

    let target = session
        .players
        .get_mut(target_id)
        .ok_or_else(|| Rejection::UnknownPlayer {
            player_id: target_id.to_string(),
        })?;
    if !target.is_alive() {
        return Err(Rejection::TargetNotAlive {
            target_id: target_id.to_string(),
        });
    }

    target.status = PlayerStatus::Dead;
    session.last_eliminated_id = Some(target_id.to_string());

    if session.alive_with_role(Role::Impostor) >= session.alive_with_role(Role::Crewmate) {
        session.finish(Some(Winner::Impostors), now);
    } else {
        open_meeting(session, rules, impostor_id);
    }

    Ok(())
}

/// Record a vote; `target` absent means skip.
///
/// The tally runs only once every alive player has voted: the candidate with
/// the strict-maximum vote count is eliminated only when that maximum is
/// unique and exceeds the skip count. Afterwards the win conditions are
/// re-evaluated and, failing those, play resumes. Votes reset
/// unconditionally after the tally.
pub fn cast_vote(
    session: &mut GameSession,
    voter_id: &str,
    target: Option<&str>,
    now: SystemTime,
) -> Result<VoteOutcome, Rejection> {
    if session.variant != GameVariant::SocialDeduction {
        return Err(Rejection::WrongVariant {
            variant: session.variant,
        });
    }
    if session.phase == Phase::Ended {
        return Err(Rejection::GameOver);
    }
    if session.phase != Phase::Voting {
        return Err(Rejection::WrongPhase {
            expected: Phase::Voting,
            actual: session.phase,
        });
    }

    let voter = session
        .players
        .get(voter_id)
        .ok_or_else(|| Rejection::UnknownPlayer {
            player_id: voter_id.to_string(),
        })?;
    if !voter.is_alive() {
        return Err(Rejection::NotAlive {
            player_id: voter_id.to_string(),
        });
    }

    if let Some(candidate_id) = target {
        let candidate =
            session
                .players
                .get(candidate_id)
                .ok_or_else(|| Rejection::UnknownPlayer {
                    player_id: candidate_id.to_string(),
                })?;
        if !candidate.is_alive() {
            return Err(Rejection::TargetNotAlive {
                target_id: candidate_id.to_string(),
            });
        }
    }

    let Some(voter) = session.players.get_mut(voter_id) else {
        return Err(Rejection::UnknownPlayer {
            player_id: voter_id.to_string(),
        });
    };
    voter.has_voted = true;
    voter.voted_for = target.map(str::to_string);

    if !session.all_alive_voted() {
        return Ok(VoteOutcome { tally: None });
    }

    Ok(VoteOutcome {
        tally: Some(resolve_tally(session, now)),
    })
}

/// Count the round's votes and apply the outcome.
///
/// Pure function of the vote multiset: a unique strict-maximum candidate
/// with more votes than skips is eliminated, anything else (tie at the top,
/// skip majority, all skips) eliminates no one.
fn resolve_tally(session: &mut GameSession, now: SystemTime) -> TallyResult {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut skips = 0usize;
    for player in session.players.values().filter(|p| p.is_alive()) {
        match &player.voted_for {
            Some(candidate) => *counts.entry(candidate.clone()).or_default() += 1,
            None => skips += 1,
        }
    }

    let top_count = counts.values().max().copied().unwrap_or(0);
    let mut leaders = counts
        .iter()
        .filter(|(_, count)| **count == top_count)
        .map(|(candidate, _)| candidate.clone());
    let eliminated = match (leaders.next(), leaders.next()) {
        (Some(candidate), None) if top_count > skips => Some(candidate),
        _ => None,
    };

    if let Some(candidate_id) = &eliminated {
        if let Some(candidate) = session.players.get_mut(candidate_id) {
            candidate.status = PlayerStatus::Dead;
        }
        session.last_eliminated_id = Some(candidate_id.clone());
    }

    session.reset_votes();
    session.meeting_caller_id = None;

    let impostors = session.alive_with_role(Role::Impostor);
    let crewmates = session.alive_with_role(Role::Crewmate);
    if impostors == 0 {
        session.finish(Some(Winner::Crewmates), now);
    } else if impostors >= crewmates {
        session.finish(Some(Winner::Impostors), now);
    } else {
        session.phase = Phase::Playing;
    }

    TallyResult { eliminated }
}

fn open_meeting(session: &mut GameSession, rules: &GameRules, caller_id: &str) {
    session.phase = Phase::Discussion;
    session.discussion_time_left = rules.discussion_seconds;
    session.meeting_caller_id = Some(caller_id.to_string());
    session.reset_votes();
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::dao::models::GameVariant;
    use crate::state::lifecycle::tests::{hidden_rules, social_rules, target_layout};
    use crate::state::lifecycle::{create_session, join_session, start_session};
    use crate::state::session::GameSession;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000)
    }

    fn started_hidden(player_ids: &[&str]) -> GameSession {
        let rules = hidden_rules();
        let mut rng = StdRng::seed_from_u64(42);
        let mut session = create_session(
            "post-1".into(),
            "alice".into(),
            "Alice".into(),
            GameVariant::HiddenObject,
            &target_layout(),
            now(),
            Duration::from_secs(7200),
        );
        for id in player_ids {
            join_session(&mut session, &rules, id, id, now(), &mut rng).unwrap();
        }
        start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();
        session
    }

    /// Five-player social game with a deterministic role split.
    fn started_social() -> GameSession {
        let rules = social_rules();
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = create_session(
            "post-2".into(),
            "alice".into(),
            "Alice".into(),
            GameVariant::SocialDeduction,
            &[],
            now(),
            Duration::from_secs(7200),
        );
        for id in ["bob", "carol", "dave", "eve"] {
            join_session(&mut session, &rules, id, id, now(), &mut rng).unwrap();
        }
        start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();
        // Pin roles so assertions do not depend on the seed.
        for (id, player) in session.players.iter_mut() {
            if id.as_str() == "eve" {
                player.role = Some(Role::Impostor);
                player.total_tasks = 0;
            } else {
                player.role = Some(Role::Crewmate);
                player.total_tasks = 5;
            }
        }
        session
    }

    #[test]
    fn click_inside_box_registers_find_once() {
        let mut session = started_hidden(&["bob"]);
        let rules = hidden_rules();

        let hit = locate_target(&mut session, &rules, "alice", 12.0, 12.0, now());
        assert!(hit.found);
        assert_eq!(hit.target_id, Some(0));
        assert_eq!(hit.score_delta, 60); // easy base 10 + full speed bonus 50
        assert_eq!(session.players["alice"].score, 60);

        let again = locate_target(&mut session, &rules, "bob", 12.0, 12.0, now());
        assert!(!again.found);
        assert_eq!(session.players["bob"].score, 0);
    }

    #[test]
    fn click_outside_all_boxes_mutates_nothing() {
        let mut session = started_hidden(&[]);
        let rules = hidden_rules();
        let before = session.clone();

        let outcome = locate_target(&mut session, &rules, "alice", 99.0, 99.0, now());
        assert!(!outcome.found);
        assert_eq!(session, before);
    }

    #[test]
    fn locate_is_soft_noop_for_unknown_player_or_wrong_phase() {
        let mut session = started_hidden(&[]);
        let rules = hidden_rules();

        let unknown = locate_target(&mut session, &rules, "ghost", 12.0, 12.0, now());
        assert!(!unknown.found);

        session.finish(None, now());
        let late = locate_target(&mut session, &rules, "alice", 12.0, 12.0, now());
        assert!(!late.found);
    }

    #[test]
    fn speed_bonus_decays_with_elapsed_time() {
        let mut session = started_hidden(&[]);
        let rules = hidden_rules();

        let late = now() + Duration::from_secs(100);
        let hit = locate_target(&mut session, &rules, "alice", 12.0, 12.0, late);
        // easy base 10, bonus 50 - 100/5 = 30
        assert_eq!(hit.score_delta, 40);
    }

    #[test]
    fn finding_every_target_ends_the_round() {
        let mut session = started_hidden(&["bob"]);
        let rules = hidden_rules();

        locate_target(&mut session, &rules, "alice", 12.0, 12.0, now());
        locate_target(&mut session, &rules, "bob", 42.0, 63.0, now());
        assert_eq!(session.phase, Phase::Playing);

        locate_target(&mut session, &rules, "alice", 81.0, 21.0, now());
        assert_eq!(session.phase, Phase::Ended);
        assert_eq!(session.winner, Some(Winner::Player("alice".into())));
        assert!(!session.leaderboard.is_empty());
        assert_eq!(session.ended_at, Some(now()));
    }

    #[test]
    fn solo_win_rule_requires_personal_completion() {
        let mut session = started_hidden(&["bob"]);
        let mut rules = hidden_rules();
        rules.hidden_object_win = HiddenObjectWin::SoloAllTargets;

        locate_target(&mut session, &rules, "alice", 12.0, 12.0, now());
        locate_target(&mut session, &rules, "bob", 42.0, 63.0, now());
        // Every target is found but nobody found all three personally.
        locate_target(&mut session, &rules, "alice", 81.0, 21.0, now());
        assert_eq!(session.phase, Phase::Playing);
        assert_eq!(session.winner, None);
    }

    #[test]
    fn score_is_monotonic_across_locate_calls() {
        let mut session = started_hidden(&[]);
        let rules = hidden_rules();
        let mut previous = 0;

        let clicks = [
            (12.0, 12.0),
            (99.0, 1.0),
            (12.0, 12.0),
            (42.0, 63.0),
            (50.0, 50.0),
            (81.0, 21.0),
        ];
        for (x, y) in clicks {
            locate_target(&mut session, &rules, "alice", x, y, now());
            let score = session.players["alice"].score;
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn complete_task_ignores_impostors_and_dead_players() {
        let mut session = started_social();
        let rules = social_rules();

        let impostor = complete_task(&mut session, &rules, "eve", now());
        assert!(!impostor.task_completed);

        session.players["bob"].status = PlayerStatus::Dead;
        let dead = complete_task(&mut session, &rules, "bob", now());
        assert!(!dead.task_completed);
        assert_eq!(session.players["bob"].tasks_completed, 0);
    }

    #[test]
    fn completing_every_crew_task_wins_for_crewmates() {
        let mut session = started_social();
        let rules = social_rules();

        for id in ["alice", "bob", "carol", "dave"] {
            for _ in 0..5 {
                let outcome = complete_task(&mut session, &rules, id, now());
                assert!(outcome.task_completed);
            }
        }

        assert_eq!(session.phase, Phase::Ended);
        assert_eq!(session.winner, Some(Winner::Crewmates));
        assert_eq!(session.players["alice"].score, 50);
    }

    #[test]
    fn task_counter_saturates_at_allotment() {
        let mut session = started_social();
        let rules = social_rules();

        for _ in 0..5 {
            complete_task(&mut session, &rules, "alice", now());
        }
        let extra = complete_task(&mut session, &rules, "alice", now());
        assert!(!extra.task_completed);
        assert_eq!(session.players["alice"].tasks_completed, 5);
        assert_eq!(session.players["alice"].score, 50);
    }

    #[test]
    fn meeting_moves_playing_to_discussion() {
        let mut session = started_social();
        let rules = social_rules();
        session.players["bob"].has_voted = true;

        call_meeting(&mut session, &rules, "carol").unwrap();
        assert_eq!(session.phase, Phase::Discussion);
        assert_eq!(session.discussion_time_left, 45);
        assert_eq!(session.meeting_caller_id.as_deref(), Some("carol"));
        assert!(!session.players["bob"].has_voted);
    }

    #[test]
    fn meeting_rejected_outside_playing_or_for_dead_caller() {
        let mut session = started_social();
        let rules = social_rules();

        session.players["bob"].status = PlayerStatus::Dead;
        assert_eq!(
            call_meeting(&mut session, &rules, "bob"),
            Err(Rejection::NotAlive {
                player_id: "bob".into()
            })
        );

        call_meeting(&mut session, &rules, "carol").unwrap();
        assert_eq!(
            call_meeting(&mut session, &rules, "carol"),
            Err(Rejection::WrongPhase {
                expected: Phase::Playing,
                actual: Phase::Discussion
            })
        );
    }

    #[test]
    fn elimination_opens_body_meeting() {
        let mut session = started_social();
        let rules = social_rules();

        eliminate_player(&mut session, &rules, "eve", "bob", now()).unwrap();
        assert_eq!(session.players["bob"].status, PlayerStatus::Dead);
        assert_eq!(session.last_eliminated_id.as_deref(), Some("bob"));
        assert_eq!(session.phase, Phase::Discussion);
        assert_eq!(session.meeting_caller_id.as_deref(), Some("eve"));
    }

    #[test]
    fn elimination_to_parity_wins_for_impostors() {
        let mut session = started_social();
        let rules = social_rules();
        session.players["bob"].status = PlayerStatus::Dead;
        session.players["carol"].status = PlayerStatus::Dead;

        // Two crew left against one impostor; one more kill reaches parity.
        eliminate_player(&mut session, &rules, "eve", "dave", now()).unwrap();
        assert_eq!(session.phase, Phase::Ended);
        assert_eq!(session.winner, Some(Winner::Impostors));
    }

    #[test]
    fn eliminate_requires_impostor_and_alive_target() {
        let mut session = started_social();
        let rules = social_rules();

        assert_eq!(
            eliminate_player(&mut session, &rules, "alice", "bob", now()),
            Err(Rejection::NotImpostor {
                player_id: "alice".into()
            })
        );

        session.players["bob"].status = PlayerStatus::Dead;
        assert_eq!(
            eliminate_player(&mut session, &rules, "eve", "bob", now()),
            Err(Rejection::TargetNotAlive {
                target_id: "bob".into()
            })
        );
    }

    #[test]
    fn eliminate_after_end_never_changes_winner() {
        let mut session = started_social();
        let rules = social_rules();
        session.finish(Some(Winner::Crewmates), now());

        let err = eliminate_player(&mut session, &rules, "eve", "bob", now()).unwrap_err();
        assert_eq!(err, Rejection::GameOver);
        assert_eq!(session.winner, Some(Winner::Crewmates));
    }

    fn to_voting(session: &mut GameSession) {
        session.phase = Phase::Voting;
        session.voting_time_left = 30;
        session.reset_votes();
    }

    #[test]
    fn tally_waits_for_every_alive_voter() {
        let mut session = started_social();
        let rules = social_rules();
        to_voting(&mut session);

        for voter in ["alice", "bob", "carol", "dave"] {
            let outcome = cast_vote(&mut session, voter, Some("eve"), now()).unwrap();
            assert!(outcome.tally.is_none());
        }
        assert_eq!(session.phase, Phase::Voting);
    }

    #[test]
    fn unanimous_vote_eliminates_and_resolves_win() {
        let mut session = started_social();
        let rules = social_rules();
        to_voting(&mut session);

        for voter in ["alice", "bob", "carol", "dave"] {
            cast_vote(&mut session, voter, Some("eve"), now()).unwrap();
        }
        let outcome = cast_vote(&mut session, "eve", Some("alice"), now()).unwrap();

        let tally = outcome.tally.expect("tally should resolve");
        assert_eq!(tally.eliminated.as_deref(), Some("eve"));
        assert_eq!(session.phase, Phase::Ended);
        assert_eq!(session.winner, Some(Winner::Crewmates));
    }

    #[test]
    fn tied_top_votes_eliminate_nobody() {
        let mut session = started_social();
        let rules = social_rules();
        to_voting(&mut session);

        cast_vote(&mut session, "alice", Some("eve"), now()).unwrap();
        cast_vote(&mut session, "bob", Some("eve"), now()).unwrap();
        cast_vote(&mut session, "carol", Some("dave"), now()).unwrap();
        cast_vote(&mut session, "dave", Some("carol"), now()).unwrap();
        let outcome = cast_vote(&mut session, "eve", Some("dave"), now()).unwrap();

        let tally = outcome.tally.expect("tally should resolve");
        assert_eq!(tally.eliminated, None);
        assert_eq!(session.phase, Phase::Playing);
        assert!(session.players.values().all(|p| !p.has_voted));
    }

    #[test]
    fn skip_majority_eliminates_nobody() {
        let mut session = started_social();
        let rules = social_rules();
        to_voting(&mut session);

        cast_vote(&mut session, "alice", None, now()).unwrap();
        cast_vote(&mut session, "bob", None, now()).unwrap();
        cast_vote(&mut session, "carol", None, now()).unwrap();
        cast_vote(&mut session, "dave", Some("eve"), now()).unwrap();
        let outcome = cast_vote(&mut session, "eve", None, now()).unwrap();

        let tally = outcome.tally.expect("tally should resolve");
        assert_eq!(tally.eliminated, None);
        assert!(session.players.values().all(|p| p.is_alive()));
        assert_eq!(session.phase, Phase::Playing);
    }

    #[test]
    fn dead_voters_are_excluded_from_the_round() {
        let mut session = started_social();
        let rules = social_rules();
        session.players["bob"].status = PlayerStatus::Dead;
        to_voting(&mut session);

        assert_eq!(
            cast_vote(&mut session, "bob", Some("eve"), now()),
            Err(Rejection::NotAlive {
                player_id: "bob".into()
            })
        );

        cast_vote(&mut session, "alice", Some("eve"), now()).unwrap();
        cast_vote(&mut session, "carol", Some("eve"), now()).unwrap();
        cast_vote(&mut session, "dave", Some("eve"), now()).unwrap();
        let outcome = cast_vote(&mut session, "eve", None, now()).unwrap();
        assert!(outcome.tally.is_some());
    }

    #[test]
    fn voting_for_dead_candidate_is_rejected() {
        let mut session = started_social();
        let rules = social_rules();
        session.players["bob"].status = PlayerStatus::Dead;
        to_voting(&mut session);

        assert_eq!(
            cast_vote(&mut session, "alice", Some("bob"), now()),
            Err(Rejection::TargetNotAlive {
                target_id: "bob".into()
            })
        );
    }

    #[test]
    fn voting_out_the_last_crewmates_hands_impostors_the_win() {
        let mut session = started_social();
        let rules = social_rules();
        session.players["bob"].status = PlayerStatus::Dead;
        session.players["carol"].status = PlayerStatus::Dead;
        to_voting(&mut session);

        // alice, dave (crew) and eve (impostor) remain; voting dave out
        // leaves one crew against one impostor.
        cast_vote(&mut session, "alice", Some("dave"), now()).unwrap();
        cast_vote(&mut session, "dave", None, now()).unwrap();
        let outcome = cast_vote(&mut session, "eve", Some("dave"), now()).unwrap();

        assert_eq!(outcome.tally.unwrap().eliminated.as_deref(), Some("dave"));
        assert_eq!(session.phase, Phase::Ended);
        assert_eq!(session.winner, Some(Winner::Impostors));
    }
}
