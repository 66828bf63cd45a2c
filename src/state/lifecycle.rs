//! Session membership and game start: create, join, role assignment.

use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use rand::Rng;
use rand::seq::index::sample;

use crate::dao::models::{GameVariant, Phase, PlayerStatus, Role};
use crate::state::rules::{GameRules, TargetSpec};
use crate::state::session::{GameSession, HitBox, Player, Rejection, SpawnPoint, Target};

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// False when the player was already a member and the call was an
    /// idempotent no-op.
    pub newly_joined: bool,
}

/// Build a new session in the `waiting` phase with the host as sole player.
///
/// The target set is instantiated from the server-side layout for the
/// hidden-object variant and stays fixed for the session's lifetime; roles
/// for social-deduction are dealt at start instead.
pub fn create_session(
    id: String,
    host_id: String,
    host_name: String,
    variant: GameVariant,
    target_layout: &[TargetSpec],
    now: SystemTime,
    ttl: Duration,
) -> GameSession {
    let targets = match variant {
        GameVariant::HiddenObject => target_layout
            .iter()
            .enumerate()
            .map(|(index, spec)| Target {
                id: index as u32,
                bounds: HitBox {
                    x: spec.x,
                    y: spec.y,
                    width: spec.width,
                    height: spec.height,
                },
                difficulty: spec.difficulty,
                found: false,
                found_by: None,
                found_at: None,
            })
            .collect(),
        GameVariant::SocialDeduction => Vec::new(),
    };

    let host = Player::new(host_id.clone(), host_name);
    let mut players = IndexMap::new();
    players.insert(host_id.clone(), host);

    GameSession {
        id,
        variant,
        phase: Phase::Waiting,
        host_id,
        created_at: now,
        expires_at: now + ttl,
        players,
        targets,
        time_left: 0,
        discussion_time_left: 0,
        voting_time_left: 0,
        winner: None,
        meeting_caller_id: None,
        last_eliminated_id: None,
        started_at: None,
        ended_at: None,
        leaderboard: Vec::new(),
    }
}

/// Add a player to the session.
///
/// Joining twice with the same player id is idempotent and leaves the
/// session untouched. Late joins are admitted only for rulesets that allow
/// them (hidden-object) and never once the session has ended.
pub fn join_session(
    session: &mut GameSession,
    rules: &GameRules,
    player_id: &str,
    display_name: &str,
    now: SystemTime,
    rng: &mut impl Rng,
) -> Result<JoinOutcome, Rejection> {
    if session.players.contains_key(player_id) {
        return Ok(JoinOutcome {
            newly_joined: false,
        });
    }

    match session.phase {
        Phase::Waiting => {}
        Phase::Ended => return Err(Rejection::GameAlreadyStarted),
        _ if rules.allow_late_join && session.variant == GameVariant::HiddenObject => {}
        _ => return Err(Rejection::GameAlreadyStarted),
    }

    if session.players.len() >= rules.max_players {
        return Err(Rejection::SessionFull {
            capacity: rules.max_players,
        });
    }

    let mut player = Player::new(player_id.to_string(), display_name.to_string());
    if session.variant == GameVariant::SocialDeduction {
        player.position = Some(SpawnPoint {
            x: rng.random_range(0.0..=100.0),
            y: rng.random_range(0.0..=100.0),
        });
    }
    if session.phase == Phase::Playing {
        // Late joiner: their personal clock starts now.
        player.started_at = Some(now);
    }
    session.players.insert(player_id.to_string(), player);

    Ok(JoinOutcome { newly_joined: true })
}

/// Start the game: transition to `playing` and deal roles.
///
/// Only the host may start, only from `waiting`, and only once the minimum
/// player count is reached. For social-deduction, `max(1, n / 4)` players are
/// drawn uniformly at random without replacement as impostors and every
/// crewmate receives their task allotment.
pub fn start_session(
    session: &mut GameSession,
    rules: &GameRules,
    requesting_player_id: &str,
    now: SystemTime,
    rng: &mut impl Rng,
) -> Result<(), Rejection> {
    if requesting_player_id != session.host_id {
        return Err(Rejection::NotHost {
            player_id: requesting_player_id.to_string(),
        });
    }
    if session.phase != Phase::Waiting {
        return Err(Rejection::AlreadyStarted);
    }
    if session.players.len() < rules.min_players {
        return Err(Rejection::NotEnoughPlayers {
            needed: rules.min_players,
            have: session.players.len(),
        });
    }

    session.phase = Phase::Playing;
    session.started_at = Some(now);

    for player in session.players.values_mut() {
        player.status = PlayerStatus::Alive;
        player.started_at = Some(now);
        player.reset_vote();
    }

    match session.variant {
        GameVariant::HiddenObject => {
            session.time_left = rules.round_seconds;
        }
        GameVariant::SocialDeduction => {
            let count = session.players.len();
            let impostors = (count / 4).max(1);
            let drawn = sample(rng, count, impostors);
            for (index, player) in session.players.values_mut().enumerate() {
                if drawn.iter().any(|picked| picked == index) {
                    player.role = Some(Role::Impostor);
                    player.total_tasks = 0;
                } else {
                    player.role = Some(Role::Crewmate);
                    player.total_tasks = rules.tasks_per_crewmate;
                }
                player.tasks_completed = 0;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::state::rules::{HiddenObjectWin, ScoringRules};

    pub(crate) fn hidden_rules() -> GameRules {
        GameRules {
            min_players: 1,
            max_players: 20,
            round_seconds: 120,
            discussion_seconds: 45,
            voting_seconds: 30,
            allow_late_join: true,
            scoring: ScoringRules::Difficulty {
                easy: 10,
                medium: 25,
                hard: 50,
                speed_bonus_max: 50,
                speed_bonus_decay_secs: 5,
            },
            tasks_per_crewmate: 5,
            task_points: 10,
            hidden_object_win: HiddenObjectWin::AllTargetsFound,
        }
    }

    pub(crate) fn social_rules() -> GameRules {
        GameRules {
            min_players: 4,
            max_players: 10,
            round_seconds: 0,
            discussion_seconds: 45,
            voting_seconds: 30,
            allow_late_join: false,
            scoring: ScoringRules::Flat { points: 100 },
            tasks_per_crewmate: 5,
            task_points: 10,
            hidden_object_win: HiddenObjectWin::AllTargetsFound,
        }
    }

    pub(crate) fn target_layout() -> Vec<TargetSpec> {
        vec![
            TargetSpec {
                x: 10.0,
                y: 10.0,
                width: 5.0,
                height: 5.0,
                difficulty: crate::dao::models::Difficulty::Easy,
            },
            TargetSpec {
                x: 40.0,
                y: 60.0,
                width: 4.0,
                height: 6.0,
                difficulty: crate::dao::models::Difficulty::Medium,
            },
            TargetSpec {
                x: 80.0,
                y: 20.0,
                width: 2.0,
                height: 2.0,
                difficulty: crate::dao::models::Difficulty::Hard,
            },
        ]
    }

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000)
    }

    fn new_hidden_session() -> GameSession {
        create_session(
            "post-1".into(),
            "alice".into(),
            "Alice".into(),
            GameVariant::HiddenObject,
            &target_layout(),
            now(),
            Duration::from_secs(7200),
        )
    }

    fn new_social_session() -> GameSession {
        create_session(
            "post-2".into(),
            "alice".into(),
            "Alice".into(),
            GameVariant::SocialDeduction,
            &[],
            now(),
            Duration::from_secs(7200),
        )
    }

    #[test]
    fn create_inserts_host_and_targets() {
        let session = new_hidden_session();
        assert_eq!(session.phase, Phase::Waiting);
        assert_eq!(session.players.len(), 1);
        assert!(session.players.contains_key("alice"));
        assert_eq!(session.targets.len(), 3);
        assert!(session.targets.iter().all(|t| !t.found));
        assert_eq!(session.host_id, "alice");
    }

    #[test]
    fn join_is_idempotent_for_known_player() {
        let mut session = new_hidden_session();
        let mut rng = StdRng::seed_from_u64(1);
        let rules = hidden_rules();

        join_session(&mut session, &rules, "bob", "Bob", now(), &mut rng).unwrap();
        let before = session.clone();
        let outcome =
            join_session(&mut session, &rules, "bob", "Bob", now(), &mut rng).unwrap();

        assert!(!outcome.newly_joined);
        assert_eq!(session, before);
    }

    #[test]
    fn join_rejects_when_full() {
        let mut session = new_social_session();
        let mut rng = StdRng::seed_from_u64(2);
        let rules = social_rules();

        for index in 1..rules.max_players {
            let id = format!("p{index}");
            join_session(&mut session, &rules, &id, &id, now(), &mut rng).unwrap();
        }

        let err =
            join_session(&mut session, &rules, "late", "Late", now(), &mut rng).unwrap_err();
        assert_eq!(err, Rejection::SessionFull { capacity: 10 });
    }

    #[test]
    fn join_after_start_rejected_for_social_deduction() {
        let mut session = new_social_session();
        let mut rng = StdRng::seed_from_u64(3);
        let rules = social_rules();
        for id in ["bob", "carol", "dave"] {
            join_session(&mut session, &rules, id, id, now(), &mut rng).unwrap();
        }
        start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();

        let err =
            join_session(&mut session, &rules, "eve", "Eve", now(), &mut rng).unwrap_err();
        assert_eq!(err, Rejection::GameAlreadyStarted);
    }

    #[test]
    fn late_join_admitted_mid_round_when_allowed() {
        let mut session = new_hidden_session();
        let mut rng = StdRng::seed_from_u64(4);
        let rules = hidden_rules();
        start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();

        let outcome =
            join_session(&mut session, &rules, "bob", "Bob", now(), &mut rng).unwrap();
        assert!(outcome.newly_joined);
        assert_eq!(session.players["bob"].started_at, Some(now()));
    }

    #[test]
    fn join_after_end_always_rejected() {
        let mut session = new_hidden_session();
        let mut rng = StdRng::seed_from_u64(5);
        let rules = hidden_rules();
        session.finish(None, now());

        let err =
            join_session(&mut session, &rules, "bob", "Bob", now(), &mut rng).unwrap_err();
        assert_eq!(err, Rejection::GameAlreadyStarted);
    }

    #[test]
    fn social_join_assigns_spawn_position() {
        let mut session = new_social_session();
        let mut rng = StdRng::seed_from_u64(6);
        join_session(&mut session, &social_rules(), "bob", "Bob", now(), &mut rng).unwrap();

        let position = session.players["bob"].position.expect("spawn position");
        assert!((0.0..=100.0).contains(&position.x));
        assert!((0.0..=100.0).contains(&position.y));
    }

    #[test]
    fn start_requires_host() {
        let mut session = new_hidden_session();
        let mut rng = StdRng::seed_from_u64(7);
        let rules = hidden_rules();
        join_session(&mut session, &rules, "bob", "Bob", now(), &mut rng).unwrap();

        let err = start_session(&mut session, &rules, "bob", now(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            Rejection::NotHost {
                player_id: "bob".into()
            }
        );
    }

    #[test]
    fn start_requires_waiting_phase() {
        let mut session = new_hidden_session();
        let mut rng = StdRng::seed_from_u64(8);
        let rules = hidden_rules();
        start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();

        let err = start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap_err();
        assert_eq!(err, Rejection::AlreadyStarted);
    }

    #[test]
    fn start_requires_minimum_players() {
        let mut session = new_social_session();
        let mut rng = StdRng::seed_from_u64(9);
        let rules = social_rules();
        join_session(&mut session, &rules, "bob", "Bob", now(), &mut rng).unwrap();

        let err = start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            Rejection::NotEnoughPlayers {
                needed: 4,
                have: 2
            }
        );
    }

    #[test]
    fn start_sets_countdown_for_hidden_object() {
        let mut session = new_hidden_session();
        let mut rng = StdRng::seed_from_u64(10);
        let rules = hidden_rules();
        start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();

        assert_eq!(session.phase, Phase::Playing);
        assert_eq!(session.time_left, 120);
        assert_eq!(session.players["alice"].started_at, Some(now()));
    }

    #[test]
    fn start_deals_expected_impostor_count() {
        for player_count in 4..=10usize {
            let mut session = new_social_session();
            let mut rng = StdRng::seed_from_u64(11);
            let rules = social_rules();
            for index in 1..player_count {
                let id = format!("p{index}");
                join_session(&mut session, &rules, &id, &id, now(), &mut rng).unwrap();
            }
            start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();

            let impostors = session.alive_with_role(Role::Impostor);
            let crewmates = session.alive_with_role(Role::Crewmate);
            assert_eq!(impostors, (player_count / 4).max(1));
            assert_eq!(impostors + crewmates, player_count);
            assert!(
                session
                    .players
                    .values()
                    .filter(|p| p.role == Some(Role::Crewmate))
                    .all(|p| p.total_tasks == 5 && p.tasks_completed == 0)
            );
        }
    }

    #[test]
    fn impostor_draw_is_spread_across_players() {
        // 400 seeded deals over 5 players, one impostor each: every seat must
        // be drawn a plausible share of the time (expected 80).
        let mut counts: HashMap<String, usize> = HashMap::new();
        for seed in 0..400u64 {
            let mut session = new_social_session();
            let mut rng = StdRng::seed_from_u64(seed);
            let rules = social_rules();
            for id in ["bob", "carol", "dave", "eve"] {
                join_session(&mut session, &rules, id, id, now(), &mut rng).unwrap();
            }
            start_session(&mut session, &rules, "alice", now(), &mut rng).unwrap();

            for player in session.players.values() {
                if player.role == Some(Role::Impostor) {
                    *counts.entry(player.id.clone()).or_default() += 1;
                }
            }
        }

        assert_eq!(counts.values().sum::<usize>(), 400);
        for (player_id, count) in counts {
            assert!(
                (40..=140).contains(&count),
                "impostor draw skewed for {player_id}: {count}/400"
            );
        }
    }
}
