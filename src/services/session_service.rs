//! Core game orchestration: every action is one serialized
//! load → pure transition → compare-and-swap write round trip.

use std::sync::Arc;
use std::time::SystemTime;

use rand::rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::session_store::{Revision, SessionStore},
    dto::session::{
        CastVoteRequest, CreateSessionRequest, EliminateRequest, JoinPayload, JoinSessionRequest,
        LocatePayload, LocateTargetRequest, PlayerActionRequest, SessionPayload, TaskPayload,
    },
    error::ServiceError,
    state::{SharedState, clock, lifecycle, objective, session::GameSession},
};

/// Bootstrap a fresh session with the requesting player as host.
///
/// The session id is taken from the hosting platform when provided and
/// generated otherwise. Creating an id that is already live is rejected.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let guard = state.session_guard(&session_id);
    let _lock = guard.lock().await;

    if store.find_session(session_id.clone(), now).await?.is_some() {
        return Err(ServiceError::InvalidState(format!(
            "session `{session_id}` already exists"
        )));
    }

    let session = lifecycle::create_session(
        session_id,
        request.host_id,
        request.host_name,
        request.variant,
        state.config().target_layout(),
        now,
        state.config().session_ttl(),
    );
    store.save_session(session.clone().into(), None).await?;

    info!(session_id = %session.id, variant = ?session.variant, "session created");
    Ok(SessionPayload {
        session: (&session).into(),
    })
}

/// Add a player to a session; idempotent for an already-joined player id.
pub async fn join_session(
    state: &SharedState,
    session_id: &str,
    request: JoinSessionRequest,
) -> Result<JoinPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    let outcome = {
        let mut rng = rng();
        lifecycle::join_session(
            &mut session,
            rules,
            &request.player_id,
            &request.username,
            now,
            &mut rng,
        )?
    };

    if outcome.newly_joined {
        persist_session(&store, &session, revision).await?;
        debug!(
            session_id = %session.id,
            player_id = %request.player_id,
            players = session.players.len(),
            "player joined"
        );
    }

    Ok(JoinPayload {
        session: (&session).into(),
        player_id: request.player_id,
    })
}

/// Start the game on behalf of the host, dealing roles where the variant
/// requires it.
pub async fn start_session(
    state: &SharedState,
    session_id: &str,
    request: PlayerActionRequest,
) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    {
        let mut rng = rng();
        lifecycle::start_session(&mut session, rules, &request.player_id, now, &mut rng)?;
    }
    persist_session(&store, &session, revision).await?;

    info!(
        session_id = %session.id,
        variant = ?session.variant,
        players = session.players.len(),
        "game started"
    );
    Ok(SessionPayload {
        session: (&session).into(),
    })
}

/// Hit-test a click. Misses and stale requests are tolerated as no-ops; the
/// session is persisted either way so a triggered phase transition is
/// durable.
pub async fn locate_target(
    state: &SharedState,
    session_id: &str,
    request: LocateTargetRequest,
) -> Result<LocatePayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    let outcome = objective::locate_target(
        &mut session,
        rules,
        &request.player_id,
        request.x,
        request.y,
        now,
    );
    persist_session(&store, &session, revision).await?;

    if outcome.found {
        debug!(
            session_id = %session.id,
            player_id = %request.player_id,
            target_id = ?outcome.target_id,
            score_delta = outcome.score_delta,
            "target found"
        );
    }

    let target = outcome
        .target_id
        .and_then(|id| session.targets.iter().find(|target| target.id == id))
        .map(Into::into);

    Ok(LocatePayload {
        session: (&session).into(),
        found: outcome.found,
        target,
        score_delta: outcome.score_delta,
    })
}

/// Record one completed task for an alive crewmate; a no-op otherwise.
pub async fn complete_task(
    state: &SharedState,
    session_id: &str,
    request: PlayerActionRequest,
) -> Result<TaskPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    let outcome = objective::complete_task(&mut session, rules, &request.player_id, now);
    if outcome.task_completed {
        persist_session(&store, &session, revision).await?;
    }

    Ok(TaskPayload {
        session: (&session).into(),
        task_completed: outcome.task_completed,
    })
}

/// Call an emergency meeting, moving the session into discussion.
pub async fn call_meeting(
    state: &SharedState,
    session_id: &str,
    request: PlayerActionRequest,
) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    objective::call_meeting(&mut session, rules, &request.player_id)?;
    persist_session(&store, &session, revision).await?;

    debug!(
        session_id = %session.id,
        caller_id = %request.player_id,
        "emergency meeting called"
    );
    Ok(SessionPayload {
        session: (&session).into(),
    })
}

/// Eliminate a player as an impostor.
pub async fn eliminate_player(
    state: &SharedState,
    session_id: &str,
    request: EliminateRequest,
) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    objective::eliminate_player(
        &mut session,
        rules,
        &request.player_id,
        &request.target_id,
        now,
    )?;
    persist_session(&store, &session, revision).await?;

    debug!(
        session_id = %session.id,
        target_id = %request.target_id,
        "player eliminated"
    );
    Ok(SessionPayload {
        session: (&session).into(),
    })
}

/// Cast a vote, resolving the tally once every alive player has voted.
pub async fn cast_vote(
    state: &SharedState,
    session_id: &str,
    request: CastVoteRequest,
) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;

    let outcome = objective::cast_vote(
        &mut session,
        &request.player_id,
        request.target_id.as_deref(),
        now,
    )?;
    persist_session(&store, &session, revision).await?;

    if let Some(tally) = outcome.tally {
        info!(
            session_id = %session.id,
            eliminated = ?tally.eliminated,
            "voting round resolved"
        );
    }
    Ok(SessionPayload {
        session: (&session).into(),
    })
}

/// Advance the session's countdowns by one second. Idempotent.
pub async fn tick(state: &SharedState, session_id: &str) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let guard = state.session_guard(session_id);
    let _lock = guard.lock().await;

    let (mut session, revision) = load_session(&store, session_id, now).await?;
    let rules = state.config().rules_for(session.variant);

    clock::tick(&mut session, rules, now);
    persist_session(&store, &session, revision).await?;

    Ok(SessionPayload {
        session: (&session).into(),
    })
}

/// Read the current session state.
pub async fn get_session(
    state: &SharedState,
    session_id: &str,
) -> Result<SessionPayload, ServiceError> {
    let store = state.require_session_store().await?;
    let (session, _) = load_session(&store, session_id, SystemTime::now()).await?;
    Ok(SessionPayload {
        session: (&session).into(),
    })
}

async fn load_session(
    store: &Arc<dyn SessionStore>,
    session_id: &str,
    now: SystemTime,
) -> Result<(GameSession, Revision), ServiceError> {
    let Some(versioned) = store.find_session(session_id.to_string(), now).await? else {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` not found"
        )));
    };
    Ok((versioned.entity.into(), versioned.revision))
}

async fn persist_session(
    store: &Arc<dyn SessionStore>,
    session: &GameSession,
    revision: Revision,
) -> Result<(), ServiceError> {
    store
        .save_session(session.clone().into(), Some(revision))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::models::{GameVariant, Phase, Winner};
    use crate::dao::session_store::memory::MemorySessionStore;
    use crate::state::AppState;

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_session_store(Arc::new(MemorySessionStore::new()))
            .await;
        state
    }

    fn create_request(session_id: &str, variant: GameVariant) -> CreateSessionRequest {
        CreateSessionRequest {
            session_id: Some(session_id.into()),
            host_id: "alice".into(),
            host_name: "Alice".into(),
            variant,
        }
    }

    #[tokio::test]
    async fn operations_require_an_installed_store() {
        let state = AppState::new(AppConfig::default());
        let err = get_session(&state, "post-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn unknown_session_is_a_normal_not_found() {
        let state = test_state().await;
        let err = tick(&state, "gone").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn creating_the_same_session_twice_is_rejected() {
        let state = test_state().await;
        create_session(&state, create_request("post-1", GameVariant::HiddenObject))
            .await
            .unwrap();

        let err = create_session(&state, create_request("post-1", GameVariant::HiddenObject))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn join_is_idempotent_through_the_service() {
        let state = test_state().await;
        create_session(&state, create_request("post-1", GameVariant::HiddenObject))
            .await
            .unwrap();

        let request = || JoinSessionRequest {
            player_id: "bob".into(),
            username: "Bob".into(),
        };
        let first = join_session(&state, "post-1", request()).await.unwrap();
        let second = join_session(&state, "post-1", request()).await.unwrap();

        assert_eq!(first.session.players.len(), 2);
        assert_eq!(second.session.players.len(), 2);
        assert_eq!(second.player_id, "bob");
    }

    #[tokio::test]
    async fn full_hidden_object_round() {
        let state = test_state().await;

        let created = create_session(&state, create_request("post-1", GameVariant::HiddenObject))
            .await
            .unwrap();
        assert_eq!(created.session.phase, Phase::Waiting);

        join_session(
            &state,
            "post-1",
            JoinSessionRequest {
                player_id: "bob".into(),
                username: "Bob".into(),
            },
        )
        .await
        .unwrap();

        let started = start_session(
            &state,
            "post-1",
            PlayerActionRequest {
                player_id: "alice".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(started.session.phase, Phase::Playing);
        assert_eq!(started.session.players.len(), 2);

        // Center of the first (easy) target of the built-in layout.
        let hit = locate_target(
            &state,
            "post-1",
            LocateTargetRequest {
                player_id: "alice".into(),
                x: 11.0,
                y: 16.0,
            },
        )
        .await
        .unwrap();
        assert!(hit.found);
        assert_eq!(hit.target.as_ref().map(|t| t.id), Some(0));
        // Easy base value plus a non-negative speed bonus.
        assert!(hit.score_delta >= 10);

        let miss = locate_target(
            &state,
            "post-1",
            LocateTargetRequest {
                player_id: "alice".into(),
                x: 0.5,
                y: 99.5,
            },
        )
        .await
        .unwrap();
        assert!(!miss.found);
        assert_eq!(miss.score_delta, 0);

        // Sweep the remaining targets of the built-in layout.
        let centers = [
            (75.0, 21.5),
            (32.5, 73.5),
            (50.0, 37.5),
            (17.0, 54.5),
            (86.75, 62.5),
            (61.25, 83.5),
            (39.0, 9.5),
        ];
        for (x, y) in centers {
            let outcome = locate_target(
                &state,
                "post-1",
                LocateTargetRequest {
                    player_id: "alice".into(),
                    x,
                    y,
                },
            )
            .await
            .unwrap();
            assert!(outcome.found, "expected a find at ({x}, {y})");
        }

        let ended = get_session(&state, "post-1").await.unwrap();
        assert_eq!(ended.session.phase, Phase::Ended);
        assert_eq!(ended.session.winner, Some(Winner::Player("alice".into())));

        let board = ended.session.leaderboard.expect("leaderboard after end");
        assert_eq!(board[0].player_id, "alice");
        assert_eq!(board[0].rank, 1);
    }

    #[tokio::test]
    async fn social_round_reaches_voting_through_ticks() {
        let state = test_state().await;
        create_session(&state, create_request("post-2", GameVariant::SocialDeduction))
            .await
            .unwrap();
        for id in ["bob", "carol", "dave"] {
            join_session(
                &state,
                "post-2",
                JoinSessionRequest {
                    player_id: id.into(),
                    username: id.to_uppercase(),
                },
            )
            .await
            .unwrap();
        }
        start_session(
            &state,
            "post-2",
            PlayerActionRequest {
                player_id: "alice".into(),
            },
        )
        .await
        .unwrap();

        let meeting = call_meeting(
            &state,
            "post-2",
            PlayerActionRequest {
                player_id: "bob".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(meeting.session.phase, Phase::Discussion);
        assert_eq!(meeting.session.discussion_time_left, Some(45));

        // Run the discussion countdown out.
        let mut payload = meeting;
        for _ in 0..45 {
            payload = tick(&state, "post-2").await.unwrap();
        }
        assert_eq!(payload.session.phase, Phase::Voting);
        assert_eq!(payload.session.voting_time_left, Some(30));

        // Everyone skips; the tally resolves with nobody eliminated.
        for id in ["alice", "bob", "carol", "dave"] {
            payload = cast_vote(
                &state,
                "post-2",
                CastVoteRequest {
                    player_id: id.into(),
                    target_id: None,
                },
            )
            .await
            .unwrap();
        }
        assert_eq!(payload.session.phase, Phase::Playing);
    }
}
