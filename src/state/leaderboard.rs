//! Ranked leaderboard derivation.

use crate::state::session::{GameSession, LeaderboardEntry};

/// Build the ranked leaderboard for a session.
///
/// Ordering: score descending, then earlier completion first; players without
/// a completion timestamp sort after those with one, and remaining ties keep
/// join order (the sort is stable over the insertion-ordered players map).
/// Pure function, safe to call repeatedly.
pub fn build_leaderboard(session: &GameSession) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<LeaderboardEntry> = session
        .players
        .values()
        .map(|player| LeaderboardEntry {
            rank: 0,
            player_id: player.id.clone(),
            display_name: player.display_name.clone(),
            score: player.score,
            completed_at: player.completed_at,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score.cmp(&a.score).then_with(|| match (a.completed_at, b.completed_at) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
    });

    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }

    rows
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use indexmap::IndexMap;

    use super::*;
    use crate::dao::models::{GameVariant, Phase};
    use crate::state::session::{GameSession, Player};

    fn session_with(players: Vec<Player>) -> GameSession {
        let now = SystemTime::UNIX_EPOCH;
        GameSession {
            id: "post-1".into(),
            variant: GameVariant::HiddenObject,
            phase: Phase::Playing,
            host_id: players[0].id.clone(),
            created_at: now,
            expires_at: now + Duration::from_secs(3600),
            players: players
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect::<IndexMap<_, _>>(),
            targets: Vec::new(),
            time_left: 0,
            discussion_time_left: 0,
            voting_time_left: 0,
            winner: None,
            meeting_caller_id: None,
            last_eliminated_id: None,
            started_at: Some(now),
            ended_at: None,
            leaderboard: Vec::new(),
        }
    }

    fn player(id: &str, score: u32, completed_secs: Option<u64>) -> Player {
        let mut p = Player::new(id.into(), id.to_uppercase());
        p.score = score;
        p.completed_at =
            completed_secs.map(|s| SystemTime::UNIX_EPOCH + Duration::from_secs(s));
        p
    }

    #[test]
    fn orders_by_score_then_completion_time() {
        let session = session_with(vec![
            player("a", 100, Some(5)),
            player("b", 100, Some(2)),
            player("c", 50, None),
        ]);

        let board = build_leaderboard(&session);
        let ids: Vec<&str> = board.iter().map(|row| row.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn completion_less_players_sort_after_completed_ones() {
        let session = session_with(vec![player("a", 80, None), player("b", 80, Some(30))]);

        let board = build_leaderboard(&session);
        assert_eq!(board[0].player_id, "b");
        assert_eq!(board[1].player_id, "a");
    }

    #[test]
    fn full_ties_keep_join_order() {
        let session = session_with(vec![player("first", 10, None), player("second", 10, None)]);

        let board = build_leaderboard(&session);
        assert_eq!(board[0].player_id, "first");
        assert_eq!(board[1].player_id, "second");
    }
}
