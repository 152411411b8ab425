mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use salvo::{Error, FireOutcome, GameServer, PlayerStatus};

#[test]
fn test_racing_fires_resolve_exactly_once() {
    for _ in 0..50 {
        let server = Arc::new(GameServer::default());
        let (a, b) = started(&server);
        aim_all(&server, a, &["A1", "A2", "C1"]);
        aim_all(&server, b, &["A3", "I1", "I2"]);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|player| {
                let server = server.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    server.fire(player).unwrap()
                })
            })
            .collect();
        let results: Vec<FireOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let resolved = results
            .iter()
            .filter(|r| matches!(r, FireOutcome::Resolved { round: 1, .. }))
            .count();
        let waiting = results
            .iter()
            .filter(|r| matches!(r, FireOutcome::Waiting { round: 1 }))
            .count();
        assert_eq!((resolved, waiting), (1, 1));

        let view_a = server.view(a).unwrap();
        assert_eq!(view_a.reports.len(), 1);
        assert_eq!(view_a.round, Some(2));
        let from_a = &view_a.reports[0];
        assert_eq!(from_a.hits_on("Carrier"), 2);
        assert_eq!(from_a.hits_on("Battleship"), 1);
        assert_eq!(from_a.total_hits(), 3);
        assert!(from_a.sunk.is_empty());

        let view_b = server.view(b).unwrap();
        let from_b = &view_b.reports[0];
        assert_eq!(from_b.hits_on("Carrier"), 1);
        assert_eq!(from_b.hits_on("Destroyer"), 2);
        assert_eq!(from_b.sunk, vec!["Destroyer".to_string()]);
        assert_eq!(server.shots_available(a).unwrap(), 5);
    }
}

#[test]
fn test_concurrent_aims_respect_quota() {
    let server = Arc::new(GameServer::default());
    let (a, _) = started(&server);
    let barrier = Arc::new(Barrier::new(10));
    let handles: Vec<_> = (1..=10)
        .map(|col| {
            let server = server.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                server.aim(a, &format!("F{}", col))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 6);
    for r in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(*r, Error::QuotaExceeded { quota: 6 });
    }
    assert_eq!(server.view(a).unwrap().aimed.len(), 6);
}

#[test]
fn test_competing_requests_for_one_target() {
    for _ in 0..50 {
        let server = Arc::new(GameServer::default());
        let target = server.join("Target").unwrap();
        let senders: Vec<_> = ["Alice", "Bob", "Carol", "Dave"]
            .iter()
            .map(|n| server.join(n).unwrap())
            .collect();
        let barrier = Arc::new(Barrier::new(senders.len()));
        let handles: Vec<_> = senders
            .iter()
            .map(|&sender| {
                let server = server.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    server.send_game_request(sender, target).is_ok()
                })
            })
            .collect();
        let won: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(won, 1);

        let requesting = senders
            .iter()
            .filter(|&&s| server.get_status(s).unwrap() == PlayerStatus::Requesting)
            .count();
        assert_eq!(requesting, 1);
        assert_eq!(
            server.get_status(target).unwrap(),
            PlayerStatus::PendingResponse
        );
    }
}

#[test]
fn test_accept_and_cancel_race() {
    for _ in 0..50 {
        let server = Arc::new(GameServer::default());
        let a = server.join("Alice").unwrap();
        let b = server.join("Bob").unwrap();
        server.send_game_request(a, b).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let accept = {
            let server = server.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                server.accept_game_request(b).is_ok()
            })
        };
        let cancel = {
            let server = server.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                server.cancel_game_request(a).is_ok()
            })
        };
        let accepted = accept.join().unwrap();
        let cancelled = cancel.join().unwrap();
        assert!(accepted ^ cancelled);

        let expected = if accepted {
            PlayerStatus::InGame
        } else {
            PlayerStatus::Available
        };
        assert_eq!(server.get_status(a).unwrap(), expected);
        assert_eq!(server.get_status(b).unwrap(), expected);
    }
}

#[test]
fn test_reset_racing_pairing_leaves_no_orphan_players() {
    for _ in 0..50 {
        let server = Arc::new(GameServer::default());
        paired(&server);

        let barrier = Arc::new(Barrier::new(2));
        let reset = {
            let server = server.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                server.reset();
            })
        };
        let pair = {
            let server = server.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let a = server.join("Carol").ok()?;
                let b = server.join("Dave").ok()?;
                server.send_game_request(a, b).ok()?;
                server.accept_game_request(b).ok()
            })
        };
        reset.join().unwrap();
        pair.join().unwrap();

        for name in ["Alice", "Bob", "Carol", "Dave"] {
            if let Ok(player) = server.lobby().get_player_by_name(name) {
                if player.status == PlayerStatus::InGame {
                    assert!(server.games().game_of(player.id).is_ok(), "{} has no game", name);
                }
            }
        }
        assert!(server.games().active_games() <= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_game_poll_wakes_on_opponent_aim() {
    let server = Arc::new(GameServer::default());
    let (a, b) = started(&server);
    let start = server.view(b).unwrap().version;

    let watcher = {
        let server = server.clone();
        tokio::spawn(async move {
            server
                .poll_game(b, Some(start), Some(std::time::Duration::from_secs(5)))
                .await
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    server.aim(a, "J10").unwrap();

    let polled = watcher.await.unwrap().unwrap();
    assert!(!polled.timed_out);
    assert!(polled.version > start);
    assert!(polled.state.aimed.is_empty());
}
