mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use salvo::{
    Error, ErrorKind, GameServer, NoticeReason, Outcome, PlayerStatus, RequestNotice,
};

#[test]
fn test_join_validates_and_dedupes_names() {
    let server = GameServer::default();
    let id = server.join("  Alice ").unwrap();
    assert_eq!(server.lobby().get_player(id).unwrap().name, "Alice");
    assert_eq!(server.get_status(id).unwrap(), PlayerStatus::Available);

    let dup = server.join("Alice").unwrap_err();
    assert_eq!(dup, Error::DuplicateName("Alice".to_string()));
    assert_eq!(dup.kind(), ErrorKind::Conflict);

    for bad in ["", "   ", "A", "Robert'); DROP", "abcdefghijklmnopqrstuvwxyz"] {
        let err = server.join(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{:?} accepted", bad);
    }
    assert_eq!(server.lobby().len(), 1);
    assert_eq!(server.lobby().get_player_by_name("Alice").unwrap().id, id);
}

#[test]
fn test_request_moves_both_players() {
    let server = GameServer::default();
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();
    let c = server.join("Carol").unwrap();

    server.send_game_request(a, b).unwrap();
    assert_eq!(server.get_status(a).unwrap(), PlayerStatus::Requesting);
    assert_eq!(server.get_status(b).unwrap(), PlayerStatus::PendingResponse);
    assert_eq!(server.lobby().get_opponent(a).unwrap(), b);
    assert_eq!(server.lobby().get_opponent(b).unwrap(), a);
    assert_eq!(server.lobby().get_opponent(c).unwrap_err(), Error::NoOpponent(c));

    assert_eq!(
        server.send_game_request(c, b).unwrap_err(),
        Error::PlayerUnavailable {
            player: b,
            status: PlayerStatus::PendingResponse
        }
    );
    assert_eq!(
        server.send_game_request(a, c).unwrap_err(),
        Error::PlayerUnavailable {
            player: a,
            status: PlayerStatus::Requesting
        }
    );
    assert_eq!(server.send_game_request(c, c).unwrap_err(), Error::SelfRequest(c));
    assert_eq!(server.get_status(c).unwrap(), PlayerStatus::Available);
}

#[test]
fn test_accept_seats_both_players() {
    let server = GameServer::default();
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();
    server.send_game_request(a, b).unwrap();

    assert_eq!(server.accept_game_request(a).unwrap_err(), Error::RequestNotFound(a));
    let pairing = server.accept_game_request(b).unwrap();
    assert_eq!(pairing.sender, a);
    assert_eq!(pairing.receiver, b);
    assert_eq!(server.get_status(a).unwrap(), PlayerStatus::InGame);
    assert_eq!(server.get_status(b).unwrap(), PlayerStatus::InGame);
    assert_eq!(server.games().game_of(a).unwrap(), pairing.game);
    assert_eq!(server.games().get_opponent_id(b).unwrap(), a);
    assert_eq!(server.lobby().get_opponent(a).unwrap(), b);
    assert_eq!(server.accept_game_request(b).unwrap_err(), Error::RequestNotFound(b));
}

#[test]
fn test_decline_notifies_sender_once() {
    let server = GameServer::default();
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();
    server.send_game_request(a, b).unwrap();
    server.decline_game_request(b).unwrap();

    assert_eq!(server.get_status(a).unwrap(), PlayerStatus::Available);
    assert_eq!(server.get_status(b).unwrap(), PlayerStatus::Available);
    assert_eq!(
        server.take_decline_notification(a),
        Some(RequestNotice {
            from: b,
            from_name: "Bob".to_string(),
            reason: NoticeReason::Declined,
        })
    );
    assert_eq!(server.take_decline_notification(a), None);
    assert_eq!(server.take_decline_notification(b), None);

    let again = server.decline_game_request(b).unwrap_err();
    assert_eq!(again, Error::RequestNotFound(b));
    assert_eq!(again.kind(), ErrorKind::NotFound);
}

#[test]
fn test_cancel_notifies_receiver() {
    let server = GameServer::default();
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();
    assert_eq!(server.cancel_game_request(a).unwrap_err(), Error::RequestNotFound(a));

    server.send_game_request(a, b).unwrap();
    server.cancel_game_request(a).unwrap();
    assert_eq!(server.get_status(b).unwrap(), PlayerStatus::Available);
    let notice = server.take_decline_notification(b).unwrap();
    assert_eq!(notice.reason, NoticeReason::Cancelled);
    assert_eq!(notice.from, a);
    assert_eq!(server.accept_game_request(b).unwrap_err(), Error::RequestNotFound(b));
}

#[test]
fn test_leave_closes_open_request() {
    let server = GameServer::default();
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();
    server.send_game_request(a, b).unwrap();
    server.leave(b).unwrap();

    assert_eq!(server.get_status(a).unwrap(), PlayerStatus::Available);
    let notice = server.take_decline_notification(a).unwrap();
    assert_eq!(notice.reason, NoticeReason::Left);
    assert_eq!(notice.from_name, "Bob");
    assert_eq!(server.get_status(b).unwrap_err(), Error::PlayerNotFound(b));
    assert_eq!(server.leave(b).unwrap_err(), Error::PlayerNotFound(b));

    // The name is free again.
    server.join("Bob").unwrap();
}

#[test]
fn test_leave_mid_game_forfeits() {
    let server = GameServer::default();
    let (a, b) = started(&server);
    server.leave(a).unwrap();

    assert_eq!(server.get_status(b).unwrap(), PlayerStatus::Available);
    let notice = server.take_decline_notification(b).unwrap();
    assert_eq!((notice.from, notice.reason), (a, NoticeReason::Left));
    let view = server.view(b).unwrap();
    assert_eq!(
        view.outcome,
        Outcome::Forfeited {
            winner: b,
            quitter: a
        }
    );
    server.return_to_lobby(b).unwrap();
    assert_eq!(server.view(b).unwrap_err(), Error::NotInGame(b));
    assert_eq!(server.games().active_games(), 0);
}

#[test]
fn test_return_to_lobby_requires_finished_game() {
    let server = GameServer::default();
    let (a, b) = started(&server);
    let game = server.games().game_of(a).unwrap();
    assert_eq!(server.return_to_lobby(a).unwrap_err(), Error::GameInProgress(game));

    server.forfeit(b).unwrap();
    server.return_to_lobby(a).unwrap();
    server.return_to_lobby(a).unwrap();

    // A finished seat does not block a rematch.
    server.send_game_request(a, b).unwrap();
    let rematch = server.accept_game_request(b).unwrap();
    assert_ne!(rematch.game, game);
    assert_eq!(server.games().game_of(b).unwrap(), rematch.game);
    assert_eq!(server.games().active_games(), 1);
}

#[test]
fn test_listing_excludes_viewer_and_players_in_game() {
    let server = GameServer::default();
    let (a, b) = paired(&server);
    let c = server.join("Carol").unwrap();
    let d = server.join("Dave").unwrap();
    let e = server.join("Erin").unwrap();
    server.send_game_request(e, d).unwrap();

    let listed: Vec<_> = server
        .lobby()
        .list_available_to(c)
        .unwrap()
        .into_iter()
        .map(|p| (p.name, p.status))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("Dave".to_string(), PlayerStatus::PendingResponse),
            ("Erin".to_string(), PlayerStatus::Requesting),
        ]
    );

    let snapshot = server.lobby().snapshot(a).unwrap();
    assert_eq!(snapshot.status, PlayerStatus::InGame);
    assert_eq!(snapshot.opponent, Some(b));
    assert_eq!(snapshot.players.len(), 3);
}

#[test]
fn test_version_moves_only_on_success() {
    let server = GameServer::default();
    let v0 = server.lobby().version();
    let a = server.join("Alice").unwrap();
    let v1 = server.lobby().version();
    assert_eq!(v1, v0 + 1);

    assert!(server.join("Alice").is_err());
    assert!(server.send_game_request(a, a).is_err());
    assert!(server.decline_game_request(a).is_err());
    assert_eq!(server.lobby().version(), v1);

    let b = server.join("Bob").unwrap();
    server.send_game_request(a, b).unwrap();
    assert_eq!(server.lobby().version(), v1 + 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_lobby_wakes_on_request() {
    let server = Arc::new(GameServer::default());
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();

    let first = server.poll_lobby(b, None, None).await.unwrap();
    assert!(!first.timed_out);
    assert_eq!(first.state.status, PlayerStatus::Available);

    let waiter = {
        let server = server.clone();
        let known = Some(first.version);
        tokio::spawn(async move {
            server
                .poll_lobby(b, known, Some(Duration::from_secs(5)))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    server.send_game_request(a, b).unwrap();

    let woken = waiter.await.unwrap().unwrap();
    assert!(!woken.timed_out);
    assert!(woken.version > first.version);
    assert_eq!(woken.state.status, PlayerStatus::PendingResponse);
    assert_eq!(woken.state.opponent, Some(a));
}

#[tokio::test]
async fn test_poll_lobby_times_out_with_current_state() {
    let server = GameServer::default();
    let a = server.join("Alice").unwrap();
    let known = server.lobby().version();
    let polled = server
        .poll_lobby(a, Some(known), Some(Duration::from_millis(30)))
        .await
        .unwrap();
    assert!(polled.timed_out);
    assert_eq!(polled.version, known);

    let ghost = salvo::PlayerId::from(77);
    assert_eq!(
        server.poll_lobby(ghost, None, None).await.unwrap_err(),
        Error::PlayerNotFound(ghost)
    );
}

#[test]
fn test_reset_and_shutdown() {
    let server = GameServer::default();
    let (a, _) = started(&server);
    server.reset();
    assert!(server.lobby().is_empty());
    assert_eq!(server.games().active_games(), 0);
    assert_eq!(server.get_status(a).unwrap_err(), Error::PlayerNotFound(a));

    // Ids are not reused after a reset.
    let fresh = server.join("Alice").unwrap();
    assert_ne!(fresh, a);

    server.shutdown();
    assert!(server.is_shut_down());
    assert_eq!(server.join("Zed").unwrap_err(), Error::ShuttingDown);
}
