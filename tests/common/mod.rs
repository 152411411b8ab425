#![allow(dead_code)]

use std::sync::Arc;

use salvo::{Coord, FireOutcome, FleetBoard, GameServer, Orientation, PlayerId};

pub fn coord(s: &str) -> Coord {
    s.parse().unwrap()
}

/// Carrier A1-A5, Battleship C1-C4, Cruiser E1-E3, Submarine G1-G3,
/// Destroyer I1-I2, all horizontal.
pub fn stacked_board() -> FleetBoard {
    let mut board = FleetBoard::new();
    for (i, origin) in ["A1", "C1", "E1", "G1", "I1"].iter().enumerate() {
        board
            .place(i, coord(origin), Orientation::Horizontal)
            .unwrap();
    }
    board
}

/// Every cell of [`stacked_board`], ship by ship.
pub const STACKED_CELLS: [&str; 17] = [
    "A1", "A2", "A3", "A4", "A5", "C1", "C2", "C3", "C4", "E1", "E2", "E3", "G1", "G2", "G3",
    "I1", "I2",
];

/// Join Alice and Bob and seat them in a game.
pub fn paired(server: &GameServer) -> (PlayerId, PlayerId) {
    let a = server.join("Alice").unwrap();
    let b = server.join("Bob").unwrap();
    server.send_game_request(a, b).unwrap();
    server.accept_game_request(b).unwrap();
    (a, b)
}

/// [`paired`] with both stacked fleets placed, so round 1 is open.
pub fn started(server: &GameServer) -> (PlayerId, PlayerId) {
    let (a, b) = paired(server);
    server.place_fleet(a, Arc::new(stacked_board())).unwrap();
    server.place_fleet(b, Arc::new(stacked_board())).unwrap();
    (a, b)
}

pub fn aim_all(server: &GameServer, player: PlayerId, cells: &[&str]) {
    for cell in cells {
        server.aim(player, cell).unwrap();
    }
}

/// `a` fires first, `b` second; returns what `b`'s fire did.
pub fn play_round(
    server: &GameServer,
    a: PlayerId,
    a_cells: &[&str],
    b: PlayerId,
    b_cells: &[&str],
) -> FireOutcome {
    aim_all(server, a, a_cells);
    aim_all(server, b, b_cells);
    assert!(matches!(server.fire(a).unwrap(), FireOutcome::Waiting { .. }));
    server.fire(b).unwrap()
}
