use rand::rngs::SmallRng;
use rand::SeedableRng;
use salvo::{
    BoardError, Coord, FleetBoard, Grid, Orientation, Ship, ShipBoard, BOARD_SIZE, FLEET,
    NUM_SHIPS,
};

fn coord(s: &str) -> Coord {
    s.parse().unwrap()
}

#[test]
fn test_coord_text_form() {
    let c = coord("A1");
    assert_eq!((c.row(), c.col()), (0, 0));
    let c = coord(" j10 ");
    assert_eq!((c.row(), c.col()), (9, 9));
    assert_eq!(c.to_string(), "J10");
    assert_eq!(Coord::new(2, 6).unwrap().to_string(), "C7");

    for bad in ["", "A", "1A", "A0", "A11", "K5", "AA1", "B+2", "B 2"] {
        assert_eq!(
            bad.parse::<Coord>().unwrap_err(),
            BoardError::InvalidCoordinate(bad.to_string()),
            "{:?}",
            bad
        );
    }
    assert!(Coord::new(BOARD_SIZE, 0).is_err());
    assert_eq!(Coord::all().count(), BOARD_SIZE * BOARD_SIZE);
}

#[test]
fn test_ship_cells_follow_orientation() {
    let ship = Ship::new(FLEET[1], coord("C3"), Orientation::Vertical).unwrap();
    let cells: Vec<String> = ship.cells().iter().map(|c| c.to_string()).collect();
    assert_eq!(cells, ["C3", "D3", "E3", "F3"]);
    assert_eq!(
        Ship::new(FLEET[0], coord("A7"), Orientation::Horizontal).unwrap_err(),
        BoardError::ShipOutOfBounds
    );
}

#[test]
fn test_place_rejections() {
    let mut board = FleetBoard::new();
    board.place(0, coord("A1"), Orientation::Horizontal).unwrap();
    assert_eq!(
        board.place(0, coord("B1"), Orientation::Horizontal).unwrap_err(),
        BoardError::ShipAlreadyPlaced
    );
    assert_eq!(
        board.place(1, coord("A3"), Orientation::Vertical).unwrap_err(),
        BoardError::ShipOverlaps
    );
    assert_eq!(
        board
            .place(NUM_SHIPS, coord("J1"), Orientation::Horizontal)
            .unwrap_err(),
        BoardError::InvalidShipIndex(NUM_SHIPS)
    );
    assert!(!board.is_complete());
    assert_eq!(board.ship_length(1), 0);
    assert_eq!(board.has_ship_at(coord("A5")), Some(0));
    assert_eq!(board.has_ship_at(coord("A6")), None);
    assert_eq!(board.ship_name(0), "Carrier");
}

#[test]
fn test_random_board_is_complete_and_disjoint() {
    for seed in 0..32 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = FleetBoard::random(&mut rng).unwrap();
        assert!(board.is_complete());
        let expected: usize = FLEET.iter().map(|s| s.length()).sum();
        assert_eq!(board.occupied().count_ones(), expected);

        let mut union = Grid::new();
        for i in 0..NUM_SHIPS {
            let ship = board.ship(i).unwrap();
            assert_eq!(ship.cells().count_ones(), FLEET[i].length());
            assert!((union & ship.cells()).is_empty());
            union |= ship.cells();
            for cell in ship.cells().iter() {
                assert_eq!(board.has_ship_at(cell), Some(i));
            }
        }
    }
}

#[test]
fn test_grid_set_operations() {
    let mut grid = Grid::new();
    assert!(grid.insert(coord("B2")));
    assert!(!grid.insert(coord("B2")));
    assert!(grid.contains(coord("B2")));
    assert!(grid.insert(coord("J10")));
    assert_eq!(grid.iter().collect::<Vec<_>>(), vec![coord("B2"), coord("J10")]);
    assert!(grid.remove(coord("B2")));
    assert!(!grid.remove(coord("B2")));
    assert_eq!(grid.count_ones(), 1);
    let other: Grid = [coord("J10"), coord("A1")].into_iter().collect();
    assert_eq!((grid | other).count_ones(), 2);
}
