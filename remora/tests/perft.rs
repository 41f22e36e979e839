extern crate remora;

use remora::board::perft::perft;
use remora::helper::prelude::init_statics;
use remora::Position;

// Known node counts from the starting position.
static START_POS_PERFT: [u64; 6] = [20, 400, 8_902, 197_281, 4_865_609, 119_060_324];

#[test]
fn perft_start_pos() {
    init_statics();
    let mut pos = Position::start_pos();
    for depth in 1..=5_u16 {
        assert_eq!(
            perft(&mut pos, depth),
            START_POS_PERFT[depth as usize - 1],
            "perft({}) mismatch",
            depth
        );
    }
}

#[test]
#[ignore]
fn perft_start_pos_deep() {
    init_statics();
    let mut pos = Position::start_pos();
    assert_eq!(perft(&mut pos, 6), START_POS_PERFT[5]);
}

// The "kiwipete" position exercises castling, pins, promotions and en-passant
// far more than the starting position does.
#[test]
fn perft_kiwipete() {
    init_statics();
    let mut pos = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    assert_eq!(perft(&mut pos, 1), 48);
    assert_eq!(perft(&mut pos, 2), 2_039);
    assert_eq!(perft(&mut pos, 3), 97_862);
    assert_eq!(perft(&mut pos, 4), 4_085_603);
}

// Endgame position with promotion races and an exposed king.
#[test]
fn perft_endgame() {
    init_statics();
    let mut pos =
        Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
    assert_eq!(perft(&mut pos, 1), 14);
    assert_eq!(perft(&mut pos, 2), 191);
    assert_eq!(perft(&mut pos, 3), 2_812);
    assert_eq!(perft(&mut pos, 4), 43_238);
    assert_eq!(perft(&mut pos, 5), 674_624);
}

// Promotion-heavy position.
#[test]
fn perft_promotions() {
    init_statics();
    let mut pos = Position::from_fen("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1").unwrap();
    assert_eq!(perft(&mut pos, 1), 24);
    assert_eq!(perft(&mut pos, 2), 496);
    assert_eq!(perft(&mut pos, 3), 9_483);
    assert_eq!(perft(&mut pos, 4), 182_838);
}
