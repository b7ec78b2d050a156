//! End-to-end tests over synthetic board photographs.
//!
//! Pieces are painted as filled discs: white fill with a dark outline
//! for White, solid dark fill for Black. That is enough texture for the
//! occupancy detector and the pixel-mass color heuristic, while piece
//! types come from a scripted classifier in recognition scan order.

use chessboard_advisor::hint::NO_MOVE_HINT;
use chessboard_advisor::mock::ScriptedRoles;
use chessboard_advisor::render::square_fill;
use chessboard_advisor::vision::VisionError;
use chessboard_advisor::vision::color::PixelMassHeuristic;
use chessboard_advisor::{Advisor, AdvisorError, BoardRecognizer, HintGenerator};
use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;
use shakmaty::{Color, File, Rank, Role, Square};

const CELL: u32 = 96;
const LIGHT: Rgb<u8> = Rgb([240, 217, 181]);
const DARK: Rgb<u8> = Rgb([181, 136, 99]);

fn empty_board() -> RgbImage {
    RgbImage::from_fn(CELL * 8, CELL * 8, |x, y| {
        if (x / CELL + y / CELL) % 2 == 0 {
            LIGHT
        } else {
            DARK
        }
    })
}

fn cell_origin(square: Square) -> (u32, u32) {
    let x = u32::from(square.file()) * CELL;
    let y = (7 - u32::from(square.rank())) * CELL;
    (x, y)
}

fn paint_piece(img: &mut RgbImage, square: Square, color: Color) {
    let (ox, oy) = cell_origin(square);
    let c = i64::from(CELL) / 2;
    let outline = i64::from(CELL) * 35 / 100;
    let fill = outline - 3;
    for y in 0..CELL {
        for x in 0..CELL {
            let dx = i64::from(x) - c;
            let dy = i64::from(y) - c;
            let d2 = dx * dx + dy * dy;
            let px = if d2 <= fill * fill {
                match color {
                    Color::White => Rgb([255, 255, 255]),
                    Color::Black => Rgb([10, 10, 10]),
                }
            } else if d2 <= outline * outline {
                Rgb([10, 10, 10])
            } else {
                continue;
            };
            img.put_pixel(ox + x, oy + y, px);
        }
    }
}

const BACK_RANK: [Role; 8] = [
    Role::Rook,
    Role::Knight,
    Role::Bishop,
    Role::Queen,
    Role::King,
    Role::Bishop,
    Role::Knight,
    Role::Rook,
];

/// Photograph of the starting position.
fn startpos_image() -> RgbImage {
    let mut img = empty_board();
    for file in File::ALL {
        paint_piece(&mut img, Square::from_coords(file, Rank::First), Color::White);
        paint_piece(&mut img, Square::from_coords(file, Rank::Second), Color::White);
        paint_piece(&mut img, Square::from_coords(file, Rank::Seventh), Color::Black);
        paint_piece(&mut img, Square::from_coords(file, Rank::Eighth), Color::Black);
    }
    img
}

/// Piece types of the starting position in recognition scan order,
/// rank 8 first.
fn startpos_roles() -> ScriptedRoles {
    let mut roles = Vec::new();
    roles.extend(BACK_RANK);
    roles.extend([Role::Pawn; 8]);
    roles.extend([Role::Pawn; 8]);
    roles.extend(BACK_RANK);
    ScriptedRoles::new(roles)
}

fn advisor_with(roles: ScriptedRoles) -> Advisor {
    let recognizer = BoardRecognizer::new(
        vec![Box::new(PixelMassHeuristic)],
        Some(Box::new(roles)),
    );
    Advisor::new(recognizer, HintGenerator::with_seed(1))
}

// Recognition

#[test]
fn the_starting_position_is_read_exactly() {
    let img = startpos_image();
    let mut advisor = advisor_with(startpos_roles());

    let (board, fen) = advisor.recognize(&img, Color::White).unwrap();
    assert_eq!(
        fen,
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
    assert_eq!(board.pieces.len(), 32);
    assert_eq!(board.degraded_labels, 0);
    assert_eq!(board.inventory(Color::White).len(), 16);
    assert_eq!(board.inventory(Color::Black).len(), 16);
}

#[test]
fn an_empty_board_reads_as_empty_ranks() {
    let mut advisor = advisor_with(ScriptedRoles::default());
    let (board, fen) = advisor.recognize(&empty_board(), Color::White).unwrap();
    assert!(board.pieces.is_empty());
    assert_eq!(fen, "8/8/8/8/8/8/8/8 w KQkq - 0 1");
}

#[test]
fn misshaped_photographs_are_rejected() {
    let mut advisor = advisor_with(ScriptedRoles::default());
    let err = advisor
        .recognize(&RgbImage::new(96, 64), Color::White)
        .unwrap_err();
    assert!(matches!(
        err,
        AdvisorError::Vision(VisionError::NotSquare { .. })
    ));
}

#[test]
fn broken_classifiers_degrade_instead_of_aborting() {
    let mut img = empty_board();
    paint_piece(&mut img, Square::E4, Color::Black);
    paint_piece(&mut img, Square::D5, Color::Black);

    // no color stages, no piece model: every label falls back
    let recognizer = BoardRecognizer::new(Vec::new(), None);
    let mut advisor = Advisor::new(recognizer, HintGenerator::with_seed(1));
    let (board, fen) = advisor.recognize(&img, Color::White).unwrap();

    assert_eq!(board.degraded_labels, 4);
    assert_eq!(fen, "8/8/8/3P4/4P3/8/8/8 w KQkq - 0 1");
}

// Advice

#[test]
fn the_opening_search_recommends_a_playable_move() {
    let img = startpos_image();
    let mut advisor = advisor_with(startpos_roles());

    let advice = advisor.advise(&img, Color::White, 3).unwrap();
    let mv = advice.result.best_move.expect("a legal opening move");
    assert!(advice.result.value.abs() <= 39.0);

    // the rendered image vacates the moved piece's origin square
    let rendered = advice.rendered.expect("a rendered after-image");
    assert_eq!(rendered.dimensions(), img.dimensions());
    let from = mv.from().expect("opening moves have an origin");
    let (ox, oy) = cell_origin(from);
    assert_eq!(
        *rendered.get_pixel(ox + CELL / 2, oy + CELL / 2),
        square_fill(from)
    );
}

#[test]
fn a_position_the_rules_engine_rejects_is_an_error() {
    let mut img = empty_board();
    paint_piece(&mut img, Square::D5, Color::Black);

    let mut advisor = advisor_with(ScriptedRoles::new([Role::Queen]));
    let err = advisor.advise(&img, Color::White, 2).unwrap_err();
    assert!(matches!(err, AdvisorError::Position(_)));
}

#[test]
fn stalemate_produces_no_move_and_the_fixed_hint() {
    let mut img = empty_board();
    paint_piece(&mut img, Square::B3, Color::Black);
    paint_piece(&mut img, Square::C3, Color::Black);
    paint_piece(&mut img, Square::A1, Color::White);

    let roles = ScriptedRoles::new([Role::Queen, Role::King, Role::King]);
    let mut advisor = advisor_with(roles);
    let advice = advisor.advise(&img, Color::White, 3).unwrap();

    assert_eq!(advice.fen, "8/8/8/8/8/1qk5/8/K7 w KQkq - 0 1");
    assert_eq!(advice.result.best_move, None);
    assert_eq!(advice.result.value, f64::NEG_INFINITY);
    assert_eq!(advice.hint, NO_MOVE_HINT);
    assert!(advice.rendered.is_none());
}

// Hints

#[test]
fn a_quiet_position_buckets_to_a_deterministic_pawn_hint() {
    // the only good line trades the pawn's capture against the queen
    // for a level game, so the hint lands in the middle bucket
    let mut img = empty_board();
    paint_piece(&mut img, Square::B3, Color::Black);
    paint_piece(&mut img, Square::C3, Color::Black);
    paint_piece(&mut img, Square::A2, Color::White);
    paint_piece(&mut img, Square::A1, Color::White);

    let roles = ScriptedRoles::new([Role::Queen, Role::King, Role::Pawn, Role::King]);
    let mut advisor = advisor_with(roles);
    let advice = advisor.advise(&img, Color::White, 3).unwrap();

    assert_eq!(advice.fen, "8/8/8/8/8/1qk5/P7/K7 w KQkq - 0 1");
    let mv = advice.result.best_move.expect("the queen capture");
    assert_eq!(mv.to(), Square::B3);
    assert_eq!(advice.result.value, 0.0);
    assert_eq!(
        advice.hint,
        "2.4 Place the pawn where it can restrict the opponent's knight. (Evaluation: 0.00)"
    );
}

#[test]
fn black_gets_the_same_pipeline_from_its_side() {
    let img = startpos_image();
    let mut advisor = advisor_with(startpos_roles());

    let advice = advisor.advise(&img, Color::Black, 2).unwrap();
    assert!(advice.fen.contains(" b KQkq"));
    let mv = advice.result.best_move.expect("a legal reply");
    // a black piece moves, so it starts on rank 7 or 8
    let from = mv.from().expect("replies have an origin");
    assert!(u32::from(from.rank()) >= 6);
}
