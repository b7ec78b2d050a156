//! Material minimax search.
//!
//! Evaluation is plain material count from White's point of view, so
//! scores are comparable across the whole tree. Interior nodes prune
//! with an alpha-beta window; root moves are deliberately each searched
//! with the full window, so move generation order cannot change which
//! move wins.

use shakmaty::{Board, Chess, Color, Move, Position, Role};

/// Material value of one piece type, in pawns.
fn piece_value(role: Role) -> f64 {
    match role {
        Role::Pawn => 1.0,
        Role::Knight | Role::Bishop => 3.0,
        Role::Rook => 5.0,
        Role::Queen => 9.0,
        Role::King => 0.0,
    }
}

/// Material balance, positive when White is ahead.
pub fn evaluate(board: &Board) -> f64 {
    let mut score = 0.0;
    for &role in &Role::ALL {
        let value = piece_value(role);
        let white = (board.by_color(Color::White) & board.by_role(role)).count();
        let black = (board.by_color(Color::Black) & board.by_role(role)).count();
        score += value * (white as f64 - black as f64);
    }
    score
}

/// Outcome of a root search. `best_move` is `None` when the side to move
/// has no legal move, in which case `value` stays at the perspective's
/// initial bound.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub value: f64,
}

/// Depth-limited minimax with alpha-beta pruning.
///
/// `maximizing` names the optimization at this ply: true folds a running
/// maximum, false a running minimum. Recursion clones the position per
/// move, so the caller's position is never mutated. At depth zero, or
/// when the rules engine reports the game over, the static material
/// balance is returned.
pub fn search(position: &Chess, depth: u32, mut alpha: f64, mut beta: f64, maximizing: bool) -> f64 {
    if depth == 0 || position.is_game_over() {
        return evaluate(position.board());
    }

    if maximizing {
        let mut best = f64::NEG_INFINITY;
        for mv in position.legal_moves() {
            let mut child = position.clone();
            child.play_unchecked(mv);
            let value = search(&child, depth - 1, alpha, beta, false);
            best = best.max(value);
            alpha = alpha.max(value);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = f64::INFINITY;
        for mv in position.legal_moves() {
            let mut child = position.clone();
            child.play_unchecked(mv);
            let value = search(&child, depth - 1, alpha, beta, true);
            best = best.min(value);
            beta = beta.min(value);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}

/// Picks the root move that best serves `perspective`.
///
/// Every root move is searched with the full window. Strict comparison
/// keeps the first of equally good moves, and with no legal move the
/// result carries `None` and the untouched initial bound. A depth of
/// zero is treated as a one-ply search.
pub fn find_best_move(position: &Chess, depth: u32, perspective: Color) -> SearchResult {
    let mut best_move = None;
    let mut best_value = match perspective {
        Color::White => f64::NEG_INFINITY,
        Color::Black => f64::INFINITY,
    };

    for mv in position.legal_moves() {
        let mut child = position.clone();
        child.play_unchecked(mv);
        let value = search(
            &child,
            depth.saturating_sub(1),
            f64::NEG_INFINITY,
            f64::INFINITY,
            perspective == Color::Black,
        );
        log::trace!("root {mv:?}: {value}");

        let better = match perspective {
            Color::White => value > best_value,
            Color::Black => value < best_value,
        };
        if better {
            best_value = value;
            best_move = Some(mv);
        }
    }

    SearchResult {
        best_move,
        value: best_value,
    }
}
