//! Turns a search result into a one-line strategy hint.
//!
//! Each piece type has fifteen advice templates. Evaluations inside the
//! contested band pick a template deterministically by bucketing the
//! value; decisive evaluations pick one at random, since the concrete
//! score no longer discriminates between lines of advice. The leading
//! number on each template is a historical weight and stays part of the
//! emitted text.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use shakmaty::Role;

use crate::search::SearchResult;

/// Emitted when the search produced no move, or when the moved piece
/// could not be named.
pub const NO_MOVE_HINT: &str = "No valid move found.";

/// Evaluation magnitude beyond which template choice goes random.
const DECISIVE_VALUE: f64 = 3.0;
/// Bucket width mapping in-band evaluations onto template indexes.
const BUCKET_WIDTH: f64 = 0.5;

const PAWN_HINTS: [&str; 15] = [
    "2.3 Consider advancing this pawn to control the center.",
    "2.5 Use this pawn to support other pieces.",
    "1.8 Push the pawn to create a stronghold for your attack.",
    "3.1 Place this pawn in front of your king for protection.",
    "2.2 Advance the pawn to block the opponent's pieces.",
    "2.7 Use this pawn to gain space on the queenside.",
    "2.1 Push the pawn to gain tempo in your development.",
    "1.9 Consider a pawn push to open up the game.",
    "2.4 Place the pawn where it can restrict the opponent's knight.",
    "2.6 Consider advancing the pawn to challenge the opponent's center.",
    "2.8 Place the pawn where it can control a key square in the center.",
    "3.0 Push the pawn to create a passed pawn in the endgame.",
    "2.1 Move the pawn to limit the movement of your opponent's pieces.",
    "2.3 Consider pushing the pawn to initiate an attack on the flank.",
    "2.6 Use this pawn to defend against an incoming attack.",
];

const ROOK_HINTS: [&str; 15] = [
    "3.1 Move the rook to an open file to maximize control.",
    "2.8 Use the rook to attack opponent's weak pawns.",
    "2.5 Consider doubling your rooks on an open file.",
    "3.0 Position your rook on the seventh rank to create pressure.",
    "2.7 Activate the rook to attack the opponent's back rank.",
    "2.4 Position your rook to support your central pawns.",
    "2.9 Keep your rook on an open file to limit the opponent's options.",
    "2.6 Place the rook behind your passed pawn to support its advancement.",
    "2.8 Use the rook to cut off the opponent's king from the center.",
    "2.3 Place the rook to defend your own king while attacking.",
    "3.1 Keep your rook active to control open lines and ranks.",
    "2.5 Use the rook to protect your pieces while launching a counterattack.",
    "2.9 Consider placing the rook in a strong defensive position to support your king.",
    "2.7 Keep the rook centralized to control more of the board.",
    "2.4 Use the rook in coordination with other pieces for a checkmate threat.",
];

const KNIGHT_HINTS: [&str; 15] = [
    "3.2 Move the knight to fork two opponent pieces.",
    "2.6 Place the knight on a central square for more control.",
    "2.3 Consider moving the knight to protect other pieces.",
    "2.8 Position your knight to control the center of the board.",
    "2.9 Place the knight on a square where it can attack key squares.",
    "2.4 Keep the knight close to the king for extra defense.",
    "3.1 Move the knight to attack undefended pieces.",
    "2.7 Position the knight to control key diagonal squares.",
    "2.5 Use the knight to protect pawns in the center.",
    "2.2 Consider a knight jump to create a tactical threat.",
    "2.9 Place the knight where it can threaten your opponent's back rank.",
    "2.6 Move the knight to a position where it can attack your opponent's pawns.",
    "3.0 Use the knight to create a double attack on your opponent's pieces.",
    "2.8 Consider a knight maneuver to create a check or fork.",
    "2.4 Place the knight in an advanced position to gain more space.",
];

const BISHOP_HINTS: [&str; 15] = [
    "3.1 Consider moving the bishop to control long diagonals.",
    "2.7 Place the bishop on an open diagonal for flexibility.",
    "2.5 Move the bishop to pin an opponent's knight.",
    "2.9 Use the bishop to control the center from a distance.",
    "2.4 Place the bishop on a light square to support your pawn structure.",
    "2.8 Place the bishop where it can attack the opponent's pawns.",
    "2.6 Use the bishop to defend against opponent's piece attacks.",
    "2.3 Position your bishop to support a kingside attack.",
    "3.0 Move the bishop to an open diagonal to control more space.",
    "2.7 Consider the bishop as a long-term defender in the endgame.",
    "2.9 Use the bishop to restrict your opponent's king's mobility.",
    "2.5 Move the bishop to a position where it can pin your opponent's pieces.",
    "2.8 Position the bishop to control multiple squares on the board.",
    "2.4 Consider using the bishop to control both sides of the board.",
    "2.6 Place the bishop where it can protect your pawns from attacks.",
];

const QUEEN_HINTS: [&str; 15] = [
    "3.2 Move the queen to support your other pieces.",
    "2.1 Avoid bringing the queen out too early in the game.",
    "2.7 Consider placing the queen on an open diagonal.",
    "2.9 Position the queen to control both the center and the flank.",
    "3.0 Use the queen to threaten the opponent's back rank.",
    "2.5 Coordinate your queen with the rooks to increase pressure.",
    "2.8 Move the queen to help create a checkmate threat.",
    "2.3 Position the queen to support a pawn promotion.",
    "2.6 Use the queen to restrict the opponent's king's mobility.",
    "3.1 Keep the queen active in the center to control key squares.",
    "2.4 Position the queen to support a kingside attack.",
    "2.7 Move the queen to a square where it can defend your pawns.",
    "2.9 Consider placing the queen on a long-range diagonal to control space.",
    "2.5 Use the queen to create a tactical threat with your knights or rooks.",
    "3.0 Keep the queen near the center to maximize its influence.",
];

const KING_HINTS: [&str; 15] = [
    "2.8 Castle early to secure your king.",
    "3.1 Move the king to safety during the endgame.",
    "2.5 Keep the king shielded by pawns.",
    "2.9 In the endgame, activate the king to support pawn advancement.",
    "2.7 Use the king to support your pieces in the late game.",
    "2.6 Move the king toward the center in the endgame for more mobility.",
    "2.3 Position the king away from the edge to avoid attacks.",
    "2.8 Consider a king maneuver to help control the center.",
    "3.0 Ensure the king is well defended as the opponent launches an attack.",
    "2.4 Place the king in a safe, defended position during the middle game.",
    "2.7 Move the king to a corner where it can be protected by pawns.",
    "2.9 Keep the king close to your advanced pawns to support their promotion.",
    "2.5 Avoid placing the king on open ranks to reduce attack vulnerability.",
    "2.8 Consider positioning the king in the center during the late game for more mobility.",
    "2.6 Place the king where it can easily escape if the opponent initiates a checkmate threat.",
];

fn templates(role: Role) -> &'static [&'static str; 15] {
    match role {
        Role::Pawn => &PAWN_HINTS,
        Role::Rook => &ROOK_HINTS,
        Role::Knight => &KNIGHT_HINTS,
        Role::Bishop => &BISHOP_HINTS,
        Role::Queen => &QUEEN_HINTS,
        Role::King => &KING_HINTS,
    }
}

/// Hint source owning the randomness used for decisive evaluations, so
/// runs can be reproduced by seeding.
#[derive(Debug)]
pub struct HintGenerator {
    rng: SmallRng,
}

impl Default for HintGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HintGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Fixed-seed generator for reproducible template selection.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Phrases the search result as advice about the moved piece.
    ///
    /// `moved` is the piece type standing on the chosen move's origin
    /// square. Without a move, or without a piece to talk about, the
    /// fixed no-move line is returned.
    pub fn hint(&mut self, result: &SearchResult, moved: Option<Role>) -> String {
        if result.best_move.is_none() {
            return NO_MOVE_HINT.to_string();
        }
        let Some(role) = moved else {
            return NO_MOVE_HINT.to_string();
        };

        let list = templates(role);
        let template = if result.value.abs() > DECISIVE_VALUE {
            list.choose(&mut self.rng).copied().unwrap_or(list[0])
        } else {
            let bucket = ((result.value + 4.0) / BUCKET_WIDTH).floor() as i64;
            let index = bucket.clamp(0, list.len() as i64 - 1) as usize;
            list[index]
        };

        format!("{template} (Evaluation: {:.2})", result.value)
    }
}
