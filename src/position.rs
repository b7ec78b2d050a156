//! Symbolic position assembly.
//!
//! Recognition produces piece placements; this module turns them into a
//! position record that serializes to FEN and parses back through the
//! rules engine. The rules engine stays the authority on legality: the
//! record itself never judges whether a placement makes sense.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, Piece};

use crate::vision::DetectedPiece;

/// Castling rights claimed on every serialized position. A photograph
/// cannot reveal castling history, so full rights are asserted and the
/// rules engine drops whatever the placement cannot support.
const CASTLING_FIELD: &str = "KQkq";

/// Position the rules engine refused to accept.
#[derive(Debug, thiserror::Error)]
#[error("assembled position is not playable: {reason}")]
pub struct InconsistentPosition {
    reason: String,
}

/// Piece placement plus the caller-supplied side to move.
///
/// Placement is stored in serialization order: rank 8 first, file a
/// first within a rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    placement: [[Option<Piece>; 8]; 8],
    turn: Color,
}

impl PositionRecord {
    /// Builds the record from detections. The image cannot contain two
    /// pieces on one square, but if detections disagree anyway the last
    /// one wins.
    pub fn assemble(pieces: &[DetectedPiece], turn: Color) -> Self {
        let mut placement = [[None; 8]; 8];
        for piece in pieces {
            let file = u32::from(piece.square.file()) as usize;
            let row = 7 - u32::from(piece.square.rank()) as usize;
            placement[row][file] = Some(Piece {
                color: piece.color,
                role: piece.role,
            });
        }
        Self { placement, turn }
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Serializes the six-field FEN string. Castling rights are always
    /// claimed in full; the en passant square, halfmove clock and move
    /// number are fixed because the image carries no history.
    pub fn fen(&self) -> String {
        let mut placement = String::new();
        for (i, row) in self.placement.iter().enumerate() {
            if i > 0 {
                placement.push('/');
            }
            let mut empty: u8 = 0;
            for piece in row {
                match piece {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            placement.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        placement.push(piece.char());
                    }
                }
            }
            if empty > 0 {
                placement.push((b'0' + empty) as char);
            }
        }
        let turn = match self.turn {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!("{placement} {turn} {CASTLING_FIELD} - 0 1")
    }

    /// Parses the serialized record through the rules engine.
    ///
    /// Claimed castling rights the placement cannot support are dropped
    /// rather than treated as an inconsistency; every other objection
    /// from the rules engine is passed through.
    pub fn to_position(&self) -> Result<Chess, InconsistentPosition> {
        let fen: Fen = self.fen().parse().map_err(inconsistent)?;
        match fen.into_position(CastlingMode::Standard) {
            Ok(position) => Ok(position),
            Err(err) => err.ignore_invalid_castling_rights().map_err(inconsistent),
        }
    }
}

fn inconsistent(err: impl std::fmt::Display) -> InconsistentPosition {
    InconsistentPosition {
        reason: err.to_string(),
    }
}
