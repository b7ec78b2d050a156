//! End-to-end advisor: board image in, recommended move out.

use image::RgbImage;
use shakmaty::{Chess, Color, Position};

use crate::hint::HintGenerator;
use crate::position::{InconsistentPosition, PositionRecord};
use crate::render::{self, RenderError};
use crate::search::{self, SearchResult};
use crate::vision::{BoardRecognizer, RecognizedBoard, VisionError};

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("board recognition failed: {0}")]
    Vision(#[from] VisionError),
    #[error("recognized position was rejected: {0}")]
    Position(#[from] InconsistentPosition),
    #[error("failed to render the move: {0}")]
    Render(#[from] RenderError),
}

/// Everything produced for one analyzed board image.
#[derive(Debug)]
pub struct Advice {
    pub recognition: RecognizedBoard,
    pub fen: String,
    pub result: SearchResult,
    pub hint: String,
    /// Board image with the chosen move drawn in, when there is one.
    pub rendered: Option<RgbImage>,
}

/// Ties recognition, search, hint phrasing and rendering together.
#[derive(Debug)]
pub struct Advisor {
    recognizer: BoardRecognizer,
    hints: HintGenerator,
}

impl Advisor {
    pub fn new(recognizer: BoardRecognizer, hints: HintGenerator) -> Self {
        Self { recognizer, hints }
    }

    /// Reads the board without searching it. The returned FEN still
    /// carries the caller's side to move.
    pub fn recognize(
        &mut self,
        img: &RgbImage,
        turn: Color,
    ) -> Result<(RecognizedBoard, String), AdvisorError> {
        let recognition = self.recognizer.recognize(img)?;
        let fen = PositionRecord::assemble(&recognition.pieces, turn).fen();
        Ok((recognition, fen))
    }

    /// Full flow: recognize the board, search it from `turn`'s point of
    /// view, phrase the hint, and render the chosen move.
    ///
    /// A position with no legal move is not an error: the advice then
    /// carries no move, the fixed no-move hint and no rendered image.
    pub fn advise(
        &mut self,
        img: &RgbImage,
        turn: Color,
        depth: u32,
    ) -> Result<Advice, AdvisorError> {
        let recognition = self.recognizer.recognize(img)?;
        let record = PositionRecord::assemble(&recognition.pieces, turn);
        let fen = record.fen();
        log::info!("position: {fen}");

        let position: Chess = record.to_position()?;
        let result = search::find_best_move(&position, depth, turn);

        let moved = result
            .best_move
            .as_ref()
            .and_then(|mv| mv.from())
            .and_then(|from| position.board().piece_at(from))
            .map(|piece| piece.role);
        let hint = self.hints.hint(&result, moved);

        let rendered = match &result.best_move {
            Some(mv) => Some(render::apply_move(img, mv)?),
            None => None,
        };

        Ok(Advice {
            recognition,
            fen,
            result,
            hint,
            rendered,
        })
    }
}
