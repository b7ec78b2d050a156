//! Turns a photograph of a chessboard into a symbolic position and a
//! recommended move.
//!
//! The pipeline cuts the image into 64 cells, detects which cells hold
//! a piece, classifies each piece's color and type, assembles the
//! position, searches it with a material minimax, and surfaces the
//! chosen move as text, a phrased hint, or an image with the move drawn
//! in. Classifier trouble degrades a scan instead of aborting it; only
//! a malformed image or a position the rules engine rejects is fatal.

pub mod advisor;
pub mod hint;
pub mod mock;
pub mod net;
pub mod position;
pub mod render;
pub mod search;
pub mod vision;

pub use advisor::{Advice, Advisor, AdvisorError};
pub use hint::HintGenerator;
pub use position::PositionRecord;
pub use search::{SearchResult, find_best_move};
pub use vision::{BoardRecognizer, DetectedPiece, RecognizedBoard};
