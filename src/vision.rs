//! Board recognition pipeline.
//!
//! A board photograph is cut into 64 cells, each cell is tested for
//! occupancy, and occupied cells run through the color cascade and the
//! piece type classifier. Classifier trouble never aborts a scan: the
//! affected label falls back to a default and the fallback is counted,
//! so callers can tell a clean scan from a degraded one.

pub mod color;
pub mod grid;
pub mod occupancy;
pub mod role;

use std::fmt;
use std::path::Path;

use image::{RgbImage, imageops};
use shakmaty::{Color, Role, Square};

use crate::net::LazyNet;
use color::ColorOpinion;
use role::RoleClassifier;

/// Color substituted when no cascade stage answers.
pub const DEFAULT_COLOR: Color = Color::White;
/// Piece type substituted when the type classifier fails.
pub const DEFAULT_ROLE: Role = Role::Pawn;

/// Side of the stored piece thumbnails, matching the piece model input.
const THUMBNAIL_SIDE: u32 = 85;

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("failed to read board image: {0}")]
    Unreadable(#[from] image::ImageError),
    #[error("board image is empty")]
    EmptyImage,
    #[error("board image is {width}x{height}, expected a square image")]
    NotSquare { width: u32, height: u32 },
    #[error("board image side {side} does not divide into 8 cells")]
    NotDivisible { side: u32 },
}

/// Decodes a board image from disk into the 3-channel buffer the
/// pipeline works on.
pub fn load_board_image(path: &Path) -> Result<RgbImage, VisionError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Resizes a cell to `side` and scales channels into [0, 1], row-major
/// with interleaved RGB, the layout both model inputs use.
pub(crate) fn normalized_input(cell: &RgbImage, side: u32) -> Vec<f32> {
    let resized = imageops::resize(cell, side, side, imageops::FilterType::Triangle);
    resized.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect()
}

/// One recognized piece and the evidence it was read from.
#[derive(Debug, Clone)]
pub struct DetectedPiece {
    pub square: Square,
    pub color: Color,
    pub role: Role,
    /// Resized cell image the piece classifier saw.
    pub thumbnail: RgbImage,
}

/// Result of reading one board image.
#[derive(Debug)]
pub struct RecognizedBoard {
    /// Detected pieces in scan order, rank 8 first, file a first.
    pub pieces: Vec<DetectedPiece>,
    /// Labels that fell back to a default because classification failed.
    pub degraded_labels: u32,
}

impl RecognizedBoard {
    /// Piece inventory for one side, in scan order, as `role-square` tags.
    pub fn inventory(&self, color: Color) -> Vec<String> {
        self.pieces
            .iter()
            .filter(|piece| piece.color == color)
            .map(|piece| format!("{}-{}", role_name(piece.role), piece.square))
            .collect()
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

/// Drives the per-cell pipeline over a full board image.
pub struct BoardRecognizer {
    color_stages: Vec<Box<dyn ColorOpinion>>,
    role_classifier: Option<Box<dyn RoleClassifier>>,
}

impl BoardRecognizer {
    pub fn new(
        color_stages: Vec<Box<dyn ColorOpinion>>,
        role_classifier: Option<Box<dyn RoleClassifier>>,
    ) -> Self {
        Self {
            color_stages,
            role_classifier,
        }
    }

    /// Standard line-up: the pixel-mass heuristic first, then whatever
    /// model stages have weights configured.
    pub fn with_models(color_weights: Option<&Path>, role_weights: Option<&Path>) -> Self {
        let mut color_stages: Vec<Box<dyn ColorOpinion>> =
            vec![Box::new(color::PixelMassHeuristic)];
        if let Some(path) = color_weights {
            color_stages.push(Box::new(color::NetColorClassifier::new(LazyNet::new(path))));
        }
        let role_classifier: Option<Box<dyn RoleClassifier>> = role_weights
            .map(|path| {
                Box::new(role::NetRoleClassifier::new(LazyNet::new(path)))
                    as Box<dyn RoleClassifier>
            });
        Self::new(color_stages, role_classifier)
    }

    pub fn recognize(&mut self, img: &RgbImage) -> Result<RecognizedBoard, VisionError> {
        let cells = grid::split_cells(img)?;
        let mut pieces = Vec::new();
        let mut degraded_labels = 0;

        for cell in &cells {
            if !occupancy::is_occupied(&cell.pixels) {
                continue;
            }

            let (color, color_fell_back) = self.classify_color(&cell.pixels);
            degraded_labels += u32::from(color_fell_back);

            let thumbnail = imageops::resize(
                &cell.pixels,
                THUMBNAIL_SIDE,
                THUMBNAIL_SIDE,
                imageops::FilterType::Triangle,
            );
            let (role, role_fell_back) = self.classify_role(&thumbnail);
            degraded_labels += u32::from(role_fell_back);

            log::debug!("{}: {color:?} {role:?}", cell.square);
            pieces.push(DetectedPiece {
                square: cell.square,
                color,
                role,
                thumbnail,
            });
        }

        log::info!(
            "recognized {} pieces, {degraded_labels} degraded labels",
            pieces.len()
        );
        Ok(RecognizedBoard {
            pieces,
            degraded_labels,
        })
    }

    fn classify_color(&mut self, cell: &RgbImage) -> (Color, bool) {
        for stage in &mut self.color_stages {
            match stage.classify(cell) {
                Ok(Some(color)) => return (color, false),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("color stage {} failed: {err}", stage.name());
                }
            }
        }
        log::warn!("no color stage answered, defaulting to {DEFAULT_COLOR:?}");
        (DEFAULT_COLOR, true)
    }

    fn classify_role(&mut self, cell: &RgbImage) -> (Role, bool) {
        let Some(classifier) = self.role_classifier.as_mut() else {
            log::debug!("no piece classifier configured, defaulting to {DEFAULT_ROLE:?}");
            return (DEFAULT_ROLE, true);
        };
        match classifier.classify(cell) {
            Ok(role) => (role, false),
            Err(err) => {
                log::warn!(
                    "piece classifier {} failed: {err}, defaulting to {DEFAULT_ROLE:?}",
                    classifier.name()
                );
                (DEFAULT_ROLE, true)
            }
        }
    }
}

impl fmt::Debug for BoardRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardRecognizer")
            .field(
                "color_stages",
                &self
                    .color_stages
                    .iter()
                    .map(|stage| stage.name())
                    .collect::<Vec<_>>(),
            )
            .field(
                "role_classifier",
                &self.role_classifier.as_ref().map(|c| c.name()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FixedColor, NoOpinion, ScriptedRoles, UnavailableColor, UnavailableRole};
    use image::Rgb;

    const LIGHT: Rgb<u8> = Rgb([240, 217, 181]);
    const DARK: Rgb<u8> = Rgb([181, 136, 99]);
    const CELL: u32 = 96;

    /// Board image with alternating square fills and no pieces.
    fn empty_board() -> RgbImage {
        RgbImage::from_fn(CELL * 8, CELL * 8, |x, y| {
            let col = x / CELL;
            let row = y / CELL;
            if (col + row) % 2 == 0 { LIGHT } else { DARK }
        })
    }

    /// Paints a piece-sized disc onto a square: white fill with a dark
    /// outline for White, solid dark fill for Black.
    fn paint_piece(img: &mut RgbImage, square: Square, color: Color) {
        let (ox, oy) = grid::cell_origin(square, CELL);
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

    #[test]
    fn empty_boards_recognize_to_nothing() {
        let mut recognizer = BoardRecognizer::new(vec![Box::new(NoOpinion)], None);
        let board = recognizer.recognize(&empty_board()).unwrap();
        assert!(board.pieces.is_empty());
        assert_eq!(board.degraded_labels, 0);
    }

    #[test]
    fn occupied_cells_are_classified_in_scan_order() {
        let mut img = empty_board();
        paint_piece(&mut img, Square::E7, Color::Black);
        paint_piece(&mut img, Square::E2, Color::White);

        let roles = ScriptedRoles::new([Role::Queen, Role::Pawn]);
        let mut recognizer =
            BoardRecognizer::new(vec![Box::new(color::PixelMassHeuristic)], Some(Box::new(roles)));
        let board = recognizer.recognize(&img).unwrap();

        assert_eq!(board.degraded_labels, 0);
        let summary: Vec<_> = board
            .pieces
            .iter()
            .map(|p| (p.square, p.color, p.role))
            .collect();
        // e7 is scanned before e2, rank 8 down
        assert_eq!(
            summary,
            vec![
                (Square::E7, Color::Black, Role::Queen),
                (Square::E2, Color::White, Role::Pawn),
            ]
        );
        assert_eq!(board.pieces[0].thumbnail.dimensions(), (85, 85));
    }

    #[test]
    fn cascade_falls_through_to_later_stages() {
        let mut img = empty_board();
        paint_piece(&mut img, Square::C3, Color::White);

        let stages: Vec<Box<dyn ColorOpinion>> = vec![
            Box::new(NoOpinion),
            Box::new(UnavailableColor),
            Box::new(FixedColor(Color::Black)),
        ];
        let mut recognizer =
            BoardRecognizer::new(stages, Some(Box::new(ScriptedRoles::new([Role::Knight]))));
        let board = recognizer.recognize(&img).unwrap();

        assert_eq!(board.pieces.len(), 1);
        assert_eq!(board.pieces[0].color, Color::Black);
        // a later stage answered, so the scan is not degraded
        assert_eq!(board.degraded_labels, 0);
    }

    #[test]
    fn exhausted_classifiers_fall_back_and_count() {
        let mut img = empty_board();
        paint_piece(&mut img, Square::C3, Color::Black);
        paint_piece(&mut img, Square::F6, Color::Black);

        let stages: Vec<Box<dyn ColorOpinion>> = vec![Box::new(UnavailableColor)];
        let mut recognizer = BoardRecognizer::new(stages, Some(Box::new(UnavailableRole)));
        let board = recognizer.recognize(&img).unwrap();

        assert_eq!(board.pieces.len(), 2);
        for piece in &board.pieces {
            assert_eq!(piece.color, DEFAULT_COLOR);
            assert_eq!(piece.role, DEFAULT_ROLE);
        }
        // one color and one role fallback per piece
        assert_eq!(board.degraded_labels, 4);
    }

    #[test]
    fn inventory_groups_by_side() {
        let thumbnail = RgbImage::new(1, 1);
        let board = RecognizedBoard {
            pieces: vec![
                DetectedPiece {
                    square: Square::E8,
                    color: Color::Black,
                    role: Role::King,
                    thumbnail: thumbnail.clone(),
                },
                DetectedPiece {
                    square: Square::E2,
                    color: Color::White,
                    role: Role::Pawn,
                    thumbnail,
                },
            ],
            degraded_labels: 0,
        };
        assert_eq!(board.inventory(Color::White), vec!["pawn-e2"]);
        assert_eq!(board.inventory(Color::Black), vec!["king-e8"]);
    }

    #[test]
    fn malformed_images_abort_the_scan() {
        let mut recognizer = BoardRecognizer::new(vec![Box::new(NoOpinion)], None);
        assert!(matches!(
            recognizer.recognize(&RgbImage::new(100, 50)),
            Err(VisionError::NotSquare { .. })
        ));
    }
}
