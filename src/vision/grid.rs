//! Cuts a board image into its 64 square cells.

use image::RgbImage;
use image::imageops;
use shakmaty::{File, Rank, Square};

use super::VisionError;

/// Cells per board side.
const GRID: u32 = 8;

/// One square cut out of the full board image.
#[derive(Debug, Clone)]
pub struct Cell {
    pub square: Square,
    pub pixels: RgbImage,
}

/// Pixel origin of a square's cell, for a given cell side length.
///
/// Rank 8 is the top image row and file a the left column, so a8 maps to
/// the origin and h1 to the bottom right cell.
#[inline]
pub(crate) fn cell_origin(square: Square, cell: u32) -> (u32, u32) {
    let x = u32::from(square.file()) * cell;
    let y = (7 - u32::from(square.rank())) * cell;
    (x, y)
}

/// Splits the image into cells, top row first, left to right within a row.
///
/// The image must be square with a side divisible by 8; anything else is
/// rejected before any pixel work happens.
pub fn split_cells(img: &RgbImage) -> Result<Vec<Cell>, VisionError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(VisionError::EmptyImage);
    }
    if width != height {
        return Err(VisionError::NotSquare { width, height });
    }
    if height % GRID != 0 {
        return Err(VisionError::NotDivisible { side: height });
    }
    let cell = height / GRID;

    let mut cells = Vec::with_capacity((GRID * GRID) as usize);
    for row in 0..GRID {
        for col in 0..GRID {
            let square = Square::from_coords(File::new(col), Rank::new(7 - row));
            let pixels = imageops::crop_imm(img, col * cell, row * cell, cell, cell).to_image();
            cells.push(Cell { square, pixels });
        }
    }
    Ok(cells)
}
