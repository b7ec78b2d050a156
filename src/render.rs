//! Renders a chosen move back onto the board image.
//!
//! The piece is cut out of its origin cell with an Otsu-thresholded
//! mask, the origin is repainted as an empty square, and the cutout is
//! blended half-and-half over a fresh fill on the destination square.

use image::{GrayImage, Rgb, RgbImage, imageops};
use shakmaty::{CastlingSide, Color, Move, Rank, Square};

use crate::vision::grid::cell_origin;

/// Fill colors for repainted squares.
pub const LIGHT_SQUARE: Rgb<u8> = Rgb([240, 217, 181]);
pub const DARK_SQUARE: Rgb<u8> = Rgb([181, 136, 99]);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("board image is {width}x{height}, expected square dimensions divisible by 8")]
    BadDimensions { width: u32, height: u32 },
    #[error("move has no origin square to render")]
    NoOrigin,
}

/// Fill color for a square when repainted as empty. Parity counts from
/// a1, which gets the light fill.
#[inline]
pub fn square_fill(square: Square) -> Rgb<u8> {
    if (u32::from(square.file()) + u32::from(square.rank())) % 2 == 0 {
        LIGHT_SQUARE
    } else {
        DARK_SQUARE
    }
}

/// Applies the move onto a copy of the board image.
///
/// Castling is drawn at the king's arrival square. The input image must
/// be the same shape the recognizer accepts.
pub fn apply_move(img: &RgbImage, mv: &Move) -> Result<RgbImage, RenderError> {
    let (width, height) = img.dimensions();
    if width != height || height == 0 || height % 8 != 0 {
        return Err(RenderError::BadDimensions { width, height });
    }
    let cell = height / 8;

    let from = mv.from().ok_or(RenderError::NoOrigin)?;
    let to = destination(mv);

    let piece = extract_piece(&cell_image(img, from, cell));
    let blended = blend_half(&solid_cell(cell, square_fill(to)), &piece);

    let mut out = img.clone();
    put_cell(&mut out, to, cell, &blended);
    put_cell(&mut out, from, cell, &solid_cell(cell, square_fill(from)));
    Ok(out)
}

/// Square the moved piece ends up on. A castling move names the rook's
/// square, so the king's arrival square is computed instead.
fn destination(mv: &Move) -> Square {
    match mv {
        Move::Castle { king, rook } => {
            let side = if rook.file() > king.file() {
                CastlingSide::KingSide
            } else {
                CastlingSide::QueenSide
            };
            let color = if king.rank() == Rank::First {
                Color::White
            } else {
                Color::Black
            };
            side.king_to(color)
        }
        _ => mv.to(),
    }
}

fn cell_image(img: &RgbImage, square: Square, cell: u32) -> RgbImage {
    let (x, y) = cell_origin(square, cell);
    imageops::crop_imm(img, x, y, cell, cell).to_image()
}

fn put_cell(img: &mut RgbImage, square: Square, cell: u32, tile: &RgbImage) {
    let (x, y) = cell_origin(square, cell);
    imageops::replace(img, tile, i64::from(x), i64::from(y));
}

fn solid_cell(cell: u32, fill: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(cell, cell, fill)
}

/// 50/50 blend with round-half-up.
fn blend_half(a: &RgbImage, b: &RgbImage) -> RgbImage {
    RgbImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y);
        let pb = b.get_pixel(x, y);
        Rgb([
            mid(pa[0], pb[0]),
            mid(pa[1], pb[1]),
            mid(pa[2], pb[2]),
        ])
    })
}

#[inline]
fn mid(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) / 2) as u8
}

/// Cuts the piece out of its cell: darker pixels under an Otsu split
/// become the foreground mask, interior holes are filled, and the rest
/// of the cell goes black. A cell with no foreground at all is returned
/// unchanged.
fn extract_piece(cell: &RgbImage) -> RgbImage {
    let gray = imageops::grayscale(cell);
    let threshold = otsu_threshold(&gray);
    let mut mask: Vec<bool> = gray.pixels().map(|p| p[0] <= threshold).collect();
    if !mask.iter().any(|&m| m) {
        return cell.clone();
    }
    fill_holes(&mut mask, gray.width(), gray.height());

    let width = cell.width();
    RgbImage::from_fn(width, cell.height(), |x, y| {
        if mask[(y * width + x) as usize] {
            *cell.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Threshold maximizing the between-class variance of the histogram.
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for p in gray.pixels() {
        histogram[usize::from(p[0])] += 1;
    }
    let total = (gray.width() * gray.height()) as f64;
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &n)| v as f64 * f64::from(n))
        .sum();

    let mut sum_bg = 0.0;
    let mut weight_bg = 0.0;
    let mut best = 0u8;
    let mut best_variance = -1.0f64;
    for t in 0..256usize {
        weight_bg += f64::from(histogram[t]);
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += t as f64 * f64::from(histogram[t]);
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if variance > best_variance {
            best_variance = variance;
            best = t as u8;
        }
    }
    best
}

/// Marks enclosed background regions as foreground. Background reachable
/// from the image border stays background.
fn fill_holes(mask: &mut [bool], width: u32, height: u32) {
    let idx = |x: u32, y: u32| (y * width + x) as usize;
    let mut outside = vec![false; mask.len()];
    let mut stack = Vec::new();

    let seed = |x: u32, y: u32, outside: &mut Vec<bool>, stack: &mut Vec<(u32, u32)>| {
        let i = idx(x, y);
        if !mask[i] && !outside[i] {
            outside[i] = true;
            stack.push((x, y));
        }
    };
    for x in 0..width {
        seed(x, 0, &mut outside, &mut stack);
        seed(x, height - 1, &mut outside, &mut stack);
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut stack);
        seed(width - 1, y, &mut outside, &mut stack);
    }

    while let Some((x, y)) = stack.pop() {
        let mut visit = |nx: u32, ny: u32| {
            let i = idx(nx, ny);
            if !mask[i] && !outside[i] {
                outside[i] = true;
                stack.push((nx, ny));
            }
        };
        if x > 0 {
            visit(x - 1, y);
        }
        if x + 1 < width {
            visit(x + 1, y);
        }
        if y > 0 {
            visit(x, y - 1);
        }
        if y + 1 < height {
            visit(x, y + 1);
        }
    }

    for i in 0..mask.len() {
        if !mask[i] && !outside[i] {
            mask[i] = true;
        }
    }
}
