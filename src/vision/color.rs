//! Piece color classification.
//!
//! Stages are tried in order until one answers. The pixel-mass heuristic
//! handles the clear-cut cells; a model stage can be appended for the
//! rest. A stage that fails is logged and skipped, and when no stage
//! answers the recognizer falls back to a default label.

use image::{Rgb, RgbImage};
use shakmaty::Color;

use super::normalized_input;
use crate::net::{LazyNet, NetError};

/// Pixel side of the color model input.
const MODEL_SIDE: u32 = 224;

/// Value ceiling for a pixel to count toward the black mass.
const BLACK_MAX_VALUE: u8 = 50;
/// Saturation ceiling and value floor for a pixel to count toward the
/// white mass. Both use OpenCV scaling, 0 to 255.
const WHITE_MAX_SATURATION: u8 = 25;
const WHITE_MIN_VALUE: u8 = 200;

/// Mean-intensity midpoint separating dark squares from light ones.
const SHADE_MIDPOINT: f64 = 127.0;

/// One stage of the color cascade.
pub trait ColorOpinion {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(Some(color))` when confident, `Ok(None)` to pass the cell on
    /// to the next stage, `Err` when the stage itself broke.
    fn classify(&mut self, cell: &RgbImage) -> Result<Option<Color>, NetError>;
}

/// Counts black-ish and white-ish pixels and answers only when one mass
/// is at least twice the other. White wins ties, including the all-zero
/// tie of a cell with no pixels in either band.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelMassHeuristic;

impl ColorOpinion for PixelMassHeuristic {
    fn name(&self) -> &'static str {
        "pixel-mass"
    }

    fn classify(&mut self, cell: &RgbImage) -> Result<Option<Color>, NetError> {
        let shade = if mean_intensity(cell) < SHADE_MIDPOINT {
            "dark"
        } else {
            "light"
        };
        let (black_mass, white_mass) = pixel_masses(cell);
        log::trace!("{shade} square cell: black mass {black_mass}, white mass {white_mass}");

        if white_mass >= 2 * black_mass {
            Ok(Some(Color::White))
        } else if black_mass >= 2 * white_mass {
            Ok(Some(Color::Black))
        } else {
            Ok(None)
        }
    }
}

/// Mean of all channel values across the cell.
fn mean_intensity(cell: &RgbImage) -> f64 {
    let sum: u64 = cell.as_raw().iter().map(|&v| u64::from(v)).sum();
    let count = cell.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}

fn pixel_masses(cell: &RgbImage) -> (u32, u32) {
    let mut black = 0;
    let mut white = 0;
    for px in cell.pixels() {
        let (saturation, value) = saturation_value(*px);
        if value <= BLACK_MAX_VALUE {
            black += 1;
        }
        if saturation <= WHITE_MAX_SATURATION && value >= WHITE_MIN_VALUE {
            white += 1;
        }
    }
    (black, white)
}

/// OpenCV-scaled saturation and value channels of one pixel.
fn saturation_value(px: Rgb<u8>) -> (u8, u8) {
    let Rgb([r, g, b]) = px;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let saturation = if max == 0 {
        0
    } else {
        (u32::from(max - min) * 255 / u32::from(max)) as u8
    };
    (saturation, max)
}

/// Model stage: resizes the cell, scales channels into [0, 1] and reads a
/// white-versus-black score against a 0.5 boundary.
#[derive(Debug)]
pub struct NetColorClassifier {
    net: LazyNet,
}

impl NetColorClassifier {
    pub fn new(net: LazyNet) -> Self {
        Self { net }
    }
}

impl ColorOpinion for NetColorClassifier {
    fn name(&self) -> &'static str {
        "color-model"
    }

    fn classify(&mut self, cell: &RgbImage) -> Result<Option<Color>, NetError> {
        let net = self.net.get()?;
        let score = net.forward_scalar(&normalized_input(cell, MODEL_SIDE))?;
        Ok(Some(if score > 0.5 {
            Color::White
        } else {
            Color::Black
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::DenseNet;

    fn flat(side: u32, color: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(side, side, color)
    }

    /// Overwrites the top `rows` rows of the cell.
    fn paint_rows(img: &mut RgbImage, rows: u32, color: Rgb<u8>) {
        for y in 0..rows {
            for x in 0..img.width() {
                img.put_pixel(x, y, color);
            }
        }
    }

    const DARK: Rgb<u8> = Rgb([181, 136, 99]);

    #[test]
    fn saturation_and_value_use_opencv_scaling() {
        assert_eq!(saturation_value(Rgb([255, 255, 255])), (0, 255));
        assert_eq!(saturation_value(Rgb([255, 0, 0])), (255, 255));
        assert_eq!(saturation_value(Rgb([0, 0, 0])), (0, 0));
        assert_eq!(saturation_value(Rgb([200, 100, 100])), (127, 200));
    }

    #[test]
    fn mean_intensity_averages_all_channels() {
        assert_eq!(mean_intensity(&flat(4, Rgb([255, 255, 255]))), 255.0);
        assert_eq!(mean_intensity(&flat(4, Rgb([0, 0, 0]))), 0.0);
        let mut half = flat(4, Rgb([0, 0, 0]));
        paint_rows(&mut half, 2, Rgb([255, 255, 255]));
        assert_eq!(mean_intensity(&half), 127.5);
    }

    #[test]
    fn dominant_white_mass_answers_white() {
        let mut cell = flat(16, DARK);
        paint_rows(&mut cell, 8, Rgb([255, 255, 255]));
        let got = PixelMassHeuristic.classify(&cell).unwrap();
        assert_eq!(got, Some(Color::White));
    }

    #[test]
    fn dominant_black_mass_answers_black() {
        let mut cell = flat(16, DARK);
        paint_rows(&mut cell, 8, Rgb([10, 10, 10]));
        let got = PixelMassHeuristic.classify(&cell).unwrap();
        assert_eq!(got, Some(Color::Black));
    }

    #[test]
    fn white_wins_the_empty_tie() {
        // board texture alone lands in neither band
        let got = PixelMassHeuristic.classify(&flat(16, DARK)).unwrap();
        assert_eq!(got, Some(Color::White));
    }

    #[test]
    fn near_equal_masses_have_no_opinion() {
        let mut cell = flat(16, DARK);
        paint_rows(&mut cell, 10, Rgb([255, 255, 255]));
        paint_rows(&mut cell, 4, Rgb([10, 10, 10]));
        // 96 white-ish vs 64 black-ish, neither doubles the other
        let got = PixelMassHeuristic.classify(&cell).unwrap();
        assert_eq!(got, None);
    }

    /// Net with zero weights whose scalar head always emits `bias`.
    fn biased_net(bias: f32) -> DenseNet {
        let inputs = (MODEL_SIDE * MODEL_SIDE * 3) as usize;
        DenseNet::from_weights(
            inputs,
            1,
            1,
            vec![0.0; inputs],
            vec![0.0],
            vec![0.0],
            vec![bias],
        )
        .unwrap()
    }

    #[test]
    fn model_stage_maps_high_scores_to_white() {
        let mut stage = NetColorClassifier::new(LazyNet::preloaded(biased_net(3.0)));
        let got = stage.classify(&flat(16, DARK)).unwrap();
        assert_eq!(got, Some(Color::White));
    }

    #[test]
    fn model_stage_maps_low_scores_to_black() {
        let mut stage = NetColorClassifier::new(LazyNet::preloaded(biased_net(-3.0)));
        let got = stage.classify(&flat(16, DARK)).unwrap();
        assert_eq!(got, Some(Color::Black));
    }

    #[test]
    fn model_stage_reports_missing_weights() {
        let mut stage = NetColorClassifier::new(LazyNet::new("/nonexistent/color.cvn"));
        assert!(stage.classify(&flat(16, DARK)).is_err());
    }
}
