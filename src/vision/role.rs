//! Piece type classification.

use image::RgbImage;
use shakmaty::Role;

use super::normalized_input;
use crate::net::{LazyNet, NetError};

/// Pixel side of the piece model input.
const MODEL_SIDE: u32 = 85;

/// Output classes in head order, alphabetical by English name.
const CLASSES: [Role; 6] = [
    Role::Bishop,
    Role::King,
    Role::Knight,
    Role::Pawn,
    Role::Queen,
    Role::Rook,
];

/// Six-class piece type classifier.
pub trait RoleClassifier {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn classify(&mut self, cell: &RgbImage) -> Result<Role, NetError>;
}

/// Model-backed classifier over the alphabetical class head.
#[derive(Debug)]
pub struct NetRoleClassifier {
    net: LazyNet,
}

impl NetRoleClassifier {
    pub fn new(net: LazyNet) -> Self {
        Self { net }
    }
}

impl RoleClassifier for NetRoleClassifier {
    fn name(&self) -> &'static str {
        "piece-model"
    }

    fn classify(&mut self, cell: &RgbImage) -> Result<Role, NetError> {
        let net = self.net.get()?;
        let scores = net.forward(&normalized_input(cell, MODEL_SIDE))?;
        if scores.len() != CLASSES.len() {
            return Err(NetError::OutputShape {
                expected: CLASSES.len(),
                got: scores.len(),
            });
        }
        Ok(argmax_class(&scores))
    }
}

/// Class of the highest score; the first index wins ties.
fn argmax_class(scores: &[f32]) -> Role {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    CLASSES[best]
}
