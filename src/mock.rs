//! Mock classifiers for tests and offline runs.

use std::collections::VecDeque;

use image::RgbImage;
use shakmaty::{Color, Role};

use crate::net::NetError;
use crate::vision::color::ColorOpinion;
use crate::vision::role::RoleClassifier;

/// Color stage that always answers with the same color.
#[derive(Debug, Clone, Copy)]
pub struct FixedColor(pub Color);

impl ColorOpinion for FixedColor {
    fn name(&self) -> &'static str {
        "fixed-color"
    }

    fn classify(&mut self, _cell: &RgbImage) -> Result<Option<Color>, NetError> {
        Ok(Some(self.0))
    }
}

/// Color stage that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpinion;

impl ColorOpinion for NoOpinion {
    fn name(&self) -> &'static str {
        "no-opinion"
    }

    fn classify(&mut self, _cell: &RgbImage) -> Result<Option<Color>, NetError> {
        Ok(None)
    }
}

/// Color stage that fails on every call, like one whose weights are
/// missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableColor;

impl ColorOpinion for UnavailableColor {
    fn name(&self) -> &'static str {
        "unavailable-color"
    }

    fn classify(&mut self, _cell: &RgbImage) -> Result<Option<Color>, NetError> {
        Err(NetError::Unavailable)
    }
}

/// Piece classifier that always answers with the same type.
#[derive(Debug, Clone, Copy)]
pub struct FixedRole(pub Role);

impl RoleClassifier for FixedRole {
    fn name(&self) -> &'static str {
        "fixed-role"
    }

    fn classify(&mut self, _cell: &RgbImage) -> Result<Role, NetError> {
        Ok(self.0)
    }
}

/// Piece classifier answering from a queue, in recognition scan order.
/// An exhausted queue fails like a missing model.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoles {
    queue: VecDeque<Role>,
}

impl ScriptedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            queue: roles.into_iter().collect(),
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl RoleClassifier for ScriptedRoles {
    fn name(&self) -> &'static str {
        "scripted-roles"
    }

    fn classify(&mut self, _cell: &RgbImage) -> Result<Role, NetError> {
        self.queue.pop_front().ok_or(NetError::Unavailable)
    }
}

/// Piece classifier that fails on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRole;

impl RoleClassifier for UnavailableRole {
    fn name(&self) -> &'static str {
        "unavailable-role"
    }

    fn classify(&mut self, _cell: &RgbImage) -> Result<Role, NetError> {
        Err(NetError::Unavailable)
    }
}
