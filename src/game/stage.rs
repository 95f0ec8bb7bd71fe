//! Stage data - level layouts loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    bubble::{BubbleType, BubbleTypeRegistry, SpecialKind},
    error::StageError,
    hex::HexCoord,
};

/// One bubble in a stage layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub col: i32,
    pub row: i32,
    /// Missing type means a random bubble.
    #[serde(rename = "type", default)]
    pub bubble_type: Option<BubbleType>,
    #[serde(default)]
    pub special: SpecialKind,
}

impl Placement {
    pub fn new(col: i32, row: i32, bubble_type: BubbleType) -> Self {
        Self {
            col,
            row,
            bubble_type: Some(bubble_type),
            special: SpecialKind::None,
        }
    }

    pub fn random(col: i32, row: i32) -> Self {
        Self {
            col,
            row,
            bubble_type: None,
            special: SpecialKind::None,
        }
    }

    pub fn with_special(mut self, special: SpecialKind) -> Self {
        self.special = special;
        self
    }

    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.col, self.row)
    }
}

/// A level: grid size, starting bubbles and the number of shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageData {
    pub width: i32,
    pub height: i32,
    pub placements: Vec<Placement>,
    pub ammo: u32,
    /// Types the shooter deals and their asset keys. Defaults to every type.
    pub types: Option<BubbleTypeRegistry>,
}

impl Default for StageData {
    fn default() -> Self {
        Self {
            width: 11,
            height: 10,
            placements: Vec::new(),
            ammo: 0,
            types: None,
        }
    }
}

impl StageData {
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StageError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn registry(&self) -> BubbleTypeRegistry {
        self.types.clone().unwrap_or_default()
    }
}
