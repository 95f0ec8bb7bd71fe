//! Bubbles - the main game objects.
//!
//! A bubble is owned by exactly one place at a time: the shooter slot while it
//! waits to be fired, the flight while it travels, and the grid once it lands.
//! Ownership moves with the value.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hex::HexCoord;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<BubbleType>();
    app.register_type::<SpecialKind>();
}

/// Chance that a random stage bubble carries a special effect.
pub const SPECIAL_BUBBLE_CHANCE: f64 = 0.3;

/// The different bubble types. Equal types match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BubbleType {
    Red,
    Cyan,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BubbleType {
    pub const ALL: [BubbleType; 6] = [
        BubbleType::Red,
        BubbleType::Cyan,
        BubbleType::Yellow,
        BubbleType::Green,
        BubbleType::Blue,
        BubbleType::Purple,
    ];

    /// Pick a type uniformly from `types`, falling back to all types.
    pub fn random_from(types: &[BubbleType], rng: &mut impl Rng) -> Self {
        let pool = if types.is_empty() {
            &Self::ALL[..]
        } else {
            types
        };
        pool[rng.random_range(0..pool.len())]
    }

    /// Default registry key for this type.
    pub fn default_key(self) -> &'static str {
        match self {
            BubbleType::Red => "bubble_red",
            BubbleType::Cyan => "bubble_cyan",
            BubbleType::Yellow => "bubble_yellow",
            BubbleType::Green => "bubble_green",
            BubbleType::Blue => "bubble_blue",
            BubbleType::Purple => "bubble_purple",
        }
    }
}

/// Bonus behavior triggered when a special bubble pops.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    #[default]
    None,
    /// Pops every bubble within a small radius of the trigger.
    AreaClear,
    /// Pops one random visible bubble.
    RandomClear,
}

impl SpecialKind {
    pub const EFFECTS: [SpecialKind; 2] = [SpecialKind::AreaClear, SpecialKind::RandomClear];
}

/// Stable identifier for a bubble across its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct BubbleId(pub u32);

impl std::fmt::Display for BubbleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single bubble instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub id: BubbleId,
    pub bubble_type: BubbleType,
    /// World position. Kept in sync by the grid while landed.
    pub position: Vec2,
    /// Grid cell, `None` while in the shooter or in flight.
    pub coord: Option<HexCoord>,
    pub special: SpecialKind,
    pub marked_for_pop: bool,
}

impl Bubble {
    pub fn is_special(&self) -> bool {
        self.special != SpecialKind::None
    }
}

/// Hands out bubbles with unique ids.
#[derive(Debug, Default, Clone)]
pub struct BubbleSpawner {
    next_id: u32,
}

impl BubbleSpawner {
    pub fn spawn(&mut self, bubble_type: BubbleType, special: SpecialKind, position: Vec2) -> Bubble {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        Bubble {
            id,
            bubble_type,
            position,
            coord: None,
            special,
            marked_for_pop: false,
        }
    }

    /// A plain bubble of a random type, used to load the shooter.
    pub fn random_shooter_bubble(
        &mut self,
        types: &[BubbleType],
        position: Vec2,
        rng: &mut impl Rng,
    ) -> Bubble {
        let bubble_type = BubbleType::random_from(types, rng);
        self.spawn(bubble_type, SpecialKind::None, position)
    }

    /// A random stage bubble that may carry a random special effect.
    pub fn random_stage_bubble(
        &mut self,
        types: &[BubbleType],
        special_chance: f64,
        position: Vec2,
        rng: &mut impl Rng,
    ) -> Bubble {
        let special = if rng.random_bool(special_chance.clamp(0.0, 1.0)) {
            SpecialKind::EFFECTS[rng.random_range(0..SpecialKind::EFFECTS.len())]
        } else {
            SpecialKind::None
        };
        let bubble_type = BubbleType::random_from(types, rng);
        self.spawn(bubble_type, special, position)
    }
}

/// One registry row: a bubble type and its opaque visual/audio key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(rename = "type")]
    pub bubble_type: BubbleType,
    pub key: String,
}

/// Maps bubble types to the keys renderers and audio use to find assets.
///
/// The core never interprets the keys. The registered types also decide which
/// colors the shooter deals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BubbleTypeRegistry {
    entries: Vec<RegistryEntry>,
}

impl BubbleTypeRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            registry.insert(entry.bubble_type, entry.key);
        }
        registry
    }

    /// Register or replace the key for a type.
    pub fn insert(&mut self, bubble_type: BubbleType, key: impl Into<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|e| e.bubble_type == bubble_type) {
            Some(entry) => entry.key = key,
            None => self.entries.push(RegistryEntry { bubble_type, key }),
        }
    }

    pub fn key(&self, bubble_type: BubbleType) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.bubble_type == bubble_type)
            .map(|e| e.key.as_str())
    }

    pub fn types(&self) -> Vec<BubbleType> {
        self.entries.iter().map(|e| e.bubble_type).collect()
    }
}

impl Default for BubbleTypeRegistry {
    fn default() -> Self {
        Self::new(
            BubbleType::ALL
                .iter()
                .map(|&t| RegistryEntry {
                    bubble_type: t,
                    key: t.default_key().to_string(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn spawner_hands_out_unique_ids() {
        let mut spawner = BubbleSpawner::default();
        let a = spawner.spawn(BubbleType::Red, SpecialKind::None, Vec2::ZERO);
        let b = spawner.spawn(BubbleType::Red, SpecialKind::None, Vec2::ZERO);
        assert_ne!(a.id, b.id);
        assert!(a.coord.is_none());
        assert!(!a.marked_for_pop);
    }

    #[test]
    fn shooter_bubbles_use_registered_types_only() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut spawner = BubbleSpawner::default();
        let types = [BubbleType::Cyan, BubbleType::Yellow];
        for _ in 0..50 {
            let bubble = spawner.random_shooter_bubble(&types, Vec2::ZERO, &mut rng);
            assert!(types.contains(&bubble.bubble_type));
            assert!(!bubble.is_special());
        }
    }

    #[test]
    fn stage_bubbles_respect_special_chance() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut spawner = BubbleSpawner::default();
        for _ in 0..20 {
            let plain = spawner.random_stage_bubble(&[], 0.0, Vec2::ZERO, &mut rng);
            assert_eq!(plain.special, SpecialKind::None);
            let special = spawner.random_stage_bubble(&[], 1.0, Vec2::ZERO, &mut rng);
            assert!(special.is_special());
        }
    }

    #[test]
    fn registry_replaces_existing_keys() {
        let mut registry = BubbleTypeRegistry::default();
        assert_eq!(registry.key(BubbleType::Red), Some("bubble_red"));
        registry.insert(BubbleType::Red, "angry");
        assert_eq!(registry.key(BubbleType::Red), Some("angry"));
        assert_eq!(registry.types().len(), BubbleType::ALL.len());
    }

    #[test]
    fn registry_deserializes_from_entry_list() {
        let registry: BubbleTypeRegistry =
            serde_json::from_str(r#"[{"type": "cyan", "key": "c"}, {"type": "red", "key": "r"}]"#)
                .unwrap();
        assert_eq!(registry.types(), vec![BubbleType::Cyan, BubbleType::Red]);
        assert_eq!(registry.key(BubbleType::Yellow), None);
    }
}
