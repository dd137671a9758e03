//! Arena configuration supplied by the arena generator.
//!
//! The arena is immutable for the duration of a match. The engine never
//! generates terrain itself; it consumes an [`ArenaConfig`] read from disk or
//! handed over by the embedding application.

use serde::{Deserialize, Serialize};

use crate::enums::ObstacleKind;
use crate::geometry::{Bounds, Vec2};
use crate::ids::PerAgent;

/// A circular obstacle on the arena floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre on the floor.
    pub position: Vec2,
    /// Footprint radius (the flattened collision circle).
    pub radius: f64,
    /// Cosmetic category.
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
}

/// A square grid of terrain heights covering the arena.
///
/// `heights` is row-major with `resolution * resolution` samples. Sample
/// `(0, 0)` sits at `origin`; samples are `size / (resolution - 1)` apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightField {
    /// Samples per side.
    pub resolution: u32,
    /// World-space side length covered by the grid.
    pub size: f64,
    /// World-space position of sample `(0, 0)`.
    #[serde(default)]
    pub origin: Vec2,
    /// Row-major height samples.
    pub heights: Vec<f64>,
}

impl HeightField {
    /// A flat field of the given size (two samples per side, all zero).
    pub fn flat(size: f64, origin: Vec2) -> Self {
        Self {
            resolution: 2,
            size,
            origin,
            heights: vec![0.0; 4],
        }
    }
}

/// Immutable arena description for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Opaque biome tag (used only by renderers).
    #[serde(default)]
    pub biome: String,
    /// Circular obstacles.
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Terrain height field.
    pub height_field: HeightField,
    /// Spawn points for alpha and bravo.
    pub spawn_points: PerAgent<Vec2>,
    /// Playable area.
    pub bounds: Bounds,
}

impl ArenaConfig {
    /// An open, flat, square arena with spawn points on the east-west axis.
    ///
    /// Convenient for tests and as a fallback when no arena file is given.
    pub fn open_field(half_extent: f64, spawn_offset: f64) -> Self {
        let bounds = Bounds::square(half_extent);
        Self {
            biome: String::from("plains"),
            obstacles: Vec::new(),
            height_field: HeightField::flat(half_extent * 2.0, bounds.min),
            spawn_points: PerAgent::new(Vec2::new(-spawn_offset, 0.0), Vec2::new(spawn_offset, 0.0)),
            bounds,
        }
    }
}
