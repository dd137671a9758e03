//! Terrain sampling over the arena height field.
//!
//! The height field is a square grid of samples. Heights between samples are
//! bilinearly interpolated and the slope is the gradient of that surface,
//! estimated with central differences half a cell wide. Positions outside
//! the grid sample the nearest edge.

use skirmish_types::{HeightField, Vec2};

use crate::error::WorldError;

/// Validated, queryable terrain.
#[derive(Debug, Clone)]
pub struct Terrain {
    field: HeightField,
    /// Samples per side as an index bound.
    side: usize,
    /// Distance between adjacent samples.
    spacing: f64,
}

impl Terrain {
    /// Validate a height field and wrap it for sampling.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the resolution is below two, the sample count
    /// does not match `resolution * resolution`, or any value is non-finite.
    pub fn new(field: HeightField) -> Result<Self, WorldError> {
        if field.resolution < 2 {
            return Err(WorldError::HeightFieldResolution(field.resolution));
        }
        let side = usize::try_from(field.resolution).map_err(|_e| WorldError::ArithmeticOverflow)?;
        let expected = side.checked_mul(side).ok_or(WorldError::ArithmeticOverflow)?;
        if field.heights.len() != expected {
            return Err(WorldError::HeightFieldSize {
                resolution: field.resolution,
                expected,
                actual: field.heights.len(),
            });
        }
        if !field.size.is_finite() || field.size <= 0.0 || !field.origin.is_finite() {
            return Err(WorldError::NonFinite { field: "height_field.size" });
        }
        if field.heights.iter().any(|h| !h.is_finite()) {
            return Err(WorldError::NonFinite { field: "height_field.heights" });
        }
        let spacing = field.size / f64::from(field.resolution.saturating_sub(1));
        Ok(Self { field, side, spacing })
    }

    /// The underlying height field.
    pub const fn field(&self) -> &HeightField {
        &self.field
    }

    /// Interpolated height at `p`.
    pub fn height_at(&self, p: Vec2) -> f64 {
        let (i0, fx) = self.cell_coord(p.x - self.field.origin.x);
        let (j0, fy) = self.cell_coord(p.y - self.field.origin.y);
        let i1 = i0.saturating_add(1).min(self.side.saturating_sub(1));
        let j1 = j0.saturating_add(1).min(self.side.saturating_sub(1));

        let h00 = self.sample(i0, j0);
        let h10 = self.sample(i1, j0);
        let h01 = self.sample(i0, j1);
        let h11 = self.sample(i1, j1);

        let bottom = (h10 - h00).mul_add(fx, h00);
        let top = (h11 - h01).mul_add(fx, h01);
        (top - bottom).mul_add(fy, bottom)
    }

    /// Height gradient at `p` (rise per unit distance along x and y).
    pub fn gradient_at(&self, p: Vec2) -> Vec2 {
        let h = self.spacing * 0.5;
        let dx = self.height_at(p + Vec2::new(h, 0.0)) - self.height_at(p - Vec2::new(h, 0.0));
        let dy = self.height_at(p + Vec2::new(0.0, h)) - self.height_at(p - Vec2::new(0.0, h));
        let span = 2.0 * h;
        Vec2::new(dx / span, dy / span)
    }

    /// Steepness at `p` (magnitude of the gradient).
    pub fn slope_at(&self, p: Vec2) -> f64 {
        self.gradient_at(p).length()
    }

    /// Slope along a unit direction: positive uphill, negative downhill.
    pub fn directional_slope(&self, p: Vec2, direction: Vec2) -> f64 {
        self.gradient_at(p).dot(direction)
    }

    /// Split a world-space offset into a grid index and fractional part.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cell_coord(&self, offset: f64) -> (usize, f64) {
        let last = self.side.saturating_sub(1);
        let g = (offset / self.spacing).max(0.0);
        if !g.is_finite() {
            return (0, 0.0);
        }
        // `g` is non-negative and finite here; the float-to-int cast saturates.
        let cell = (g.floor() as usize).min(last);
        if cell >= last {
            return (last.saturating_sub(1), 1.0);
        }
        (cell, g - g.floor())
    }

    fn sample(&self, i: usize, j: usize) -> f64 {
        j.checked_mul(self.side)
            .and_then(|row| row.checked_add(i))
            .and_then(|idx| self.field.heights.get(idx))
            .copied()
            .unwrap_or(0.0)
    }
}
