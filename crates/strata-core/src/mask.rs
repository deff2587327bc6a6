use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;
use crate::geometry::Shape;
use crate::tessellate::{TessellateError, Tessellator};
use crate::transform::Transform;

/// Unique mask identifier.
pub type MaskId = Uuid;

/// Selects which stencil sub-algorithm a mask uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillRule {
    /// Single strip draw; the outline cannot overlap itself.
    Convex,
    /// Even-odd fan inversion followed by a bounding-quad commit.
    NonConvex,
}

impl FillRule {
    /// Floats per vertex in the tessellated buffer: `[x, y, r, g, b, a]` for
    /// convex geometry, `[x, y]` for non-convex geometry.
    pub fn floats_per_vertex(&self) -> usize {
        match self {
            FillRule::Convex => 6,
            FillRule::NonConvex => 2,
        }
    }
}

/// Tessellated vertex and index buffers for one shape.
///
/// For [`FillRule::NonConvex`] the last four indices address an axis-aligned
/// bounding quad appended after the polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescriptor {
    pub vertex_data: Vec<f32>,
    pub index_data: Vec<u16>,
    pub fill_rule: FillRule,
    /// Uniform fill color of non-convex geometry; convex vertices carry their own.
    pub color: [f32; 3],
    /// Set when the buffers no longer match the shape.
    pub dirty: bool,
}

impl Default for GeometryDescriptor {
    fn default() -> Self {
        Self {
            vertex_data: Vec::new(),
            index_data: Vec::new(),
            fill_rule: FillRule::Convex,
            color: [1.0, 1.0, 1.0],
            dirty: true,
        }
    }
}

impl GeometryDescriptor {
    /// Number of indices in the buffer (quad included).
    pub fn index_count(&self) -> usize {
        self.index_data.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_data.len() / self.fill_rule.floats_per_vertex()
    }

    /// Indices that belong to the polygon itself, excluding the bounding quad.
    pub fn polygon_index_count(&self) -> usize {
        match self.fill_rule {
            FillRule::Convex => self.index_data.len(),
            FillRule::NonConvex => self.index_data.len().saturating_sub(4),
        }
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.index_data.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertex_data.clear();
        self.index_data.clear();
    }
}

/// A scene node that designates mask geometry.
///
/// The node owns its tessellated geometry; the mask stack only borrows it while
/// a push or pop is running. `transform`, `alpha` and `tint` are the owner's
/// world values, read when the geometry is bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskNode {
    id: MaskId,
    shape: Shape,
    fill_color: Color,
    pub transform: Transform,
    pub alpha: f32,
    pub tint: Color,
    geometry: GeometryDescriptor,
}

impl MaskNode {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape: shape.into(),
            fill_color: Color::WHITE,
            transform: Transform::IDENTITY,
            alpha: 1.0,
            tint: Color::WHITE,
            geometry: GeometryDescriptor::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.set_fill_color(color);
        self
    }

    pub fn id(&self) -> MaskId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Replace the outline. The geometry is re-tessellated on next use.
    pub fn set_shape(&mut self, shape: impl Into<Shape>) {
        self.shape = shape.into();
        self.geometry.dirty = true;
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
        self.geometry.dirty = true;
    }

    pub fn geometry(&self) -> &GeometryDescriptor {
        &self.geometry
    }

    /// Mark the geometry stale, e.g. when the node is detached.
    pub fn invalidate(&mut self) {
        self.geometry.dirty = true;
    }

    /// Re-tessellate if dirty. Returns whether tessellation ran.
    pub fn ensure_tessellated(
        &mut self,
        tessellator: &mut dyn Tessellator,
    ) -> Result<bool, TessellateError> {
        if !self.geometry.dirty {
            return Ok(false);
        }
        tessellator.tessellate(&self.shape, self.fill_color, &mut self.geometry)?;
        self.geometry.dirty = false;
        Ok(true)
    }
}
