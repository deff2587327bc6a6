use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::geometry::{Point, Polygon, Shape};
use crate::mask::{FillRule, GeometryDescriptor};

/// Largest polygon whose vertices, plus the 4 bounding-quad vertices, can be
/// addressed by 16-bit indices.
pub const MAX_POLYGON_VERTICES: usize = u16::MAX as usize + 1 - 4;

#[derive(Error, Debug, PartialEq)]
pub enum TessellateError {
    #[error("Shape has a non-finite coordinate")]
    NonFinite,

    #[error("Polygon has {0} vertices, more than 16-bit indices can address")]
    TooManyVertices(usize),
}

/// Turns a shape into renderable vertex and index buffers.
pub trait Tessellator {
    /// Populate `out` for `shape` filled with `color`. A shape with fewer than
    /// three distinct vertices produces empty buffers, not an error.
    fn tessellate(
        &mut self,
        shape: &Shape,
        color: Color,
        out: &mut GeometryDescriptor,
    ) -> Result<(), TessellateError>;
}

/// Default tessellator: convex outlines become a triangle strip, everything
/// else a triangle fan plus a bounding quad for the stencil even-odd fill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolygonTessellator {
    /// Segments used to flatten circles.
    pub circle_segments: usize,
}

impl Default for PolygonTessellator {
    fn default() -> Self {
        Self { circle_segments: 32 }
    }
}

impl Tessellator for PolygonTessellator {
    fn tessellate(
        &mut self,
        shape: &Shape,
        color: Color,
        out: &mut GeometryDescriptor,
    ) -> Result<(), TessellateError> {
        let mut polygon = shape.to_polygon(self.circle_segments);
        if !polygon.vertices.iter().all(Point::is_finite) {
            return Err(TessellateError::NonFinite);
        }
        if polygon.vertices.len() > 1 && polygon.vertices.first() == polygon.vertices.last() {
            polygon.vertices.pop();
        }
        if polygon.vertex_count() > MAX_POLYGON_VERTICES {
            return Err(TessellateError::TooManyVertices(polygon.vertex_count()));
        }

        out.clear();
        out.color = color.to_rgb();
        out.dirty = false;

        if polygon.vertex_count() < 3 {
            log::debug!(
                "Degenerate shape with {} vertices, geometry left empty",
                polygon.vertex_count()
            );
            return Ok(());
        }

        if polygon.is_convex() {
            out.fill_rule = FillRule::Convex;
            write_strip(&polygon, color, out);
        } else {
            out.fill_rule = FillRule::NonConvex;
            write_fan_with_bounds(&polygon, out);
        }

        log::trace!(
            "Tessellated {:?} shape: {} vertices, {} indices",
            out.fill_rule,
            out.vertex_count(),
            out.index_count()
        );
        Ok(())
    }
}

/// Zig-zag strip order: 0, 1, n-1, 2, n-2, ... which covers a convex outline.
fn write_strip(polygon: &Polygon, color: Color, out: &mut GeometryDescriptor) {
    let [r, g, b] = color.to_rgb();
    for p in &polygon.vertices {
        out.vertex_data
            .extend_from_slice(&[p.x as f32, p.y as f32, r, g, b, 1.0]);
    }

    let n = polygon.vertex_count();
    out.index_data.push(0);
    let (mut lo, mut hi) = (1, n - 1);
    let mut take_low = true;
    while lo <= hi {
        if take_low {
            out.index_data.push(lo as u16);
            lo += 1;
        } else {
            out.index_data.push(hi as u16);
            hi -= 1;
        }
        take_low = !take_low;
    }
}

fn write_fan_with_bounds(polygon: &Polygon, out: &mut GeometryDescriptor) {
    for p in &polygon.vertices {
        out.vertex_data.extend_from_slice(&[p.x as f32, p.y as f32]);
    }
    let n = polygon.vertex_count();
    out.index_data.extend((0..n).map(|i| i as u16));

    if let Some(bounds) = polygon.bbox() {
        for corner in bounds.corners() {
            out.vertex_data
                .extend_from_slice(&[corner.x as f32, corner.y as f32]);
        }
        out.index_data.extend((n..n + 4).map(|i| i as u16));
    }
}
