//! # Strata Core
//!
//! Geometry primitives, affine transforms, colors, and the mask data model
//! shared by the Strata renderer. Mask geometry is tessellated on demand
//! through the [`Tessellator`] trait.

pub mod color;
pub mod geometry;
pub mod mask;
pub mod tessellate;
pub mod transform;

pub use color::Color;
pub use geometry::{BBox, Circle, Point, Polygon, Rect, Shape};
pub use mask::{FillRule, GeometryDescriptor, MaskId, MaskNode};
pub use tessellate::{PolygonTessellator, TessellateError, Tessellator};
pub use transform::Transform;
