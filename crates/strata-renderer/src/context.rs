use serde::{Deserialize, Serialize};
use strata_core::GeometryDescriptor;

/// Stencil comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StencilFunc {
    Always,
    Equal,
}

/// Write operation applied to the stencil value of a pixel that passes the
/// stencil test. Pixels that fail keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StencilOp {
    Keep,
    /// Increment, clamping at 255.
    Incr,
    /// Decrement, clamping at 0.
    Decr,
    /// Bitwise NOT.
    Invert,
}

impl StencilOp {
    pub fn apply(&self, value: u8) -> u8 {
        match self {
            StencilOp::Keep => value,
            StencilOp::Incr => value.saturating_add(1),
            StencilOp::Decr => value.saturating_sub(1),
            StencilOp::Invert => !value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    TriangleFan,
    TriangleStrip,
}

/// Shader programs the renderer binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Program {
    /// Simple filled shapes with a per-vertex color.
    Primitive,
    /// Position-only geometry colored by a uniform.
    ComplexPrimitive,
}

/// How the bound vertex buffer is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexLayout {
    /// `[x, y]`, 8-byte stride.
    Position,
    /// `[x, y, r, g, b, a]`, 24-byte stride.
    PositionColor,
}

impl VertexLayout {
    pub fn stride(&self) -> usize {
        match self {
            VertexLayout::Position => 2 * 4,
            VertexLayout::PositionColor => 6 * 4,
        }
    }
}

/// Uniform values uploaded with a program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uniforms {
    /// Column-major world transform of the owner.
    pub translation: [f32; 9],
    /// Column-major projection from surface pixels to clip space.
    pub projection: [f32; 9],
    pub tint: [f32; 3],
    pub alpha: f32,
    /// Fill color, only used by [`Program::ComplexPrimitive`].
    pub color: Option<[f32; 3]>,
}

/// Identifies a render target of a context. Each target has its own color
/// and stencil buffers.
pub type TargetId = u32;

/// The target a context draws to until another one is bound.
pub const SCREEN_TARGET: TargetId = 0;

/// Draw and stencil primitives of a drawing surface.
///
/// Every call mutates ambient state: a bound program or buffer does not survive
/// another caller's bind.
pub trait GraphicsContext {
    fn enable_stencil_test(&mut self);
    fn disable_stencil_test(&mut self);
    /// Clear every stencil value to 0.
    fn clear_stencil(&mut self);
    fn stencil_func(&mut self, func: StencilFunc, reference: u8, mask: u8);
    fn stencil_op(&mut self, op: StencilOp);
    fn color_mask(&mut self, enabled: bool);
    fn clear_color(&mut self, rgba: [f32; 4]);
    fn use_program(&mut self, program: Program, uniforms: &Uniforms);
    fn bind_geometry(&mut self, geometry: &GeometryDescriptor, layout: VertexLayout);
    /// Indexed draw over `count` indices starting at index `offset`.
    fn draw_elements(&mut self, topology: Topology, count: usize, offset: usize);
    /// Reallocate the buffers of every target. Their contents are lost.
    fn resize(&mut self, width: u32, height: u32);
    /// Send later clears and draws to `target`, allocating its buffers on
    /// first use.
    fn bind_target(&mut self, target: TargetId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stencil_ops_clamp() {
        assert_eq!(StencilOp::Incr.apply(255), 255);
        assert_eq!(StencilOp::Decr.apply(0), 0);
        assert_eq!(StencilOp::Incr.apply(3), 4);
        assert_eq!(StencilOp::Invert.apply(0), 255);
        assert_eq!(StencilOp::Invert.apply(7), 248);
        assert_eq!(StencilOp::Keep.apply(9), 9);
    }

    #[test]
    fn test_layout_strides() {
        assert_eq!(VertexLayout::Position.stride(), 8);
        assert_eq!(VertexLayout::PositionColor.stride(), 24);
    }
}
