use strata_core::{Color, FillRule, GeometryDescriptor, MaskNode, Tessellator, Transform};

use crate::context::{GraphicsContext, Program, Topology, Uniforms, VertexLayout};
use crate::error::RenderError;
use crate::mask_stack::CommittedGeometry;

/// Proof that a program and geometry buffers are bound on a context.
///
/// Only valid until the next bind on the same context.
#[derive(Debug)]
#[must_use]
pub struct Binding {
    fill_rule: FillRule,
    index_count: usize,
    polygon_index_count: usize,
}

impl Binding {
    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// The whole buffer as a triangle strip.
    pub fn draw_strip<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.draw_elements(Topology::TriangleStrip, self.index_count, 0);
    }

    /// The polygon's own indices as a triangle fan, bounding quad excluded.
    pub fn draw_polygon_fan<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.draw_elements(Topology::TriangleFan, self.polygon_index_count, 0);
    }

    /// The trailing 4-index bounding quad of non-convex geometry.
    pub fn draw_bounds<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        debug_assert_eq!(self.fill_rule, FillRule::NonConvex);
        ctx.draw_elements(Topology::TriangleFan, 4, self.polygon_index_count);
    }
}

/// Resolves mask geometry and shader parameters against a graphics context
/// right before stencil draws.
#[derive(Debug)]
pub struct GeometryBinder<T: Tessellator> {
    tessellator: T,
}

impl<T: Tessellator> GeometryBinder<T> {
    pub fn new(tessellator: T) -> Self {
        Self { tessellator }
    }

    pub fn tessellator_mut(&mut self) -> &mut T {
        &mut self.tessellator
    }

    /// Bind `mask`'s program, uniforms and buffers, re-tessellating first if
    /// the shape changed.
    ///
    /// Returns `Ok(None)` when the mask has no tessellated data; the caller must
    /// then skip its draws entirely.
    pub fn bind<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        mask: &mut MaskNode,
        projection: &Transform,
    ) -> Result<Option<Binding>, RenderError> {
        if mask.ensure_tessellated(&mut self.tessellator)? {
            log::trace!("Re-tessellated mask {}", mask.id());
        }

        let binding = bind_geometry(
            ctx,
            mask.geometry(),
            &mask.transform,
            mask.tint,
            mask.alpha,
            projection,
        );
        if binding.is_none() {
            log::debug!("Mask {} has no geometry, skipping stencil draws", mask.id());
        }
        Ok(binding)
    }
}

/// Bind the buffers and uniforms a push recorded, as they were at the push.
pub(crate) fn bind_committed<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    committed: &CommittedGeometry,
) -> Option<Binding> {
    bind_geometry(
        ctx,
        &committed.geometry,
        &committed.transform,
        committed.tint,
        committed.alpha,
        &committed.projection,
    )
}

/// Select the program for `geometry`'s fill rule, upload uniforms and bind
/// buffers. `None` for empty geometry, in which case nothing is bound.
pub(crate) fn bind_geometry<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    geometry: &GeometryDescriptor,
    transform: &Transform,
    tint: Color,
    alpha: f32,
    projection: &Transform,
) -> Option<Binding> {
    if geometry.is_empty() {
        return None;
    }

    let (program, layout, color) = match geometry.fill_rule {
        FillRule::NonConvex => (
            Program::ComplexPrimitive,
            VertexLayout::Position,
            Some(geometry.color),
        ),
        FillRule::Convex => (Program::Primitive, VertexLayout::PositionColor, None),
    };

    let uniforms = Uniforms {
        translation: transform.to_mat3(),
        projection: projection.to_mat3(),
        tint: tint.to_rgb(),
        alpha,
        color,
    };
    ctx.use_program(program, &uniforms);
    ctx.bind_geometry(geometry, layout);

    Some(Binding {
        fill_rule: geometry.fill_rule,
        index_count: geometry.index_count(),
        polygon_index_count: geometry.polygon_index_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GlCall, RecordingContext};
    use strata_core::{Point, Polygon, PolygonTessellator, Rect};

    fn l_shape() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 4.0),
            Point::new(0.0, 4.0),
        ])
    }

    #[test]
    fn test_convex_binds_primitive_program() {
        let mut ctx = RecordingContext::new();
        let mut binder = GeometryBinder::new(PolygonTessellator::default());
        let mut mask = MaskNode::new(Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_alpha(0.5)
            .with_tint(Color::from_hex(0x00FF00));
        let binding = binder
            .bind(&mut ctx, &mut mask, &Transform::IDENTITY)
            .unwrap()
            .unwrap();
        assert_eq!(binding.fill_rule(), FillRule::Convex);
        assert_eq!(binding.index_count(), 4);

        match &ctx.calls()[0] {
            GlCall::UseProgram { program, uniforms } => {
                assert_eq!(*program, Program::Primitive);
                assert_eq!(uniforms.alpha, 0.5);
                assert_eq!(uniforms.tint, [0.0, 1.0, 0.0]);
                assert!(uniforms.color.is_none());
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(
            ctx.calls()[1],
            GlCall::BindGeometry {
                layout: VertexLayout::PositionColor,
                vertices: 4,
                indices: 4,
            }
        );
    }

    #[test]
    fn test_non_convex_binds_complex_program_with_color() {
        let mut ctx = RecordingContext::new();
        let mut binder = GeometryBinder::new(PolygonTessellator::default());
        let mut mask = MaskNode::new(l_shape()).with_fill_color(Color::from_hex(0xFF0000));
        let binding = binder
            .bind(&mut ctx, &mut mask, &Transform::IDENTITY)
            .unwrap()
            .unwrap();
        assert_eq!(binding.fill_rule(), FillRule::NonConvex);

        match &ctx.calls()[0] {
            GlCall::UseProgram { program, uniforms } => {
                assert_eq!(*program, Program::ComplexPrimitive);
                assert_eq!(uniforms.color, Some([1.0, 0.0, 0.0]));
            }
            other => panic!("unexpected call {other:?}"),
        }

        binding.draw_polygon_fan(&mut ctx);
        binding.draw_bounds(&mut ctx);
        let draws = ctx.draw_calls();
        assert_eq!(draws[0], (Topology::TriangleFan, 6, 0));
        assert_eq!(draws[1], (Topology::TriangleFan, 4, 6));
    }

    #[test]
    fn test_empty_geometry_binds_nothing() {
        let mut ctx = RecordingContext::new();
        let mut binder = GeometryBinder::new(PolygonTessellator::default());
        let mut mask = MaskNode::new(Polygon::new(vec![Point::new(0.0, 0.0)]));
        let binding = binder
            .bind(&mut ctx, &mut mask, &Transform::IDENTITY)
            .unwrap();
        assert!(binding.is_none());
        assert!(ctx.calls().is_empty());
    }

    #[test]
    fn test_bind_retessellates_changed_shape() {
        let mut ctx = RecordingContext::new();
        let mut binder = GeometryBinder::new(PolygonTessellator::default());
        let mut mask = MaskNode::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let _ = binder.bind(&mut ctx, &mut mask, &Transform::IDENTITY).unwrap();
        mask.set_shape(l_shape());

        let binding = binder
            .bind(&mut ctx, &mut mask, &Transform::IDENTITY)
            .unwrap()
            .unwrap();
        assert_eq!(binding.fill_rule(), FillRule::NonConvex);
        assert!(!mask.geometry().dirty);
    }

    #[test]
    fn test_bind_committed_uses_recorded_state() {
        let mut ctx = RecordingContext::new();
        let mut geometry = GeometryDescriptor::default();
        PolygonTessellator::default()
            .tessellate(&l_shape().into(), Color::WHITE, &mut geometry)
            .unwrap();
        let committed = CommittedGeometry {
            geometry,
            transform: Transform::translate(5.0, 0.0),
            tint: Color::WHITE,
            alpha: 0.25,
            projection: Transform::IDENTITY,
        };

        let binding = bind_committed(&mut ctx, &committed).unwrap();
        assert_eq!(binding.fill_rule(), FillRule::NonConvex);
        match &ctx.calls()[0] {
            GlCall::UseProgram { uniforms, .. } => {
                assert_eq!(uniforms.alpha, 0.25);
                assert_eq!(uniforms.translation[6], 5.0);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }
}
