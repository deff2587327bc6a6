use std::collections::HashMap;

use strata_core::{
    Color, FillRule, GeometryDescriptor, MaskNode, PolygonTessellator, Shape, Tessellator,
    Transform,
};

use crate::binder::bind_geometry;
use crate::context::{GraphicsContext, StencilFunc, StencilOp, TargetId, SCREEN_TARGET};
use crate::error::RenderError;
use crate::mask_stack::MaskStack;
use crate::options::RendererOptions;
use crate::stencil::StencilMaskManager;
use crate::surface::Surface;

/// A rendering session on one drawing surface.
///
/// Owns the graphics context and one mask stack per render target, so no two
/// targets or renderers share stencil state.
#[derive(Debug)]
pub struct Renderer<C: GraphicsContext, T: Tessellator = PolygonTessellator> {
    context: C,
    options: RendererOptions,
    surface: Surface,
    target: TargetId,
    stack: MaskStack,
    /// Stacks of the targets that are not bound.
    parked: HashMap<TargetId, MaskStack>,
    masks: StencilMaskManager<T>,
}

impl<C: GraphicsContext> Renderer<C, PolygonTessellator> {
    pub fn new(context: C, options: RendererOptions) -> Self {
        let tessellator = PolygonTessellator {
            circle_segments: options.circle_segments,
        };
        Self::with_tessellator(context, options, tessellator)
    }
}

impl<C: GraphicsContext, T: Tessellator> Renderer<C, T> {
    pub fn with_tessellator(context: C, options: RendererOptions, tessellator: T) -> Self {
        log::debug!(
            "Renderer created for a {}x{} surface",
            options.width,
            options.height
        );
        Self {
            context,
            surface: Surface::new(options.width, options.height),
            options,
            target: SCREEN_TARGET,
            stack: MaskStack::new(),
            parked: HashMap::new(),
            masks: StencilMaskManager::new(tessellator),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Mask stack of the bound target.
    pub fn mask_stack(&self) -> &MaskStack {
        &self.stack
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Start a frame, clearing to the background when configured to.
    pub fn begin_frame(&mut self) {
        if !self.stack.is_empty() {
            log::warn!(
                "Frame started with {} masks still pushed",
                self.stack.level()
            );
        }
        if self.options.clear_before_render {
            let background = Color::from_hex(self.options.background);
            self.context.clear_color(background.to_f32_array(1.0));
        }
    }

    pub fn push_mask(&mut self, mask: &mut MaskNode) -> Result<(), RenderError> {
        let projection = self.surface.projection();
        self.masks
            .push_mask(&mut self.context, &mut self.stack, mask, &projection)
    }

    pub fn pop_mask(&mut self, mask: &MaskNode) -> Result<(), RenderError> {
        self.masks.pop_mask(&mut self.context, &mut self.stack, mask)
    }

    /// Run `draw` with `mask` pushed, popping it afterwards even when `draw`
    /// fails. An error from `draw` takes precedence over one from the pop.
    pub fn with_mask<R>(
        &mut self,
        mask: &mut MaskNode,
        draw: impl FnOnce(&mut Self) -> Result<R, RenderError>,
    ) -> Result<R, RenderError> {
        self.push_mask(mask)?;
        let result = draw(self);
        let popped = self.pop_mask(mask);
        let value = result?;
        popped?;
        Ok(value)
    }

    /// Fill a convex shape as ordinary content, clipped by the active masks.
    pub fn fill_shape(
        &mut self,
        shape: &Shape,
        transform: &Transform,
        color: Color,
        alpha: f32,
    ) -> Result<(), RenderError> {
        let mut geometry = GeometryDescriptor::default();
        self.masks
            .binder_mut()
            .tessellator_mut()
            .tessellate(shape, color, &mut geometry)?;
        if geometry.fill_rule == FillRule::NonConvex && !geometry.is_empty() {
            return Err(RenderError::ConcaveFill);
        }

        let projection = self.surface.projection();
        if let Some(binding) = bind_geometry(
            &mut self.context,
            &geometry,
            transform,
            Color::WHITE,
            alpha,
            &projection,
        ) {
            binding.draw_strip(&mut self.context);
        }
        Ok(())
    }

    /// Draw to `target` from now on. Its mask stack comes back as it was
    /// left, and the stencil test and reference are set up for it.
    pub fn bind_target(&mut self, target: TargetId) {
        if target == self.target {
            return;
        }
        let incoming = self.parked.remove(&target).unwrap_or_default();
        let outgoing = std::mem::replace(&mut self.stack, incoming);
        self.parked.insert(self.target, outgoing);
        self.target = target;
        self.context.bind_target(target);

        if self.stack.is_empty() {
            self.context.disable_stencil_test();
        } else {
            self.context.enable_stencil_test();
            self.context.stencil_op(StencilOp::Keep);
            self.context.stencil_func(
                StencilFunc::Equal,
                self.stack.stencil_value(self.stack.level()),
                0xFF,
            );
        }
        log::debug!(
            "Bound target {} with {} masks pushed",
            target,
            self.stack.level()
        );
    }

    /// Number of masks pushed across every target.
    fn pushed_masks(&self) -> usize {
        self.stack.level() + self.parked.values().map(MaskStack::level).sum::<usize>()
    }

    fn drop_masks(&mut self) {
        self.stack.clear();
        self.parked.clear();
        self.context.disable_stencil_test();
    }

    /// Reallocate the surface and every target's buffers. Active masks are
    /// dropped because the stencil buffers they lived in are gone.
    pub fn resize(&mut self, width: u32, height: u32) {
        let pushed = self.pushed_masks();
        if pushed > 0 {
            log::warn!(
                "Surface resized with {} masks pushed; dropping them",
                pushed
            );
        }
        self.drop_masks();
        self.context.resize(width, height);
        self.surface.resize(width, height);
        self.options.width = width;
        self.options.height = height;
    }

    /// Tear down the session and hand back the context.
    pub fn destroy(mut self) -> C {
        let pushed = self.pushed_masks();
        if pushed > 0 {
            log::warn!("Renderer destroyed with {} masks pushed", pushed);
        }
        self.drop_masks();
        self.context
    }
}
