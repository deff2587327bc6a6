//! Nested clip masks on a single 8-bit stencil buffer.
//!
//! Each pixel's stencil value encodes how many active masks cover it. The
//! encoding alternates with the stack's parity: a depth `d` is stored as `d`
//! while parity is set and as `0xFF - d` otherwise. Non-convex masks are drawn
//! with an even-odd inversion pass, which maps one encoding onto the other, so
//! they flip parity; convex masks commit with a single increment or decrement
//! and keep it. Content between a push and its pop is tested for equality
//! against the encoded full depth.
//!
//! Nesting is capped at [`MAX_MASK_DEPTH`]. From level 128 on the two
//! encodings overlap: depth `k` under one parity is the byte of depth
//! `255 - k` under the other, so pixels left at a shallower level can pass
//! the test of a deep one.

use strata_core::{FillRule, MaskNode, PolygonTessellator, Tessellator, Transform};

use crate::binder::{bind_committed, Binding, GeometryBinder};
use crate::context::{GraphicsContext, StencilFunc, StencilOp};
use crate::error::RenderError;
use crate::mask_stack::{encode, CommittedGeometry, MaskEntry, MaskStack, MAX_MASK_DEPTH};

/// Runs push and pop against an explicit context and mask stack.
#[derive(Debug)]
pub struct StencilMaskManager<T: Tessellator = PolygonTessellator> {
    binder: GeometryBinder<T>,
}

impl Default for StencilMaskManager<PolygonTessellator> {
    fn default() -> Self {
        Self::new(PolygonTessellator::default())
    }
}

impl<T: Tessellator> StencilMaskManager<T> {
    pub fn new(tessellator: T) -> Self {
        Self {
            binder: GeometryBinder::new(tessellator),
        }
    }

    pub fn binder_mut(&mut self) -> &mut GeometryBinder<T> {
        &mut self.binder
    }

    /// Clip everything drawn until the matching [`pop_mask`](Self::pop_mask)
    /// to `mask`, intersected with every mask already on `stack`.
    ///
    /// A mask without geometry is still recorded, issues no stencil draws, and
    /// hides all content until it is popped.
    pub fn push_mask<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        stack: &mut MaskStack,
        mask: &mut MaskNode,
        projection: &Transform,
    ) -> Result<(), RenderError> {
        let level = stack.level();
        if level >= MAX_MASK_DEPTH {
            log::error!(
                "Refusing mask {}: the stencil buffer holds at most {} nested masks",
                mask.id(),
                MAX_MASK_DEPTH
            );
            return Err(RenderError::ResourceExhausted {
                depth: level + 1,
                max: MAX_MASK_DEPTH,
            });
        }

        let binding = self.binder.bind(ctx, mask, projection)?;

        if stack.is_empty() {
            ctx.enable_stencil_test();
            ctx.clear_stencil();
            stack.reset_parity();
        }

        let fill_rule = mask.geometry().fill_rule;
        let committed = match &binding {
            Some(binding) => {
                ctx.color_mask(false);
                commit(ctx, stack, binding, level);
                ctx.color_mask(true);
                ctx.stencil_op(StencilOp::Keep);
                Some(CommittedGeometry {
                    geometry: mask.geometry().clone(),
                    transform: mask.transform,
                    tint: mask.tint,
                    alpha: mask.alpha,
                    projection: *projection,
                })
            }
            None => None,
        };
        ctx.stencil_func(StencilFunc::Equal, stack.stencil_value(level + 1), 0xFF);

        stack.push_entry(MaskEntry {
            id: mask.id(),
            fill_rule,
            committed,
        });
        log::trace!(
            "Pushed {:?} mask {} at level {}, parity {}",
            fill_rule,
            mask.id(),
            level,
            stack.parity()
        );
        Ok(())
    }

    /// Remove the top mask and restore the stencil state of the push before it.
    ///
    /// `mask` must be the mask on top of `stack`. The stencil draws replay the
    /// geometry and uniforms recorded at push time, so reshaping or moving the
    /// mask while it is pushed does not unbalance the buffer.
    pub fn pop_mask<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        stack: &mut MaskStack,
        mask: &MaskNode,
    ) -> Result<(), RenderError> {
        match stack.top().map(|entry| entry.id) {
            None => {
                log::error!("pop_mask for mask {} with no active mask", mask.id());
                return Err(RenderError::StackImbalance);
            }
            Some(top) if top != mask.id() => {
                log::error!("pop_mask for mask {}, but mask {} is on top", mask.id(), top);
                return Err(RenderError::MaskMismatch {
                    expected: top,
                    found: mask.id(),
                });
            }
            Some(_) => {}
        }
        let entry = stack.pop_entry().ok_or(RenderError::StackImbalance)?;
        let level = stack.level();
        let flips_parity = entry.is_stenciled() && entry.fill_rule == FillRule::NonConvex;
        if flips_parity {
            stack.toggle_parity();
        }

        if level == 0 {
            // Last mask: no draws needed, the next push clears the buffer.
            ctx.disable_stencil_test();
            log::trace!("Popped last mask {}, stencil test off", mask.id());
            return Ok(());
        }

        if let Some(committed) = &entry.committed {
            if mask.geometry().dirty {
                log::debug!(
                    "Mask {} changed while pushed; undoing the geometry it was pushed with",
                    mask.id()
                );
            }
            if let Some(binding) = bind_committed(ctx, committed) {
                ctx.color_mask(false);
                uncommit(ctx, stack, &binding, level);
                ctx.color_mask(true);
                ctx.stencil_op(StencilOp::Keep);
            }
        }
        ctx.stencil_func(StencilFunc::Equal, stack.stencil_value(level), 0xFF);

        log::trace!(
            "Popped {:?} mask {} back to level {}, parity {}",
            entry.fill_rule,
            mask.id(),
            level,
            stack.parity()
        );
        Ok(())
    }
}

/// Add the bound mask to the per-pixel depth, moving covered pixels from
/// depth `level` to `level + 1`.
fn commit<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    stack: &mut MaskStack,
    binding: &Binding,
    level: usize,
) {
    let current = stack.stencil_value(level);
    match binding.fill_rule() {
        FillRule::NonConvex => {
            // Odd coverage leaves covered pixels inverted.
            ctx.stencil_func(StencilFunc::Always, 0, 0xFF);
            ctx.stencil_op(StencilOp::Invert);
            binding.draw_polygon_fan(ctx);

            // Inverted pixels that were at `level` now hold `!current`; step
            // them one level deeper in the flipped encoding.
            ctx.stencil_func(StencilFunc::Equal, !current, 0xFF);
            ctx.stencil_op(if stack.parity() {
                StencilOp::Decr
            } else {
                StencilOp::Incr
            });
            binding.draw_bounds(ctx);
            stack.toggle_parity();
        }
        FillRule::Convex => {
            ctx.stencil_func(StencilFunc::Equal, current, 0xFF);
            ctx.stencil_op(if stack.parity() {
                StencilOp::Incr
            } else {
                StencilOp::Decr
            });
            binding.draw_strip(ctx);
        }
    }
}

/// Exact inverse of [`commit`]. Expects parity already restored to its value
/// before the matching push.
fn uncommit<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    stack: &MaskStack,
    binding: &Binding,
    level: usize,
) {
    match binding.fill_rule() {
        FillRule::NonConvex => {
            ctx.stencil_func(
                StencilFunc::Equal,
                encode(level + 1, !stack.parity()),
                0xFF,
            );
            ctx.stencil_op(if stack.parity() {
                StencilOp::Incr
            } else {
                StencilOp::Decr
            });
            binding.draw_bounds(ctx);

            ctx.stencil_func(StencilFunc::Always, 0, 0xFF);
            ctx.stencil_op(StencilOp::Invert);
            binding.draw_polygon_fan(ctx);
        }
        FillRule::Convex => {
            ctx.stencil_func(StencilFunc::Equal, stack.stencil_value(level + 1), 0xFF);
            ctx.stencil_op(if stack.parity() {
                StencilOp::Decr
            } else {
                StencilOp::Incr
            });
            binding.draw_strip(ctx);
        }
    }
}
