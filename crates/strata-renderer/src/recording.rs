use serde::Serialize;
use strata_core::GeometryDescriptor;

use crate::context::{
    GraphicsContext, Program, StencilFunc, StencilOp, TargetId, Topology, Uniforms, VertexLayout,
    SCREEN_TARGET,
};

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GlCall {
    EnableStencilTest,
    DisableStencilTest,
    ClearStencil,
    StencilFunc {
        func: StencilFunc,
        reference: u8,
        mask: u8,
    },
    StencilOp {
        op: StencilOp,
    },
    ColorMask {
        enabled: bool,
    },
    ClearColor {
        rgba: [f32; 4],
    },
    UseProgram {
        program: Program,
        uniforms: Uniforms,
    },
    BindGeometry {
        layout: VertexLayout,
        vertices: usize,
        indices: usize,
    },
    DrawElements {
        topology: Topology,
        count: usize,
        offset: usize,
    },
    Resize {
        width: u32,
        height: u32,
    },
    BindTarget {
        target: TargetId,
    },
}

/// A graphics context that draws nothing and records every call, while
/// tracking the resulting stencil and color-mask state.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingContext {
    calls: Vec<GlCall>,
    target: TargetId,
    stencil_enabled: bool,
    func: (StencilFunc, u8, u8),
    op: StencilOp,
    color_writes: bool,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            target: SCREEN_TARGET,
            stencil_enabled: false,
            func: (StencilFunc::Always, 0, 0xFF),
            op: StencilOp::Keep,
            color_writes: true,
        }
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    /// Drain the log, keeping the tracked state.
    pub fn take_calls(&mut self) -> Vec<GlCall> {
        std::mem::take(&mut self.calls)
    }

    /// `(topology, count, offset)` of every draw, in order.
    pub fn draw_calls(&self) -> Vec<(Topology, usize, usize)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GlCall::DrawElements {
                    topology,
                    count,
                    offset,
                } => Some((*topology, *count, *offset)),
                _ => None,
            })
            .collect()
    }

    pub fn is_stencil_enabled(&self) -> bool {
        self.stencil_enabled
    }

    pub fn current_stencil_func(&self) -> (StencilFunc, u8, u8) {
        self.func
    }

    pub fn current_stencil_op(&self) -> StencilOp {
        self.op
    }

    pub fn color_writes_enabled(&self) -> bool {
        self.color_writes
    }

    pub fn current_target(&self) -> TargetId {
        self.target
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.calls)
    }
}

impl GraphicsContext for RecordingContext {
    fn enable_stencil_test(&mut self) {
        self.stencil_enabled = true;
        self.calls.push(GlCall::EnableStencilTest);
    }

    fn disable_stencil_test(&mut self) {
        self.stencil_enabled = false;
        self.calls.push(GlCall::DisableStencilTest);
    }

    fn clear_stencil(&mut self) {
        self.calls.push(GlCall::ClearStencil);
    }

    fn stencil_func(&mut self, func: StencilFunc, reference: u8, mask: u8) {
        self.func = (func, reference, mask);
        self.calls.push(GlCall::StencilFunc {
            func,
            reference,
            mask,
        });
    }

    fn stencil_op(&mut self, op: StencilOp) {
        self.op = op;
        self.calls.push(GlCall::StencilOp { op });
    }

    fn color_mask(&mut self, enabled: bool) {
        self.color_writes = enabled;
        self.calls.push(GlCall::ColorMask { enabled });
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.calls.push(GlCall::ClearColor { rgba });
    }

    fn use_program(&mut self, program: Program, uniforms: &Uniforms) {
        self.calls.push(GlCall::UseProgram {
            program,
            uniforms: *uniforms,
        });
    }

    fn bind_geometry(&mut self, geometry: &GeometryDescriptor, layout: VertexLayout) {
        self.calls.push(GlCall::BindGeometry {
            layout,
            vertices: geometry.vertex_count(),
            indices: geometry.index_count(),
        });
    }

    fn draw_elements(&mut self, topology: Topology, count: usize, offset: usize) {
        self.calls.push(GlCall::DrawElements {
            topology,
            count,
            offset,
        });
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(GlCall::Resize { width, height });
    }

    fn bind_target(&mut self, target: TargetId) {
        self.target = target;
        self.calls.push(GlCall::BindTarget { target });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_state() {
        let mut ctx = RecordingContext::new();
        ctx.enable_stencil_test();
        ctx.stencil_func(StencilFunc::Equal, 3, 0xFF);
        ctx.stencil_op(StencilOp::Incr);
        ctx.color_mask(false);
        assert!(ctx.is_stencil_enabled());
        assert_eq!(ctx.current_stencil_func(), (StencilFunc::Equal, 3, 0xFF));
        assert_eq!(ctx.current_stencil_op(), StencilOp::Incr);
        assert!(!ctx.color_writes_enabled());
        assert_eq!(ctx.calls().len(), 4);
    }

    #[test]
    fn test_take_calls_keeps_state() {
        let mut ctx = RecordingContext::new();
        ctx.enable_stencil_test();
        ctx.draw_elements(Topology::TriangleStrip, 4, 0);
        let calls = ctx.take_calls();
        assert_eq!(calls.len(), 2);
        assert!(ctx.calls().is_empty());
        assert!(ctx.is_stencil_enabled());
    }

    #[test]
    fn test_to_json() {
        let mut ctx = RecordingContext::new();
        ctx.stencil_op(StencilOp::Invert);
        let json = ctx.to_json().unwrap();
        assert!(json.contains("Invert"));
    }

    #[test]
    fn test_records_target_and_resize() {
        let mut ctx = RecordingContext::new();
        assert_eq!(ctx.current_target(), SCREEN_TARGET);
        ctx.bind_target(3);
        ctx.resize(10, 20);
        assert_eq!(ctx.current_target(), 3);
        assert_eq!(
            ctx.calls(),
            &[
                GlCall::BindTarget { target: 3 },
                GlCall::Resize {
                    width: 10,
                    height: 20
                },
            ]
        );
    }
}
