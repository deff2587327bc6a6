//! CPU rasterizer with a real 8-bit stencil buffer.
//!
//! Samples one point per pixel at the pixel center, without antialiasing.
//! Shared triangle edges follow a top-left style ownership rule so a pixel on
//! an edge between two adjacent triangles is covered exactly once, which the
//! even-odd stencil inversion depends on. Triangles are flat-shaded with the
//! color of their first vertex and overwrite the color buffer without blending.

use std::collections::HashMap;

use strata_core::{GeometryDescriptor, Point, Transform};

use crate::context::{
    GraphicsContext, Program, StencilFunc, StencilOp, TargetId, Topology, Uniforms, VertexLayout,
    SCREEN_TARGET,
};
use crate::surface::Surface;

type Vertex = (f64, f64);

/// Buffers of a target that is not currently bound.
#[derive(Debug, Clone)]
struct TargetBuffers {
    stencil: Vec<u8>,
    color: Vec<[u8; 4]>,
}

impl TargetBuffers {
    fn new(surface: &Surface) -> Self {
        Self {
            stencil: vec![0; surface.pixel_count()],
            color: vec![[0, 0, 0, 0]; surface.pixel_count()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SoftwareContext {
    surface: Surface,
    target: TargetId,
    stencil: Vec<u8>,
    color: Vec<[u8; 4]>,
    parked: HashMap<TargetId, TargetBuffers>,
    stencil_test: bool,
    func: StencilFunc,
    reference: u8,
    read_mask: u8,
    op: StencilOp,
    color_writes: bool,
    program: Option<(Program, Uniforms)>,
    vertices: Vec<f32>,
    indices: Vec<u16>,
    layout: VertexLayout,
    draws: usize,
}

impl SoftwareContext {
    pub fn new(width: u32, height: u32) -> Self {
        let surface = Surface::new(width, height);
        let buffers = TargetBuffers::new(&surface);
        Self {
            surface,
            target: SCREEN_TARGET,
            stencil: buffers.stencil,
            color: buffers.color,
            parked: HashMap::new(),
            stencil_test: false,
            func: StencilFunc::Always,
            reference: 0,
            read_mask: 0xFF,
            op: StencilOp::Keep,
            color_writes: true,
            program: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            layout: VertexLayout::Position,
            draws: 0,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The target that [`pixel`](Self::pixel) and draws refer to.
    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn is_stencil_enabled(&self) -> bool {
        self.stencil_test
    }

    pub fn stencil_at(&self, x: u32, y: u32) -> u8 {
        self.stencil[self.index(x, y)]
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.color[self.index(x, y)]
    }

    /// Number of draw calls issued so far.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Copy of the whole stencil buffer, row-major.
    pub fn stencil_snapshot(&self) -> Vec<u8> {
        self.stencil.clone()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.surface.width as usize + x as usize
    }

    fn vertex(&self, index: u16, to_clip: &Transform) -> Option<(Vertex, [f32; 4])> {
        let floats = match self.layout {
            VertexLayout::Position => 2,
            VertexLayout::PositionColor => 6,
        };
        let start = index as usize * floats;
        let data = self.vertices.get(start..start + floats)?;
        let clip = to_clip.apply(&Point::new(data[0] as f64, data[1] as f64));
        let pixel = self.surface.clip_to_pixel(&clip);
        let rgba = match self.layout {
            VertexLayout::Position => [1.0, 1.0, 1.0, 1.0],
            VertexLayout::PositionColor => [data[2], data[3], data[4], data[5]],
        };
        Some(((pixel.x, pixel.y), rgba))
    }

    fn shade(&mut self, index: usize, rgba: [u8; 4]) {
        if self.stencil_test {
            let value = self.stencil[index];
            let pass = match self.func {
                StencilFunc::Always => true,
                StencilFunc::Equal => (value & self.read_mask) == (self.reference & self.read_mask),
            };
            if !pass {
                return;
            }
            self.stencil[index] = self.op.apply(value);
        }
        if self.color_writes {
            self.color[index] = rgba;
        }
    }

    fn rasterize(&mut self, p0: Vertex, p1: Vertex, p2: Vertex, rgba: [u8; 4]) {
        let area = edge(p0, p1, p2);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let (p1, p2) = if area < 0.0 { (p2, p1) } else { (p1, p2) };

        let width = self.surface.width as f64;
        let height = self.surface.height as f64;
        let clamp = |v: f64, hi: f64| v.max(0.0).min(hi) as u32;
        let min_x = clamp(p0.0.min(p1.0).min(p2.0).floor(), width);
        let max_x = clamp(p0.0.max(p1.0).max(p2.0).ceil(), width);
        let min_y = clamp(p0.1.min(p1.1).min(p2.1).floor(), height);
        let max_y = clamp(p0.1.max(p1.1).max(p2.1).ceil(), height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let c = (x as f64 + 0.5, y as f64 + 0.5);
                if covers(p0, p1, c) && covers(p1, p2, c) && covers(p2, p0, c) {
                    let index = self.index(x, y);
                    self.shade(index, rgba);
                }
            }
        }
    }
}

fn edge(a: Vertex, b: Vertex, c: Vertex) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// A center exactly on an edge belongs to only one of the two directions the
/// edge can be walked in, so adjacent triangles never both claim it.
fn covers(a: Vertex, b: Vertex, c: Vertex) -> bool {
    let w = edge(a, b, c);
    w > 0.0 || (w == 0.0 && (b.1 < a.1 || (a.1 == b.1 && b.0 < a.0)))
}

fn to_rgba8(rgba: [f32; 4]) -> [u8; 4] {
    rgba.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl GraphicsContext for SoftwareContext {
    fn enable_stencil_test(&mut self) {
        self.stencil_test = true;
    }

    fn disable_stencil_test(&mut self) {
        self.stencil_test = false;
    }

    fn clear_stencil(&mut self) {
        self.stencil.fill(0);
    }

    fn stencil_func(&mut self, func: StencilFunc, reference: u8, mask: u8) {
        self.func = func;
        self.reference = reference;
        self.read_mask = mask;
    }

    fn stencil_op(&mut self, op: StencilOp) {
        self.op = op;
    }

    fn color_mask(&mut self, enabled: bool) {
        self.color_writes = enabled;
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        if self.color_writes {
            self.color.fill(to_rgba8(rgba));
        }
    }

    fn use_program(&mut self, program: Program, uniforms: &Uniforms) {
        self.program = Some((program, *uniforms));
    }

    fn bind_geometry(&mut self, geometry: &GeometryDescriptor, layout: VertexLayout) {
        self.vertices.clone_from(&geometry.vertex_data);
        self.indices.clone_from(&geometry.index_data);
        self.layout = layout;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        let buffers = TargetBuffers::new(&self.surface);
        self.stencil = buffers.stencil;
        self.color = buffers.color;
        self.parked.clear();
    }

    fn bind_target(&mut self, target: TargetId) {
        if target == self.target {
            return;
        }
        let incoming = self
            .parked
            .remove(&target)
            .unwrap_or_else(|| TargetBuffers::new(&self.surface));
        let outgoing = TargetBuffers {
            stencil: std::mem::replace(&mut self.stencil, incoming.stencil),
            color: std::mem::replace(&mut self.color, incoming.color),
        };
        self.parked.insert(self.target, outgoing);
        self.target = target;
    }

    fn draw_elements(&mut self, topology: Topology, count: usize, offset: usize) {
        let Some((program, uniforms)) = self.program else {
            log::warn!("draw_elements with no program bound");
            return;
        };
        self.draws += 1;

        let end = (offset + count).min(self.indices.len());
        let indices: Vec<u16> = self.indices.get(offset..end).unwrap_or_default().to_vec();
        if indices.len() < 3 {
            return;
        }

        let to_clip = Transform::from_mat3(&uniforms.translation)
            .then(&Transform::from_mat3(&uniforms.projection));
        let base = match (program, uniforms.color) {
            (Program::ComplexPrimitive, Some([r, g, b])) => [r, g, b],
            _ => [1.0, 1.0, 1.0],
        };

        let triangles: Vec<[u16; 3]> = match topology {
            Topology::TriangleFan => (1..indices.len() - 1)
                .map(|i| [indices[0], indices[i], indices[i + 1]])
                .collect(),
            Topology::TriangleStrip => indices.windows(3).map(|w| [w[0], w[1], w[2]]).collect(),
        };

        for [i0, i1, i2] in triangles {
            let (Some((p0, color)), Some((p1, _)), Some((p2, _))) = (
                self.vertex(i0, &to_clip),
                self.vertex(i1, &to_clip),
                self.vertex(i2, &to_clip),
            ) else {
                log::warn!("Index out of range in draw_elements, triangle skipped");
                continue;
            };
            let rgba = to_rgba8([
                color[0] * base[0] * uniforms.tint[0],
                color[1] * base[1] * uniforms.tint[1],
                color[2] * base[2] * uniforms.tint[2],
                color[3] * uniforms.alpha,
            ]);
            self.rasterize(p0, p1, p2, rgba);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Color, FillRule};

    fn uniforms(surface: &Surface) -> Uniforms {
        Uniforms {
            translation: Transform::IDENTITY.to_mat3(),
            projection: surface.projection().to_mat3(),
            tint: [1.0, 1.0, 1.0],
            alpha: 1.0,
            color: None,
        }
    }

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> GeometryDescriptor {
        let c = Color::from_hex(0x336699).to_rgb();
        let mut vertex_data = Vec::new();
        for (x, y) in [(x0, y0), (x1, y0), (x1, y1), (x0, y1)] {
            vertex_data.extend_from_slice(&[x, y, c[0], c[1], c[2], 1.0]);
        }
        GeometryDescriptor {
            vertex_data,
            index_data: vec![0, 1, 3, 2],
            fill_rule: FillRule::Convex,
            dirty: false,
            ..Default::default()
        }
    }

    fn draw_quad(ctx: &mut SoftwareContext, geometry: &GeometryDescriptor) {
        let u = uniforms(ctx.surface());
        ctx.use_program(Program::Primitive, &u);
        ctx.bind_geometry(geometry, VertexLayout::PositionColor);
        ctx.draw_elements(Topology::TriangleStrip, 4, 0);
    }

    fn painted(ctx: &SoftwareContext) -> usize {
        let s = *ctx.surface();
        (0..s.height)
            .flat_map(|y| (0..s.width).map(move |x| (x, y)))
            .filter(|&(x, y)| ctx.pixel(x, y)[3] != 0)
            .count()
    }

    #[test]
    fn test_quad_covers_exact_pixels() {
        let mut ctx = SoftwareContext::new(16, 16);
        draw_quad(&mut ctx, &quad(2.0, 3.0, 6.0, 5.0));
        assert_eq!(painted(&ctx), 4 * 2);
        assert_eq!(ctx.pixel(2, 3), [0x33, 0x66, 0x99, 255]);
        assert_eq!(ctx.pixel(6, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn test_shared_edge_pixels_counted_once() {
        let mut ctx = SoftwareContext::new(8, 8);
        ctx.enable_stencil_test();
        ctx.stencil_func(StencilFunc::Always, 0, 0xFF);
        ctx.stencil_op(StencilOp::Incr);
        // The strip's diagonal passes exactly through pixel centers.
        draw_quad(&mut ctx, &quad(0.5, 0.5, 6.5, 6.5));
        let snapshot = ctx.stencil_snapshot();
        assert!(snapshot.iter().all(|&v| v <= 1));
        assert_eq!(ctx.stencil_at(3, 3), 1);
    }

    #[test]
    fn test_stencil_equal_rejects_pixels() {
        let mut ctx = SoftwareContext::new(8, 8);
        ctx.enable_stencil_test();
        ctx.stencil_func(StencilFunc::Equal, 1, 0xFF);
        draw_quad(&mut ctx, &quad(0.0, 0.0, 8.0, 8.0));
        assert_eq!(painted(&ctx), 0);
    }

    #[test]
    fn test_disabled_stencil_is_not_written() {
        let mut ctx = SoftwareContext::new(4, 4);
        ctx.stencil_op(StencilOp::Invert);
        draw_quad(&mut ctx, &quad(0.0, 0.0, 4.0, 4.0));
        assert!(ctx.stencil_snapshot().iter().all(|&v| v == 0));
        assert_eq!(painted(&ctx), 16);
    }

    #[test]
    fn test_color_mask_blocks_color() {
        let mut ctx = SoftwareContext::new(4, 4);
        ctx.color_mask(false);
        draw_quad(&mut ctx, &quad(0.0, 0.0, 4.0, 4.0));
        assert_eq!(painted(&ctx), 0);
        assert_eq!(ctx.draw_count(), 1);
    }

    #[test]
    fn test_draw_without_program_is_ignored() {
        let mut ctx = SoftwareContext::new(4, 4);
        ctx.bind_geometry(&quad(0.0, 0.0, 4.0, 4.0), VertexLayout::PositionColor);
        ctx.draw_elements(Topology::TriangleStrip, 4, 0);
        assert_eq!(ctx.draw_count(), 0);
    }

    #[test]
    fn test_resize_reallocates_buffers() {
        let mut ctx = SoftwareContext::new(4, 4);
        draw_quad(&mut ctx, &quad(0.0, 0.0, 4.0, 4.0));
        ctx.resize(8, 6);
        assert_eq!(ctx.surface().pixel_count(), 48);
        assert_eq!(ctx.stencil_snapshot().len(), 48);
        assert_eq!(painted(&ctx), 0);
        draw_quad(&mut ctx, &quad(4.0, 2.0, 8.0, 6.0));
        assert_eq!(ctx.pixel(7, 5), [0x33, 0x66, 0x99, 255]);
    }

    #[test]
    fn test_targets_have_separate_buffers() {
        let mut ctx = SoftwareContext::new(8, 8);
        ctx.enable_stencil_test();
        ctx.stencil_func(StencilFunc::Always, 0, 0xFF);
        ctx.stencil_op(StencilOp::Incr);
        draw_quad(&mut ctx, &quad(0.0, 0.0, 4.0, 4.0));

        ctx.bind_target(7);
        assert_eq!(ctx.target(), 7);
        assert_eq!(painted(&ctx), 0);
        assert!(ctx.stencil_snapshot().iter().all(|&v| v == 0));
        draw_quad(&mut ctx, &quad(4.0, 4.0, 8.0, 8.0));

        ctx.bind_target(SCREEN_TARGET);
        assert_eq!(ctx.stencil_at(1, 1), 1);
        assert_eq!(ctx.stencil_at(6, 6), 0);
        assert_eq!(painted(&ctx), 16);

        ctx.bind_target(7);
        assert_eq!(ctx.stencil_at(6, 6), 1);
        assert_eq!(ctx.stencil_at(1, 1), 0);
    }
}
