//! # Strata Renderer
//!
//! Nested clip masks over an 8-bit stencil buffer.
//!
//! A [`Renderer`] owns one drawing surface. Pushing a [`MaskNode`] restricts
//! later drawing to the intersection of every active mask; popping restores
//! the previous region. Convex masks take one stencil pass, non-convex masks
//! are resolved with an invert pass over the fan followed by a bounding quad.
//!
//! [`GraphicsContext`] is the seam to the graphics API. [`RecordingContext`]
//! logs calls for inspection and [`SoftwareContext`] rasterizes on the CPU.
//!
//! [`MaskNode`]: strata_core::MaskNode

pub mod binder;
pub mod context;
pub mod error;
pub mod mask_stack;
pub mod options;
pub mod recording;
pub mod renderer;
pub mod software;
pub mod stencil;
pub mod surface;

pub use binder::{Binding, GeometryBinder};
pub use context::{
    GraphicsContext, Program, StencilFunc, StencilOp, TargetId, Topology, Uniforms, VertexLayout,
    SCREEN_TARGET,
};
pub use error::RenderError;
pub use mask_stack::{CommittedGeometry, MaskEntry, MaskStack, MAX_MASK_DEPTH};
pub use options::RendererOptions;
pub use recording::{GlCall, RecordingContext};
pub use renderer::Renderer;
pub use software::SoftwareContext;
pub use stencil::StencilMaskManager;
pub use surface::Surface;
