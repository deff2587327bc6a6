use thiserror::Error;

use strata_core::{MaskId, TessellateError};

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("Mask nesting depth {depth} exceeds the {max}-level stencil capacity")]
    ResourceExhausted { depth: usize, max: usize },

    #[error("pop_mask called with no active mask")]
    StackImbalance,

    #[error("pop_mask for mask {found}, but mask {expected} is on top of the stack")]
    MaskMismatch { expected: MaskId, found: MaskId },

    #[error("Tessellation failed: {0}")]
    Tessellation(#[from] TessellateError),

    #[error("Content fills must be convex")]
    ConcaveFill,
}
