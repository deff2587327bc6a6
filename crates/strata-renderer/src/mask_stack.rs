use serde::{Deserialize, Serialize};
use strata_core::{Color, FillRule, GeometryDescriptor, MaskId, Transform};

/// Deepest supported nesting with an 8-bit stencil buffer.
pub const MAX_MASK_DEPTH: usize = 255;

/// Buffers and uniforms a push drew with. The matching pop draws them again,
/// whatever happened to the mask node in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedGeometry {
    pub geometry: GeometryDescriptor,
    pub transform: Transform,
    pub tint: Color,
    pub alpha: f32,
    pub projection: Transform,
}

/// What the stack remembers about a pushed mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub id: MaskId,
    pub fill_rule: FillRule,
    /// `None` when the push issued no stencil draws (empty geometry); the
    /// matching pop must not draw either.
    pub committed: Option<CommittedGeometry>,
}

impl MaskEntry {
    pub fn is_stenciled(&self) -> bool {
        self.committed.is_some()
    }
}

/// Active masks of one drawing surface, plus the parity flag that selects how
/// cumulative depth is encoded in the stencil buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStack {
    entries: Vec<MaskEntry>,
    parity: bool,
}

impl Default for MaskStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            parity: true,
        }
    }

    /// Current nesting level, always the number of entries.
    pub fn level(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parity(&self) -> bool {
        self.parity
    }

    pub fn top(&self) -> Option<&MaskEntry> {
        self.entries.last()
    }

    /// Stencil byte that represents cumulative depth `depth` under the current
    /// parity: `depth` itself, or `0xFF - depth`.
    pub fn stencil_value(&self, depth: usize) -> u8 {
        encode(depth, self.parity)
    }

    pub(crate) fn push_entry(&mut self, entry: MaskEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn pop_entry(&mut self) -> Option<MaskEntry> {
        self.entries.pop()
    }

    pub(crate) fn toggle_parity(&mut self) {
        self.parity = !self.parity;
    }

    pub(crate) fn reset_parity(&mut self) {
        self.parity = true;
    }

    /// Drop every entry, e.g. when the surface is reallocated.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.parity = true;
    }
}

pub(crate) fn encode(depth: usize, parity: bool) -> u8 {
    debug_assert!(depth <= MAX_MASK_DEPTH, "stencil depth {depth} out of range");
    let depth = depth as u8;
    if parity {
        depth
    } else {
        0xFF - depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(fill_rule: FillRule) -> MaskEntry {
        MaskEntry {
            id: Uuid::new_v4(),
            fill_rule,
            committed: None,
        }
    }

    #[test]
    fn test_new_stack_is_empty() {
        let stack = MaskStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.level(), 0);
        assert!(stack.parity());
        assert!(stack.top().is_none());
    }

    #[test]
    fn test_level_tracks_entries() {
        let mut stack = MaskStack::new();
        stack.push_entry(entry(FillRule::Convex));
        stack.push_entry(entry(FillRule::NonConvex));
        assert_eq!(stack.level(), 2);
        assert_eq!(stack.pop_entry().unwrap().fill_rule, FillRule::NonConvex);
        assert_eq!(stack.level(), 1);
    }

    #[test]
    fn test_stencil_value_follows_parity() {
        let mut stack = MaskStack::new();
        assert_eq!(stack.stencil_value(3), 3);
        stack.toggle_parity();
        assert_eq!(stack.stencil_value(3), 252);
        assert_eq!(stack.stencil_value(0), 255);
        stack.reset_parity();
        assert_eq!(stack.stencil_value(255), 255);
    }

    #[test]
    fn test_clear_resets_parity() {
        let mut stack = MaskStack::new();
        stack.push_entry(entry(FillRule::NonConvex));
        stack.toggle_parity();
        stack.clear();
        assert!(stack.is_empty());
        assert!(stack.parity());
    }
}
