use serde::{Deserialize, Serialize};
use strata_core::{Point, Transform};

/// Size of the drawing surface and the projection derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Projection from surface pixels (origin top-left, y down) to clip space
    /// (`[-1, 1]` on both axes, y up).
    pub fn projection(&self) -> Transform {
        let w = self.width.max(1) as f64;
        let h = self.height.max(1) as f64;
        Transform {
            a: 2.0 / w,
            b: 0.0,
            c: 0.0,
            d: -2.0 / h,
            tx: -1.0,
            ty: 1.0,
        }
    }

    /// Convert a clip-space position back to surface pixels.
    pub fn clip_to_pixel(&self, clip: &Point) -> Point {
        Point::new(
            (clip.x + 1.0) * self.width as f64 / 2.0,
            (1.0 - clip.y) * self.height as f64 / 2.0,
        )
    }
}
