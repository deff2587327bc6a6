use serde::{Deserialize, Serialize};

/// Renderer configuration. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Clear the color buffer to `background` in `begin_frame`.
    pub clear_before_render: bool,
    /// Background color as `0xRRGGBB`.
    pub background: u32,
    /// Segments used when flattening circles.
    pub circle_segments: usize,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            clear_before_render: true,
            background: 0x000000,
            circle_segments: 32,
        }
    }
}

impl RendererOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RendererOptions::default();
        assert_eq!((options.width, options.height), (800, 600));
        assert!(options.clear_before_render);
        assert_eq!(options.circle_segments, 32);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = RendererOptions::from_json(r#"{ "width": 320, "background": 255 }"#).unwrap();
        assert_eq!(options.width, 320);
        assert_eq!(options.height, 600);
        assert_eq!(options.background, 0x0000FF);
    }

    #[test]
    fn test_json_round_trip() {
        let options = RendererOptions::default().with_size(64, 48);
        let json = options.to_json().unwrap();
        assert_eq!(RendererOptions::from_json(&json).unwrap(), options);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(RendererOptions::from_json("{ width: }").is_err());
    }
}
