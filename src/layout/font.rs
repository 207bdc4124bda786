//! Font metrics for height estimation

/// Metrics needed for text layout
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Line height in logical pixels
    pub line_height: f32,
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        // 17px body text at 1.6 line height, average proportional advance
        Self::uniform(27.2, 8.2)
    }
}

impl FontMetrics {
    pub fn new(line_height: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            line_height,
            char_widths,
            default_width,
        }
    }

    /// Every character has the same advance
    pub fn uniform(line_height: f32, width: f32) -> Self {
        Self::new(line_height, vec![width; 128], width)
    }

    /// Metrics for preformatted code
    pub fn monospace() -> Self {
        Self::uniform(21.0, 8.4)
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }
}
