//! Line counting for height estimation

use crate::layout::font::FontMetrics;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Line breaker
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Number of lines `text` occupies at `max_width`.
    ///
    /// Lines break at Unicode line-break opportunities; a segment wider than
    /// a whole line is broken between grapheme clusters. Trailing spaces
    /// hang past the edge. Empty text occupies no lines.
    pub fn line_count(&self, text: &str, max_width: f32, metrics: &FontMetrics) -> usize {
        if text.is_empty() {
            return 0;
        }
        let max_width = max_width.max(metrics.default_width);

        let mut lines = 0;
        let mut line_width: f32 = 0.0;
        let mut line_open = false;
        let mut start = 0;

        for (end, opportunity) in linebreaks(text) {
            let segment = text[start..end].trim_end_matches(['\n', '\r']);
            start = end;

            let fit_width = text_width(segment.trim_end(), metrics);
            if line_open && line_width > 0.0 && line_width + fit_width > max_width {
                lines += 1;
                line_width = 0.0;
            }

            if fit_width > max_width {
                // Emergency break inside the segment
                for grapheme in segment.graphemes(true) {
                    let w = grapheme_width(grapheme, metrics);
                    if line_width > 0.0 && line_width + w > max_width && !is_space(grapheme) {
                        lines += 1;
                        line_width = 0.0;
                    }
                    line_width += w;
                }
            } else {
                line_width += text_width(segment, metrics);
            }
            line_open = true;

            if opportunity == BreakOpportunity::Mandatory {
                lines += 1;
                line_width = 0.0;
                line_open = false;
            }
        }

        if line_open {
            lines += 1;
        }
        lines
    }
}

/// Collapse whitespace runs the way normal (non-preformatted) flow does
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_width(text: &str, metrics: &FontMetrics) -> f32 {
    text.graphemes(true).map(|g| grapheme_width(g, metrics)).sum()
}

fn grapheme_width(grapheme: &str, metrics: &FontMetrics) -> f32 {
    if grapheme == "\t" {
        metrics.default_width * 4.0
    } else if grapheme.chars().all(|c| c.is_control()) {
        0.0
    } else {
        grapheme.chars().map(|c| metrics.width(c)).sum()
    }
}

fn is_space(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace)
}
