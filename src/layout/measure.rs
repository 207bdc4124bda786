//! Measurement: height of a candidate node set at the live container width
//!
//! A [`Measurer`] is an isolated layout context. The packer never touches
//! it directly; it goes through a [`MeasureSession`], which opens the
//! context once per pagination run at a fixed width and closes it when the
//! run ends, however the run ends.

use crate::document::{is_raw_text_tag, BlockKind, ContentNode, Element};
use crate::error::{Error, Result};
use crate::layout::font::FontMetrics;
use crate::layout::line_break::{collapse_whitespace, LineBreaker};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};

/// Indentation applied to lists and quotes
pub const INDENT_WIDTH: f32 = 24.0;

/// Attribute that pins a block's height, bypassing estimation
pub const HEIGHT_ATTR: &str = "data-height";

/// Stands in for `<br>` while inline text is gathered; unlike a source
/// newline it survives whitespace collapsing
const FORCED_BREAK: char = '\u{2028}';

/// A layout context that can report the rendered height of nodes
pub trait Measurer {
    /// Prepare the context at `width` (already clamped to at least 1px)
    fn begin(&mut self, width: f32) -> Result<()>;

    /// Height of `nodes` stacked in order inside the context.
    ///
    /// Must not retain the nodes, and must return the same height for the
    /// same nodes within one session.
    fn measure(&mut self, nodes: &[&ContentNode]) -> Result<f32>;

    /// Release the context
    fn end(&mut self);
}

/// One pagination run's use of a [`Measurer`]
pub struct MeasureSession<'m> {
    measurer: &'m mut dyn Measurer,
    width: f32,
    calls: usize,
}

impl<'m> MeasureSession<'m> {
    /// Open the context at the live container width
    pub fn open(measurer: &'m mut dyn Measurer, width: f32) -> Result<Self> {
        let width = if width.is_finite() { width.max(1.0) } else { 1.0 };
        measurer.begin(width)?;
        log::trace!("measure session opened at {width}px");
        Ok(Self {
            measurer,
            width,
            calls: 0,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Number of measurements taken so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Rendered height of `nodes`, in order
    pub fn measure_height(&mut self, nodes: &[&ContentNode]) -> Result<f32> {
        self.calls += 1;
        let height = self.measurer.measure(nodes)?;
        if !height.is_finite() || height < 0.0 {
            return Err(Error::Measure(format!(
                "backend reported height {height} for {} nodes",
                nodes.len()
            )));
        }
        log::trace!("measured {} nodes: {height}px", nodes.len());
        Ok(height)
    }
}

impl Drop for MeasureSession<'_> {
    fn drop(&mut self) {
        self.measurer.end();
        log::trace!("measure session closed after {} calls", self.calls);
    }
}

/// Native measurer estimating heights from font metrics.
///
/// Text is line-broken at the session width; images use their
/// `width`/`height` attributes scaled down to fit; any element carrying
/// `data-height` is taken at its word. Block heights are cached per
/// session, keyed by node content.
#[derive(Debug, Clone)]
pub struct MetricsMeasurer {
    body: FontMetrics,
    code: FontMetrics,
    line_breaker: LineBreaker,
    default_image_height: f32,
    width: Option<f32>,
    cache: FxHashMap<u64, f32>,
}

impl Default for MetricsMeasurer {
    fn default() -> Self {
        Self::new(FontMetrics::default(), FontMetrics::monospace())
    }
}

impl MetricsMeasurer {
    pub fn new(body: FontMetrics, code: FontMetrics) -> Self {
        Self {
            body,
            code,
            line_breaker: LineBreaker::new(),
            default_image_height: 240.0,
            width: None,
            cache: FxHashMap::default(),
        }
    }

    /// Height used for replaced content without size attributes
    pub fn with_default_image_height(mut self, height: f32) -> Self {
        self.default_image_height = height;
        self
    }

    fn block_height(&mut self, node: &ContentNode, width: f32) -> f32 {
        let mut hasher = FxHasher::default();
        node.hash(&mut hasher);
        let key = hasher.finish();

        if let Some(height) = self.cache.get(&key) {
            return *height;
        }
        let height = self.node_height(node, width);
        self.cache.insert(key, height);
        height
    }

    fn node_height(&self, node: &ContentNode, width: f32) -> f32 {
        match node {
            ContentNode::Text(text) => self.text_height(text, width, BlockKind::Paragraph),
            ContentNode::Element(el) => self.element_height(el, width),
        }
    }

    fn element_height(&self, el: &Element, width: f32) -> f32 {
        if let Some(height) = el.attr_px(HEIGHT_ATTR) {
            return height;
        }
        let kind = BlockKind::classify(&el.tag).unwrap_or(BlockKind::Paragraph);
        let content = match kind {
            BlockKind::Image => self.image_height(el, width),
            kind if kind.is_preformatted() => {
                let text = el.text_content();
                self.line_breaker.line_count(&text, width, &self.code) as f32
                    * self.code.line_height
            }
            BlockKind::List { .. } | BlockKind::Quote => {
                self.flow_height(&el.children, (width - INDENT_WIDTH).max(1.0), kind)
            }
            BlockKind::Table => self.table_height(el, width),
            _ => self.flow_height(&el.children, width, kind),
        };
        content + kind.spacing_after() * self.body.line_height
    }

    /// Height of mixed children: inline runs become anonymous line boxes,
    /// block children stack
    fn flow_height(&self, children: &[ContentNode], width: f32, kind: BlockKind) -> f32 {
        let mut height = 0.0;
        let mut inline = String::new();

        for child in children {
            match child.block_kind() {
                Some(_) => {
                    height += self.text_height(&inline, width, kind);
                    inline.clear();
                    height += self.node_height(child, width);
                }
                None => match child.as_element() {
                    Some(el) if el.tag == "br" => inline.push(FORCED_BREAK),
                    // Scripts and stylesheets are not rendered
                    Some(el) if is_raw_text_tag(&el.tag) => {}
                    _ => inline.push_str(&child.text_content()),
                },
            }
        }
        height + self.text_height(&inline, width, kind)
    }

    fn text_height(&self, text: &str, width: f32, kind: BlockKind) -> f32 {
        let lines: usize = text
            .split(FORCED_BREAK)
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .map(|line| self.line_breaker.line_count(&line, width, &self.body))
            .sum();
        lines as f32 * self.body.line_height * kind.line_height_multiplier()
    }

    fn image_height(&self, el: &Element, width: f32) -> f32 {
        match (el.attr_px("width"), el.attr_px("height")) {
            (Some(w), Some(h)) if w > 0.0 => h * (width / w).min(1.0),
            (_, Some(h)) => h,
            _ => self.default_image_height,
        }
    }

    fn table_height(&self, table: &Element, width: f32) -> f32 {
        let mut rows = Vec::new();
        collect_rows(table, &mut rows);
        if rows.is_empty() {
            return self.flow_height(&table.children, width, BlockKind::Paragraph);
        }

        rows.iter()
            .map(|row| {
                let cells: Vec<&Element> = row
                    .children
                    .iter()
                    .filter_map(ContentNode::as_element)
                    .filter(|el| el.tag == "td" || el.tag == "th")
                    .collect();
                let cell_width = width / cells.len().max(1) as f32;
                cells
                    .iter()
                    .map(|cell| self.flow_height(&cell.children, cell_width, BlockKind::Paragraph))
                    .fold(self.body.line_height, f32::max)
            })
            .sum()
    }
}

fn collect_rows<'a>(el: &'a Element, rows: &mut Vec<&'a Element>) {
    for child in el.children.iter().filter_map(ContentNode::as_element) {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            _ => {}
        }
    }
}

impl Measurer for MetricsMeasurer {
    fn begin(&mut self, width: f32) -> Result<()> {
        self.width = Some(width);
        self.cache.clear();
        Ok(())
    }

    fn measure(&mut self, nodes: &[&ContentNode]) -> Result<f32> {
        let width = self
            .width
            .ok_or_else(|| Error::Measure("measure called outside a session".into()))?;
        Ok(nodes.iter().map(|node| self.block_height(node, width)).sum())
    }

    fn end(&mut self) {
        self.width = None;
        self.cache.clear();
    }
}
