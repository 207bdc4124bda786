//! The rendered book: sheets, position indicator and navigation

use crate::config::BookConfig;
use crate::document::{for_each_heading, markup, ContentNode, HARD_BREAK_TAG};
use crate::layout::Page;
use crate::reflow::Debouncer;
use crate::render::indicator::{snap_target, PageIndicator, ScrollTarget, TapZone};
use smallvec::SmallVec;

/// One viewport-sized sheet of the book
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub nodes: Vec<ContentNode>,
    pub overflow: bool,
    /// Node indices that follow a hard break
    pub section_starts: SmallVec<[usize; 2]>,
}

impl From<Page> for Sheet {
    fn from(page: Page) -> Self {
        Self {
            nodes: page.nodes,
            overflow: page.overflow,
            section_starts: page.section_starts,
        }
    }
}

impl Sheet {
    fn class(&self) -> &'static str {
        if self.overflow {
            "sheet sheet--overflow"
        } else {
            "sheet"
        }
    }
}

/// Paginated content as shown to the reader.
///
/// Scroll and resize notifications only record the new geometry; the
/// indicator is refreshed by [`Book::poll`] once the matching rate limit
/// has elapsed.
#[derive(Debug, Clone)]
pub struct Book {
    sheets: Vec<Sheet>,
    indicator: PageIndicator,
    scroll_left: f32,
    client_width: f32,
    tap_zone_ratio: f32,
    scroll_limit: Debouncer,
    resize_limit: Debouncer,
}

impl Book {
    /// Build the book from packed pages
    pub fn render(pages: Vec<Page>, client_width: f32, config: &BookConfig) -> Self {
        let sheets: Vec<Sheet> = pages.into_iter().map(Sheet::from).collect();
        Self {
            indicator: PageIndicator::new(sheets.len()),
            sheets,
            scroll_left: 0.0,
            client_width,
            tap_zone_ratio: config.tap_zone_ratio,
            scroll_limit: Debouncer::new(config.scroll_debounce_ms),
            resize_limit: Debouncer::new(config.resize_debounce_ms),
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    #[cfg(test)]
    pub(crate) fn sheets_mut(&mut self) -> &mut [Sheet] {
        &mut self.sheets
    }

    pub fn page_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn indicator(&self) -> &PageIndicator {
        &self.indicator
    }

    pub fn scroll_left(&self) -> f32 {
        self.scroll_left
    }

    pub fn client_width(&self) -> f32 {
        self.client_width
    }

    /// The book scrolled horizontally to `scroll_left`
    pub fn on_scroll(&mut self, scroll_left: f32, now_ms: u64) {
        self.scroll_left = scroll_left;
        self.scroll_limit.schedule(now_ms);
    }

    /// The book's visible width changed
    pub fn on_resize(&mut self, client_width: f32, now_ms: u64) {
        self.client_width = client_width;
        self.resize_limit.schedule(now_ms);
    }

    /// Next time [`Book::poll`] has work to do
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.scroll_limit.deadline(), self.resize_limit.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Refresh the indicator if a rate limit elapsed. Returns true if the
    /// displayed page changed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let scrolled = self.scroll_limit.fire(now_ms);
        let resized = self.resize_limit.fire(now_ms);
        if !(scrolled || resized) {
            return false;
        }
        self.indicator.update(self.scroll_left, self.client_width)
    }

    /// Map a tap at `x` to a neighbouring page. Taps in the middle of the
    /// sheet return `None`.
    pub fn tap(&self, x: f32) -> Option<ScrollTarget> {
        if self.sheets.is_empty() {
            return None;
        }
        match TapZone::classify(x, self.client_width, self.tap_zone_ratio) {
            TapZone::Content => None,
            zone => Some(snap_target(
                self.scroll_left,
                self.client_width,
                zone.delta(),
                self.sheets.len(),
            )),
        }
    }

    /// Reset every heading's visible text to its `data-title`.
    /// Returns the number of headings rewritten.
    pub fn canonicalize_headings(&mut self) -> usize {
        let mut restored = 0;
        for sheet in &mut self.sheets {
            for_each_heading(&mut sheet.nodes, &mut |el| {
                if el.restore_title() {
                    restored += 1;
                }
            });
        }
        restored
    }

    /// Back to linear content, with a hard break wherever a section began
    pub fn flatten(self) -> Vec<ContentNode> {
        let len = self.sheets.iter().map(|s| s.nodes.len() + s.section_starts.len()).sum();
        let mut content = Vec::with_capacity(len);
        for sheet in self.sheets {
            let mut starts = sheet.section_starts.into_iter().peekable();
            for (idx, node) in sheet.nodes.into_iter().enumerate() {
                while starts.next_if_eq(&idx).is_some() {
                    content.push(ContentNode::element(HARD_BREAK_TAG));
                }
                content.push(node);
            }
        }
        content
    }

    /// Host markup for the book container
    pub fn to_markup(&self) -> String {
        let mut out = String::from(r#"<div class="book">"#);
        for sheet in &self.sheets {
            out.push_str(r#"<section class=""#);
            out.push_str(sheet.class());
            out.push_str(r#"">"#);
            for node in &sheet.nodes {
                markup::write_node(&mut out, node);
            }
            out.push_str("</section>");
        }
        out.push_str("</div>");
        out
    }
}
