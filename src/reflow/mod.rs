//! Reflow controller: when to (re)paginate and what to emit afterwards
//!
//! The controller owns the live content. Once book mode is enabled, a
//! viewport or load event only arms a debounce slot; the host polls, and
//! a single reflow runs once the slot fires: headings are reset to their
//! stable titles, the book is flattened back to linear content and the
//! pipeline runs again at the new viewport.

mod debounce;

pub use debounce::{now_ms, Debouncer};

use crate::config::BookConfig;
use crate::document::{for_each_heading, ContentNode, ContentTree};
use crate::error::{Error, Result};
use crate::layout::{paginate, Measurer, Viewport};
use crate::render::Book;
use serde::Serialize;
use std::str::FromStr;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflowState {
    Unpaginated,
    Paginating,
    Paginated,
    Disposed,
}

/// Events that invalidate the current pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflowTrigger {
    Resize,
    OrientationChange,
    /// The window finished loading (fonts, late styles)
    WindowLoaded,
    /// An image inside the content finished loading
    ImageLoaded,
}

impl FromStr for ReflowTrigger {
    type Err = Error;

    /// Parse a DOM event name
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resize" => Ok(ReflowTrigger::Resize),
            "orientationchange" => Ok(ReflowTrigger::OrientationChange),
            "load" => Ok(ReflowTrigger::WindowLoaded),
            "imageload" => Ok(ReflowTrigger::ImageLoaded),
            other => Err(Error::Trigger(other.to_string())),
        }
    }
}

/// Emitted after every successful pagination so dependents can re-run
/// over the new pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentReady {
    pub source: String,
    pub pages: usize,
}

#[derive(Debug)]
enum Live {
    Empty,
    Continuous(Vec<ContentNode>),
    Paged(Book),
}

/// Drives book mode for one content container
#[derive(Debug)]
pub struct ReflowController {
    config: BookConfig,
    state: ReflowState,
    live: Live,
    source: String,
    enabled: bool,
    debounce: Debouncer,
    runs: usize,
}

impl ReflowController {
    pub fn new(config: BookConfig) -> Self {
        Self {
            debounce: Debouncer::new(config.reflow_debounce_ms),
            config,
            state: ReflowState::Unpaginated,
            live: Live::Empty,
            source: String::new(),
            enabled: false,
            runs: 0,
        }
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn state(&self) -> ReflowState {
        self.state
    }

    /// Identifier of the content being paginated
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether book mode applies to the current content
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of successful paginations
    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn book(&self) -> Option<&Book> {
        match &self.live {
            Live::Paged(book) => Some(book),
            _ => None,
        }
    }

    pub fn book_mut(&mut self) -> Option<&mut Book> {
        match &mut self.live {
            Live::Paged(book) => Some(book),
            _ => None,
        }
    }

    /// Content shown in continuous layout (book mode off or degraded)
    pub fn continuous(&self) -> Option<&[ContentNode]> {
        match &self.live {
            Live::Continuous(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Take over `tree` once the host has finished loading and typesetting
    /// it, and paginate if book mode applies.
    ///
    /// Wide viewports and blank content leave the content continuous and
    /// return `Ok(None)`.
    pub fn enable(
        &mut self,
        mut tree: ContentTree,
        viewport: &Viewport,
        measurer: &mut dyn Measurer,
    ) -> Result<Option<ContentReady>> {
        if self.state == ReflowState::Disposed {
            return Ok(None);
        }
        self.debounce.cancel();
        self.source = std::mem::take(&mut tree.source);

        if !viewport.is_narrow(&self.config) || tree.is_empty() {
            log::debug!(
                "book mode off for {} (viewport {}px)",
                self.source,
                viewport.width
            );
            self.enabled = false;
            self.state = ReflowState::Unpaginated;
            self.live = Live::Continuous(tree.nodes);
            return Ok(None);
        }

        tree.stamp_heading_titles();
        self.enabled = true;
        self.run(tree.nodes, viewport, measurer)
    }

    /// Note an event that invalidates the pages. Only arms the debounce
    /// slot; bursts collapse into one reflow.
    pub fn trigger(&mut self, trigger: ReflowTrigger, now_ms: u64) {
        if !self.enabled || self.state == ReflowState::Disposed {
            return;
        }
        log::trace!("{trigger:?} at {now_ms}ms, reflow armed");
        self.debounce.schedule(now_ms);
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// When the armed reflow is due
    pub fn next_deadline(&self) -> Option<u64> {
        self.debounce.deadline()
    }

    /// Run the armed reflow if its quiet period has elapsed
    pub fn poll(
        &mut self,
        now_ms: u64,
        viewport: &Viewport,
        measurer: &mut dyn Measurer,
    ) -> Result<Option<ContentReady>> {
        if !self.debounce.fire(now_ms) {
            return Ok(None);
        }
        self.reflow(viewport, measurer)
    }

    /// Repaginate now at `viewport`
    pub fn reflow(
        &mut self,
        viewport: &Viewport,
        measurer: &mut dyn Measurer,
    ) -> Result<Option<ContentReady>> {
        if !self.enabled || self.state == ReflowState::Disposed {
            return Ok(None);
        }
        self.debounce.cancel();

        let content = match std::mem::replace(&mut self.live, Live::Empty) {
            Live::Paged(mut book) => {
                book.canonicalize_headings();
                book.flatten()
            }
            Live::Continuous(mut nodes) => {
                for_each_heading(&mut nodes, &mut |el| {
                    el.restore_title();
                });
                nodes
            }
            Live::Empty => Vec::new(),
        };
        self.run(content, viewport, measurer)
    }

    fn run(
        &mut self,
        mut content: Vec<ContentNode>,
        viewport: &Viewport,
        measurer: &mut dyn Measurer,
    ) -> Result<Option<ContentReady>> {
        self.state = ReflowState::Paginating;
        match paginate(&mut content, measurer, viewport, &self.config) {
            Ok(pages) => {
                let book = Book::render(pages, viewport.container_width, &self.config);
                let ready = ContentReady {
                    source: self.source.clone(),
                    pages: book.page_count(),
                };
                self.live = Live::Paged(book);
                self.state = ReflowState::Paginated;
                self.runs += 1;
                Ok(Some(ready))
            }
            Err(err) => {
                log::warn!("pagination of {} failed, showing continuous layout: {err}", self.source);
                self.live = Live::Continuous(content);
                self.state = ReflowState::Unpaginated;
                Err(err)
            }
        }
    }

    /// Drop pages and stop reacting to events. Later calls are no-ops.
    pub fn dispose(&mut self) {
        self.debounce.cancel();
        self.live = Live::Empty;
        self.enabled = false;
        self.state = ReflowState::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TITLE_ATTR;
    use crate::layout::MetricsMeasurer;

    const POST: &str = concat!(
        r#"<h2 data-height="30">Intro</h2><p data-height="200">a</p>"#,
        r#"<p data-height="200">b</p><hr><p data-height="100">c</p>"#
    );

    fn tree() -> ContentTree {
        ContentTree::parse("posts/intro.html", POST).unwrap()
    }

    fn phone() -> Viewport {
        Viewport::new(390.0, 600.0)
    }

    #[test]
    fn test_enable_paginates() {
        let mut controller = ReflowController::new(BookConfig::default());
        let ready = controller
            .enable(tree(), &phone(), &mut MetricsMeasurer::default())
            .unwrap();
        assert_eq!(
            ready,
            Some(ContentReady {
                source: "posts/intro.html".into(),
                pages: 2
            })
        );
        assert_eq!(controller.state(), ReflowState::Paginated);
        assert_eq!(controller.runs(), 1);
    }

    #[test]
    fn test_wide_viewport_is_noop() {
        let mut controller = ReflowController::new(BookConfig::default());
        let ready = controller
            .enable(tree(), &Viewport::new(1280.0, 800.0), &mut MetricsMeasurer::default())
            .unwrap();
        assert_eq!(ready, None);
        assert!(!controller.is_enabled());
        assert!(controller.book().is_none());
        assert_eq!(controller.continuous().map(<[_]>::len), Some(5));

        controller.trigger(ReflowTrigger::Resize, 0);
        assert!(!controller.is_pending());
    }

    #[test]
    fn test_blank_content_is_noop() {
        let mut controller = ReflowController::new(BookConfig::default());
        let blank = ContentTree::parse("x", "  \n").unwrap();
        let ready = controller
            .enable(blank, &phone(), &mut MetricsMeasurer::default())
            .unwrap();
        assert_eq!(ready, None);
        assert_eq!(controller.state(), ReflowState::Unpaginated);
    }

    #[test]
    fn test_trigger_burst_runs_once() {
        let mut measurer = MetricsMeasurer::default();
        let mut controller = ReflowController::new(BookConfig::default());
        controller.enable(tree(), &phone(), &mut measurer).unwrap();

        controller.trigger(ReflowTrigger::Resize, 1_000);
        controller.trigger(ReflowTrigger::OrientationChange, 1_100);
        controller.trigger(ReflowTrigger::ImageLoaded, 1_150);
        assert_eq!(controller.poll(1_300, &phone(), &mut measurer).unwrap(), None);
        assert!(controller.poll(1_350, &phone(), &mut measurer).unwrap().is_some());
        assert_eq!(controller.poll(2_000, &phone(), &mut measurer).unwrap(), None);
        assert_eq!(controller.runs(), 2);
    }

    #[test]
    fn test_reflow_to_taller_viewport() {
        let mut measurer = MetricsMeasurer::default();
        let mut controller = ReflowController::new(BookConfig::default());
        controller.enable(tree(), &phone(), &mut measurer).unwrap();
        assert_eq!(controller.book().map(Book::page_count), Some(2));

        let tall = Viewport::new(390.0, 900.0);
        let ready = controller.reflow(&tall, &mut measurer).unwrap();
        assert_eq!(ready.map(|r| r.pages), Some(1));
    }

    #[test]
    fn test_reflow_restores_heading_text() {
        let mut measurer = MetricsMeasurer::default();
        let mut controller = ReflowController::new(BookConfig::default());
        controller.enable(tree(), &phone(), &mut measurer).unwrap();

        let markup = controller.book().unwrap().to_markup();
        assert!(markup.contains(r#"data-title="Intro""#));

        controller.reflow(&phone(), &mut measurer).unwrap();
        let book = controller.book().unwrap();
        let h2 = book.sheets()[0].nodes[0].as_element().unwrap();
        assert_eq!(h2.attr(TITLE_ATTR), Some("Intro"));
        assert_eq!(h2.text_content(), "Intro");
    }

    #[test]
    fn test_animated_heading_text_reset_before_reflow() {
        let mut measurer = MetricsMeasurer::default();
        let mut controller = ReflowController::new(BookConfig::default());
        let tree = ContentTree::parse("p.html", "<h2>Flocking</h2><p>Agents.</p>").unwrap();
        controller.enable(tree, &phone(), &mut measurer).unwrap();

        // A title animation rewrites the visible text mid-flight
        let sheet = &mut controller.book_mut().unwrap().sheets_mut()[0];
        if let ContentNode::Element(h2) = &mut sheet.nodes[0] {
            h2.children = vec![ContentNode::text("Fl0ck!ng")];
        }

        controller.reflow(&phone(), &mut measurer).unwrap();
        assert_eq!(
            controller.book().unwrap().to_markup(),
            concat!(
                r#"<div class="book"><section class="sheet">"#,
                r#"<h2 data-title="Flocking">Flocking</h2><p>Agents.</p>"#,
                "</section></div>"
            )
        );
    }

    struct Broken;

    impl Measurer for Broken {
        fn begin(&mut self, _width: f32) -> Result<()> {
            Ok(())
        }
        fn measure(&mut self, _nodes: &[&ContentNode]) -> Result<f32> {
            Err(Error::Measure("no layout".into()))
        }
        fn end(&mut self) {}
    }

    #[test]
    fn test_measure_failure_degrades_then_recovers() {
        let mut controller = ReflowController::new(BookConfig::default());
        let err = controller.enable(tree(), &phone(), &mut Broken).unwrap_err();
        assert!(matches!(err, Error::Measure(_)));
        assert_eq!(controller.state(), ReflowState::Unpaginated);
        assert_eq!(controller.continuous().map(<[_]>::len), Some(5));

        controller.trigger(ReflowTrigger::WindowLoaded, 0);
        let ready = controller
            .poll(200, &phone(), &mut MetricsMeasurer::default())
            .unwrap();
        assert!(ready.is_some());
        assert_eq!(controller.state(), ReflowState::Paginated);
    }

    #[test]
    fn test_dispose() {
        let mut measurer = MetricsMeasurer::default();
        let mut controller = ReflowController::new(BookConfig::default());
        controller.enable(tree(), &phone(), &mut measurer).unwrap();
        controller.trigger(ReflowTrigger::Resize, 0);
        controller.dispose();

        assert_eq!(controller.state(), ReflowState::Disposed);
        assert!(controller.book().is_none());
        assert!(!controller.is_pending());
        assert_eq!(controller.poll(1_000, &phone(), &mut measurer).unwrap(), None);
        assert_eq!(controller.enable(tree(), &phone(), &mut measurer).unwrap(), None);
        assert_eq!(controller.state(), ReflowState::Disposed);
    }

    #[test]
    fn test_trigger_names() {
        assert_eq!("resize".parse::<ReflowTrigger>().unwrap(), ReflowTrigger::Resize);
        assert_eq!("load".parse::<ReflowTrigger>().unwrap(), ReflowTrigger::WindowLoaded);
        assert!(matches!(
            "scroll".parse::<ReflowTrigger>(),
            Err(Error::Trigger(name)) if name == "scroll"
        ));
    }
}
