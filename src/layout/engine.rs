//! Pagination pipeline: sectionize, normalize, build units, pack

use crate::config::BookConfig;
use crate::document::ContentNode;
use crate::error::Result;
use crate::layout::measure::{MeasureSession, Measurer};
use crate::layout::normalize::normalize;
use crate::layout::pagination::{assemble, Packer, Page, PageBudget};
use crate::layout::section::{rejoin, sectionize, Section};
use crate::layout::unit::{build_units, Unit};

/// Viewport metrics read at the start of every run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Window width (decides whether book mode applies)
    pub width: f32,
    /// Window height
    pub height: f32,
    /// Current width of the live content container
    pub container_width: f32,
    /// Height taken by fixed chrome above the content
    pub header_height: f32,
    /// Forwarded to widgets, not used for pagination
    pub device_pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        // Typical phone in portrait
        Self {
            width: 390.0,
            height: 844.0,
            container_width: 358.0,
            header_height: 0.0,
            device_pixel_ratio: 3.0,
        }
    }
}

impl Viewport {
    /// Viewport whose content container spans the full width
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            container_width: width,
            header_height: 0.0,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_container_width(mut self, width: f32) -> Self {
        self.container_width = width;
        self
    }

    pub fn with_header_height(mut self, height: f32) -> Self {
        self.header_height = height;
        self
    }

    /// Vertical space below fixed chrome
    pub fn available_height(&self) -> f32 {
        (self.height - self.header_height).max(1.0)
    }

    /// Whether book mode applies at this size
    pub fn is_narrow(&self, config: &BookConfig) -> bool {
        self.width <= config.max_viewport_width
    }
}

impl PageBudget {
    /// Budget for the current viewport
    pub fn from_viewport(viewport: &Viewport, config: &BookConfig) -> Self {
        Self::new((viewport.available_height() * config.budget_ratio).round())
    }
}

/// Run the full pipeline over linear content.
///
/// On success `content` is left empty and every node is in the returned
/// pages. If measurement fails, `content` holds the normalized linear
/// form again (sections rejoined with hard breaks) and the error is
/// returned, so the caller can fall back to continuous layout.
pub fn paginate(
    content: &mut Vec<ContentNode>,
    measurer: &mut dyn Measurer,
    viewport: &Viewport,
    config: &BookConfig,
) -> Result<Vec<Page>> {
    let budget = PageBudget::from_viewport(viewport, config);
    let mut session = MeasureSession::open(measurer, viewport.container_width)?;

    let sections: Vec<Vec<Unit>> = sectionize(std::mem::take(content))
        .into_iter()
        .map(|section| build_units(normalize(section)))
        .collect();
    let unit_count: usize = sections.iter().map(Vec::len).sum();

    let planned = Packer::new(budget, &mut session)
        .with_fast_path_limit(config.fast_path_max_blocks)
        .plan(&sections);

    match planned {
        Ok(spans) => {
            let pages = assemble(sections, &spans);
            log::debug!(
                "paginated {unit_count} units into {} pages (budget {}px, width {}px, {} measurements)",
                pages.len(),
                budget.px(),
                session.width(),
                session.calls()
            );
            Ok(pages)
        }
        Err(err) => {
            *content = restore(sections);
            Err(err)
        }
    }
}

fn restore(sections: Vec<Vec<Unit>>) -> Vec<ContentNode> {
    rejoin(
        sections
            .into_iter()
            .map(|units| Section {
                nodes: units.into_iter().flat_map(Unit::into_nodes).collect(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::parse_fragment;
    use crate::error::Error;
    use crate::layout::measure::MetricsMeasurer;

    #[test]
    fn test_budget_from_viewport() {
        let config = BookConfig::default();
        let viewport = Viewport::new(390.0, 800.0);
        assert_eq!(PageBudget::from_viewport(&viewport, &config).px(), 704.0);

        let with_header = viewport.with_header_height(100.0);
        assert_eq!(PageBudget::from_viewport(&with_header, &config).px(), 616.0);
    }

    #[test]
    fn test_degenerate_viewport_budget() {
        let config = BookConfig::default();
        let viewport = Viewport::new(0.0, 0.0);
        assert_eq!(PageBudget::from_viewport(&viewport, &config).px(), 1.0);
    }

    #[test]
    fn test_is_narrow() {
        let config = BookConfig::default();
        assert!(Viewport::new(560.0, 900.0).is_narrow(&config));
        assert!(!Viewport::new(1024.0, 768.0).is_narrow(&config));
    }

    #[test]
    fn test_paginate_consumes_content() {
        let mut content =
            parse_fragment(r#"<p data-height="100">a</p><p data-height="100">b</p>"#).unwrap();
        let mut measurer = MetricsMeasurer::default();
        let pages = paginate(
            &mut content,
            &mut measurer,
            &Viewport::new(390.0, 200.0),
            &BookConfig::default(),
        )
        .unwrap();
        assert!(content.is_empty());
        // budget 176: one paragraph per page
        assert_eq!(pages.len(), 2);
    }

    struct FailAfter(usize);

    impl Measurer for FailAfter {
        fn begin(&mut self, _width: f32) -> Result<()> {
            Ok(())
        }
        fn measure(&mut self, nodes: &[&ContentNode]) -> Result<f32> {
            if self.0 == 0 {
                return Err(Error::Measure("layout engine unavailable".into()));
            }
            self.0 -= 1;
            Ok(nodes.len() as f32 * 500.0)
        }
        fn end(&mut self) {}
    }

    #[test]
    fn test_measure_failure_restores_content() {
        let original = parse_fragment("<p>a</p>loose<hr><p>b</p>").unwrap();
        let mut content = original.clone();
        let err = paginate(
            &mut content,
            &mut FailAfter(1),
            &Viewport::default(),
            &BookConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Measure(_)));

        let restored = parse_fragment("<p>a</p><p>loose</p><hr><p>b</p>").unwrap();
        assert_eq!(content, restored);
    }
}
