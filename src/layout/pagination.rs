//! Packer: greedy, forward-only assignment of units to pages
//!
//! Per section, the whole section is first tried against the page being
//! filled. If it does not fit, that page is closed and the section's units
//! are placed one at a time; a unit that does not fit starts a new page,
//! and a unit taller than the budget on an empty page gets a page of its
//! own marked `overflow`.

use crate::document::ContentNode;
use crate::error::Result;
use crate::layout::measure::MeasureSession;
use crate::layout::unit::Unit;
use smallvec::SmallVec;
use std::ops::Range;

/// Maximum content height of one page, in pixels
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PageBudget(f32);

impl PageBudget {
    pub fn new(px: f32) -> Self {
        Self(px)
    }

    pub fn px(&self) -> f32 {
        self.0
    }

    /// Check if `height` fits on one page
    pub fn fits(&self, height: f32) -> bool {
        height <= self.0
    }
}

/// A finished page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,
    pub nodes: Vec<ContentNode>,
    /// Measured taller than the budget even alone on an empty page
    pub overflow: bool,
    /// Node indices at which a new section starts (after a hard break)
    pub section_starts: SmallVec<[usize; 2]>,
}

impl Page {
    fn new(index: usize, overflow: bool) -> Self {
        Self {
            index,
            nodes: Vec::new(),
            overflow,
            section_starts: SmallVec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Page boundaries over the flattened unit sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpan {
    /// Indices into all sections' units, in order
    pub units: Range<usize>,
    pub overflow: bool,
}

/// Decides page boundaries by measuring candidate pages
pub struct Packer<'s, 'm> {
    budget: PageBudget,
    session: &'s mut MeasureSession<'m>,
    fast_path_max_blocks: Option<usize>,
}

impl<'s, 'm> Packer<'s, 'm> {
    pub fn new(budget: PageBudget, session: &'s mut MeasureSession<'m>) -> Self {
        Self {
            budget,
            session,
            fast_path_max_blocks: None,
        }
    }

    /// Sections with more blocks than `limit` go straight to unit packing
    pub fn with_fast_path_limit(mut self, limit: Option<usize>) -> Self {
        self.fast_path_max_blocks = limit;
        self
    }

    /// Compute page spans without moving any content
    pub fn plan(&mut self, sections: &[Vec<Unit>]) -> Result<Vec<PageSpan>> {
        let flat: Vec<&Unit> = sections.iter().flatten().collect();
        let mut spans = Vec::new();
        // The page being filled is always flat[open..next]
        let mut open = 0;
        let mut next = 0;

        for section in sections {
            let section_end = next + section.len();
            if section.is_empty() {
                continue;
            }

            if self.fast_path_allowed(section) && self.fits(&flat[open..section_end])? {
                next = section_end;
                continue;
            }

            close_page(&mut spans, &mut open, next);

            for idx in next..section_end {
                if self.fits(&flat[open..=idx])? {
                    next = idx + 1;
                    continue;
                }

                let page_was_empty = open == idx;
                close_page(&mut spans, &mut open, idx);
                if !page_was_empty && self.fits(&flat[idx..=idx])? {
                    next = idx + 1;
                    continue;
                }

                log::warn!(
                    "unit {idx} ({} blocks) exceeds the {}px page budget alone",
                    flat[idx].len(),
                    self.budget.px()
                );
                spans.push(PageSpan {
                    units: idx..idx + 1,
                    overflow: true,
                });
                open = idx + 1;
                next = idx + 1;
            }
        }
        close_page(&mut spans, &mut open, next);

        Ok(spans)
    }

    fn fast_path_allowed(&self, section: &[Unit]) -> bool {
        match self.fast_path_max_blocks {
            Some(limit) => section.iter().map(Unit::len).sum::<usize>() <= limit,
            None => true,
        }
    }

    fn fits(&mut self, units: &[&Unit]) -> Result<bool> {
        let nodes: Vec<&ContentNode> = units.iter().flat_map(|unit| unit.nodes()).collect();
        let height = self.session.measure_height(&nodes)?;
        Ok(self.budget.fits(height))
    }
}

fn close_page(spans: &mut Vec<PageSpan>, open: &mut usize, end: usize) {
    if end > *open {
        spans.push(PageSpan {
            units: *open..end,
            overflow: false,
        });
    }
    *open = end;
}

/// Move units into pages following `spans`
pub fn assemble(sections: Vec<Vec<Unit>>, spans: &[PageSpan]) -> Vec<Page> {
    let mut flat = sections
        .into_iter()
        .flat_map(|section| {
            section
                .into_iter()
                .enumerate()
                .map(|(idx, unit)| (idx == 0, unit))
        })
        .enumerate();

    let mut pages = Vec::with_capacity(spans.len());
    for (index, span) in spans.iter().enumerate() {
        let mut page = Page::new(index, span.overflow);
        for (flat_idx, (starts_section, unit)) in flat.by_ref().take(span.units.len()) {
            if starts_section && flat_idx > 0 {
                page.section_starts.push(page.nodes.len());
            }
            page.nodes.extend(unit.into_nodes());
        }
        pages.push(page);
    }
    debug_assert!(flat.next().is_none(), "page spans must cover every unit");

    pages
}

/// Pack sections of units into pages
pub fn pack(
    sections: Vec<Vec<Unit>>,
    budget: PageBudget,
    session: &mut MeasureSession<'_>,
) -> Result<Vec<Page>> {
    let spans = Packer::new(budget, session).plan(&sections)?;
    Ok(assemble(sections, &spans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::parse_fragment;
    use crate::layout::measure::MetricsMeasurer;
    use crate::layout::normalize::normalize;
    use crate::layout::section::sectionize;
    use crate::layout::unit::build_units;

    fn sections_of(markup: &str) -> Vec<Vec<Unit>> {
        sectionize(parse_fragment(markup).unwrap())
            .into_iter()
            .map(|section| build_units(normalize(section)))
            .collect()
    }

    fn pack_markup(markup: &str, budget: f32) -> Vec<Page> {
        let mut measurer = MetricsMeasurer::default();
        let mut session = MeasureSession::open(&mut measurer, 320.0).unwrap();
        pack(sections_of(markup), PageBudget::new(budget), &mut session).unwrap()
    }

    fn texts(pages: &[Page]) -> Vec<Vec<String>> {
        pages
            .iter()
            .map(|p| p.nodes.iter().map(|n| n.text_content()).collect())
            .collect()
    }

    #[test]
    fn test_three_paragraphs() {
        let pages = pack_markup(
            r#"<p data-height="100">1</p><p data-height="100">2</p><p data-height="100">3</p>"#,
            250.0,
        );
        assert_eq!(texts(&pages), vec![vec!["1", "2"], vec!["3"]]);
        assert!(pages.iter().all(|p| !p.overflow));
        assert_eq!(pages[1].index, 1);
    }

    #[test]
    fn test_heading_unit_overflows_together() {
        let pages = pack_markup(
            r#"<h2 data-height="50">T</h2><p data-height="50">body</p>"#,
            80.0,
        );
        assert_eq!(pages.len(), 1);
        assert!(pages[0].overflow);
        assert_eq!(pages[0].len(), 2);
    }

    #[test]
    fn test_sections_fill_separate_pages() {
        let pages = pack_markup(
            r#"<p data-height="130">a</p><hr><p data-height="130">b</p>"#,
            150.0,
        );
        assert_eq!(texts(&pages), vec![vec!["a"], vec!["b"]]);
        assert_eq!(pages[1].section_starts.as_slice(), &[0]);
    }

    #[test]
    fn test_small_sections_share_a_page() {
        let pages = pack_markup(
            r#"<p data-height="40">a</p><hr><p data-height="40">b</p><hr><p data-height="40">c</p>"#,
            150.0,
        );
        assert_eq!(texts(&pages), vec![vec!["a", "b", "c"]]);
        assert_eq!(pages[0].section_starts.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_oversize_unit_between_normal_ones() {
        let pages = pack_markup(
            r#"<p data-height="60">a</p><img data-height="400"><p data-height="60">b</p>"#,
            200.0,
        );
        assert_eq!(pages.len(), 3);
        assert!(!pages[0].overflow);
        assert!(pages[1].overflow);
        assert_eq!(pages[1].len(), 1);
        assert!(!pages[2].overflow);
    }

    #[test]
    fn test_heading_never_stranded() {
        let pages = pack_markup(
            r#"<p data-height="90">a</p><h3 data-height="20">T</h3><p data-height="60">b</p>"#,
            150.0,
        );
        assert_eq!(texts(&pages), vec![vec!["a"], vec!["T", "b"]]);
    }

    #[test]
    fn test_fast_path_limit_skips_whole_section_measure() {
        let sections = sections_of(r#"<p data-height="10">a</p><p data-height="10">b</p>"#);
        let mut measurer = MetricsMeasurer::default();
        let mut session = MeasureSession::open(&mut measurer, 320.0).unwrap();
        let spans = Packer::new(PageBudget::new(100.0), &mut session)
            .with_fast_path_limit(Some(1))
            .plan(&sections)
            .unwrap();
        assert_eq!(spans, vec![PageSpan { units: 0..2, overflow: false }]);
        // one measurement per unit, none for the whole section
        assert_eq!(session.calls(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(pack_markup("", 100.0).is_empty());
    }
}
