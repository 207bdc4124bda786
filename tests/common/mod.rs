#![allow(dead_code)]

use book_pager::document::markup::parse_fragment;
use book_pager::layout::{
    build_units, normalize, pack, sectionize, MeasureSession, MetricsMeasurer, Page, PageBudget,
    Unit,
};
use book_pager::ContentNode;

pub const WIDTH: f32 = 320.0;

pub fn sections_of(markup: &str) -> Vec<Vec<Unit>> {
    sectionize(parse_fragment(markup).unwrap())
        .into_iter()
        .map(|section| build_units(normalize(section)))
        .collect()
}

/// Run the stages directly at a fixed budget
pub fn pack_markup(markup: &str, budget: f32) -> Vec<Page> {
    let mut measurer = MetricsMeasurer::default();
    let mut session = MeasureSession::open(&mut measurer, WIDTH).unwrap();
    pack(sections_of(markup), PageBudget::new(budget), &mut session).unwrap()
}

/// Height of `nodes` in a fresh session
pub fn measure(nodes: &[ContentNode], width: f32) -> f32 {
    let mut measurer = MetricsMeasurer::default();
    let mut session = MeasureSession::open(&mut measurer, width).unwrap();
    let refs: Vec<&ContentNode> = nodes.iter().collect();
    session.measure_height(&refs).unwrap()
}

pub fn texts(pages: &[Page]) -> Vec<Vec<String>> {
    pages
        .iter()
        .map(|page| page.nodes.iter().map(|n| n.text_content()).collect())
        .collect()
}

/// Page boundaries only, ignoring node content
pub fn partition(pages: &[Page]) -> Vec<(usize, bool)> {
    pages.iter().map(|page| (page.len(), page.overflow)).collect()
}
