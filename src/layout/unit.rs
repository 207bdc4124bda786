//! Unit builder: keep a heading together with the block after it

use crate::document::ContentNode;
use crate::layout::normalize::Block;
use smallvec::SmallVec;

/// One or two blocks that are placed on the same page.
///
/// A two-block unit is always a heading followed by its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    blocks: SmallVec<[Block; 2]>,
}

impl Unit {
    pub fn single(block: Block) -> Self {
        let mut blocks = SmallVec::new();
        blocks.push(block);
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether this unit fuses a heading with its successor
    pub fn is_keep_with_next(&self) -> bool {
        self.blocks.len() == 2
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> + '_ {
        self.blocks.iter().map(|block| &block.node)
    }

    pub fn into_nodes(self) -> impl Iterator<Item = ContentNode> {
        self.blocks.into_iter().map(Block::into_node)
    }
}

/// Group blocks into units, scanning left to right
pub fn build_units(blocks: Vec<Block>) -> Vec<Unit> {
    let mut units = Vec::with_capacity(blocks.len());
    let mut iter = blocks.into_iter();

    while let Some(block) = iter.next() {
        let heading = block.is_heading();
        let mut unit = Unit::single(block);
        if heading {
            // A trailing heading stays alone
            if let Some(next) = iter.next() {
                unit.blocks.push(next);
            }
        }
        units.push(unit);
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::parse_fragment;
    use crate::layout::normalize::normalize_nodes;

    fn units_of(markup: &str) -> Vec<Unit> {
        build_units(normalize_nodes(parse_fragment(markup).unwrap()))
    }

    #[test]
    fn test_heading_fused_with_next() {
        let units = units_of("<h2>T</h2><p>a</p><p>b</p>");
        assert_eq!(units.len(), 2);
        assert!(units[0].is_keep_with_next());
        assert_eq!(units[1].len(), 1);
    }

    #[test]
    fn test_trailing_heading_alone() {
        let units = units_of("<p>a</p><h3>End</h3>");
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].len(), 1);
        assert!(units[1].blocks()[0].is_heading());
    }

    #[test]
    fn test_consecutive_headings() {
        let units = units_of("<h1>A</h1><h2>B</h2><p>c</p>");
        assert_eq!(units.len(), 2);
        assert!(units[0].blocks()[1].is_heading());
        assert_eq!(units[1].len(), 1);
    }

    #[test]
    fn test_no_headings() {
        let units = units_of("<p>a</p><p>b</p><p>c</p>");
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| !u.is_keep_with_next()));
    }

    #[test]
    fn test_into_nodes_preserves_order() {
        let nodes = parse_fragment("<h2>T</h2><p>a</p><p>b</p>").unwrap();
        let units = build_units(normalize_nodes(nodes.clone()));
        let flat: Vec<_> = units.into_iter().flat_map(Unit::into_nodes).collect();
        assert_eq!(flat, nodes);
    }
}
