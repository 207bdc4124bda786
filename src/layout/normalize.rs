//! Block normalizer: coerce a section into indivisible display blocks

use crate::document::{BlockKind, ContentNode, Element};
use crate::layout::section::Section;

/// An indivisible, block-level node
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub node: ContentNode,
}

impl Block {
    pub fn is_heading(&self) -> bool {
        self.kind.is_heading()
    }

    pub fn into_node(self) -> ContentNode {
        self.node
    }
}

/// Normalize one section into blocks
pub fn normalize(section: Section) -> Vec<Block> {
    normalize_nodes(section.nodes)
}

/// Normalize a node sequence into blocks.
///
/// - non-blank text becomes a paragraph holding the text verbatim
/// - whitespace-only text is dropped
/// - block-level elements pass through unchanged
/// - other elements are wrapped in a paragraph
/// - hard breaks are filtered out
pub fn normalize_nodes(nodes: Vec<ContentNode>) -> Vec<Block> {
    nodes.into_iter().filter_map(coerce).collect()
}

fn coerce(node: ContentNode) -> Option<Block> {
    if node.is_hard_break() || node.is_blank_text() {
        return None;
    }
    if let Some(kind) = node.block_kind() {
        return Some(Block { kind, node });
    }
    Some(Block {
        kind: BlockKind::Paragraph,
        node: Element::new("p").with_child(node).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::parse_fragment;

    fn normalize_str(markup: &str) -> Vec<Block> {
        normalize_nodes(parse_fragment(markup).unwrap())
    }

    #[test]
    fn test_stray_text_wrapped() {
        let blocks = normalize_str("  loose text \n<p>para</p>");
        assert_eq!(blocks.len(), 2);
        let p = blocks[0].node.as_element().unwrap();
        assert_eq!(p.tag, "p");
        assert_eq!(p.children, vec![ContentNode::text("  loose text \n")]);
    }

    #[test]
    fn test_whitespace_dropped() {
        let blocks = normalize_str("\n   <p>a</p>\n\n<p>b</p>\n");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_inline_element_wrapped() {
        let blocks = normalize_str("<a href=\"x\">link</a><span>s</span>");
        assert_eq!(blocks.len(), 2);
        for block in &blocks {
            assert_eq!(block.kind, BlockKind::Paragraph);
            let p = block.node.as_element().unwrap();
            assert_eq!(p.children.len(), 1);
        }
    }

    #[test]
    fn test_blocks_pass_through() {
        let nodes = parse_fragment("<h2>t</h2><ul><li>x</li></ul><pre>c</pre><table></table>").unwrap();
        let blocks = normalize_nodes(nodes.clone());
        assert_eq!(
            blocks.iter().map(|b| b.node.clone()).collect::<Vec<_>>(),
            nodes
        );
        assert!(blocks[0].is_heading());
    }

    #[test]
    fn test_hard_break_filtered() {
        let blocks = normalize_str("<p>a</p><hr><p>b</p>");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_str("text<b>bold</b><p>p</p>");
        let twice = normalize_nodes(once.iter().map(|b| b.node.clone()).collect());
        assert_eq!(once, twice);
    }
}
