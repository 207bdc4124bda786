//! Document model: the post body as an owned node tree

mod block;
pub mod markup;
mod node;

pub use block::{
    is_raw_text_tag, is_rcdata_tag, is_void_tag, BlockKind, ListMarker, HARD_BREAK_TAG,
};
pub use node::{for_each_heading, ContentNode, Element, TITLE_ATTR};

use crate::error::Result;

/// The linear content of one post, as injected into its container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentTree {
    /// Logical identifier of the content (its source path)
    pub source: String,
    /// Top-level children in document order
    pub nodes: Vec<ContentNode>,
}

impl ContentTree {
    pub fn new(source: impl Into<String>, nodes: Vec<ContentNode>) -> Self {
        Self {
            source: source.into(),
            nodes,
        }
    }

    /// Parse a post body fragment
    pub fn parse(source: impl Into<String>, markup: &str) -> Result<Self> {
        Ok(Self::new(source, markup::parse_fragment(markup)?))
    }

    /// Serialize the top-level children back to markup
    pub fn to_markup(&self) -> String {
        markup::to_markup(&self.nodes)
    }

    /// Check if the tree has no visible content
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|node| node.is_blank_text())
    }

    /// Give every heading a stable `data-title` holding its final text
    pub fn stamp_heading_titles(&mut self) {
        for_each_heading(&mut self.nodes, &mut |el| el.stamp_title());
    }
}
