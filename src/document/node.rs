//! Owned content nodes

use crate::document::block::{BlockKind, HARD_BREAK_TAG};

/// Attribute holding a heading's final, non-animated text
pub const TITLE_ATTR: &str = "data-title";

/// A node of the post body: an element or a text run.
///
/// Nodes are owned by exactly one container at a time; moving a node
/// between sections and pages is a plain move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentNode {
    Element(Element),
    Text(String),
}

impl ContentNode {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text(text.into())
    }

    /// Create an empty element node
    pub fn element(tag: &str) -> Self {
        ContentNode::Element(Element::new(tag))
    }

    /// Get the element, if this is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            ContentNode::Element(el) => Some(el),
            ContentNode::Text(_) => None,
        }
    }

    /// Whether this is the section separator marker
    pub fn is_hard_break(&self) -> bool {
        matches!(self, ContentNode::Element(el) if el.tag == HARD_BREAK_TAG)
    }

    /// Whether this is text with no visible characters
    pub fn is_blank_text(&self) -> bool {
        matches!(self, ContentNode::Text(text) if text.trim().is_empty())
    }

    /// Block classification; `None` for text and inline elements
    pub fn block_kind(&self) -> Option<BlockKind> {
        self.as_element().and_then(|el| BlockKind::classify(&el.tag))
    }

    /// Concatenated descendant text
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ContentNode::Text(text) => out.push_str(text),
            ContentNode::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for ContentNode {
    fn from(el: Element) -> Self {
        ContentNode::Element(el)
    }
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<ContentNode>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: impl Into<ContentNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append a text child
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(ContentNode::Text(text.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set or replace an attribute, keeping its original position
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Numeric attribute, ignoring a trailing `px`
    pub fn attr_px(&self, name: &str) -> Option<f32> {
        let raw = self.attr(name)?.trim();
        let raw = raw.strip_suffix("px").unwrap_or(raw);
        raw.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0)
    }

    /// Concatenated descendant text
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    pub fn is_heading(&self) -> bool {
        BlockKind::classify(&self.tag).is_some_and(|kind| kind.is_heading())
    }

    /// Record the current text as the heading's canonical title if none is set
    pub fn stamp_title(&mut self) {
        if self.attr(TITLE_ATTR).is_none() {
            let text = self.text_content();
            let text = text.trim();
            if !text.is_empty() {
                self.set_attr(TITLE_ATTR, text);
            }
        }
    }

    /// Replace whatever text is currently shown with the canonical title.
    /// Headings already showing their title keep their inline markup.
    ///
    /// Returns true if the children changed.
    pub fn restore_title(&mut self) -> bool {
        let Some(title) = self.attr(TITLE_ATTR).map(str::to_owned) else {
            return false;
        };
        if self.text_content().trim() == title {
            return false;
        }
        self.children = vec![ContentNode::Text(title)];
        true
    }
}

/// Apply `f` to every heading in `nodes`, depth first
pub fn for_each_heading(nodes: &mut [ContentNode], f: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let ContentNode::Element(el) = node {
            if el.is_heading() {
                f(el);
            } else {
                for_each_heading(&mut el.children, f);
            }
        }
    }
}
