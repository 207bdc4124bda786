//! Sectionizer: split linear content on hard breaks

use crate::document::{ContentNode, Element, HARD_BREAK_TAG};

/// An ordered, non-empty run of nodes between hard breaks
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub nodes: Vec<ContentNode>,
}

impl Section {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Split top-level nodes into sections, consuming the break markers.
///
/// Runs with nothing but whitespace between breaks (including leading and
/// trailing breaks) produce no section.
pub fn sectionize(nodes: Vec<ContentNode>) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut run = Vec::new();

    for node in nodes {
        if node.is_hard_break() {
            close_run(&mut sections, &mut run);
        } else {
            run.push(node);
        }
    }
    close_run(&mut sections, &mut run);

    sections
}

/// Inverse of [`sectionize`]: concatenate sections with one break between
/// consecutive sections.
pub fn rejoin(sections: Vec<Section>) -> Vec<ContentNode> {
    let mut nodes = Vec::new();
    for (idx, section) in sections.into_iter().enumerate() {
        if idx > 0 {
            nodes.push(Element::new(HARD_BREAK_TAG).into());
        }
        nodes.extend(section.nodes);
    }
    nodes
}

fn close_run(sections: &mut Vec<Section>, run: &mut Vec<ContentNode>) {
    if run.iter().any(|node| !node.is_blank_text()) {
        sections.push(Section {
            nodes: std::mem::take(run),
        });
    } else {
        run.clear();
    }
}
