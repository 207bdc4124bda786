//! Post body markup: fragment parsing and serialization
//!
//! Post bodies are HTML fragments written by hand, so the parser is
//! lenient: void elements need no closing tag, unquoted and valueless
//! attributes are accepted, stray end tags are ignored, unclosed
//! elements are closed at end of input and a bare `&` is plain text.
//! `<script>` and `<style>` hold raw text up to their end tag, exactly as
//! a browser serializes them. Comments, processing instructions and
//! doctypes are dropped.

use crate::document::block::{is_raw_text_tag, is_rcdata_tag, is_void_tag};
use crate::document::node::{ContentNode, Element};
use crate::error::{Error, Result};
use quick_xml::escape::{escape, resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse a markup fragment into top-level nodes
pub fn parse_fragment(markup: &str) -> Result<Vec<ContentNode>> {
    let mut reader = fragment_reader(markup);
    // Offset of the reader's input within `markup`
    let mut base = 0;
    let mut root: Vec<ContentNode> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                flush_text(&mut text, &mut stack, &mut root);
                let mut el = start_element(&e)?;
                if is_void_tag(&el.tag) {
                    append(el.into(), &mut stack, &mut root);
                } else if is_raw_text_tag(&el.tag) || is_rcdata_tag(&el.tag) {
                    let start = base + reader.buffer_position() as usize;
                    let (raw, resume) = raw_text(markup, start, &el.tag);
                    if !raw.is_empty() {
                        let text = if is_rcdata_tag(&el.tag) {
                            decode_references(raw)
                        } else {
                            raw.to_string()
                        };
                        el.children.push(ContentNode::Text(text));
                    }
                    append(el.into(), &mut stack, &mut root);
                    // The reader cannot skip ahead; resume after the end tag
                    base = resume;
                    reader = fragment_reader(&markup[resume..]);
                } else {
                    stack.push(el);
                }
            }
            Ok(Event::Empty(e)) => {
                flush_text(&mut text, &mut stack, &mut root);
                let el = start_element(&e)?;
                append(el.into(), &mut stack, &mut root);
            }
            Ok(Event::End(e)) => {
                flush_text(&mut text, &mut stack, &mut root);
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if is_void_tag(&tag) {
                    continue;
                }
                // Close everything opened after the matching start tag
                if let Some(pos) = stack.iter().rposition(|el| el.tag == tag) {
                    while stack.len() > pos {
                        close_top(&mut stack, &mut root);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let decoded = e
                    .decode()
                    .map_err(|err| Error::Markup(format!("text decode: {err}")))?;
                text.push_str(&decoded);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::GeneralRef(e)) => {
                let name = e
                    .decode()
                    .map_err(|err| Error::Markup(format!("entity decode: {err}")))?;
                resolve_reference(&name, &mut text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Error::Markup(format!(
                    "at byte {}: {err}",
                    base as u64 + reader.error_position()
                )))
            }
        }
    }

    flush_text(&mut text, &mut stack, &mut root);
    while !stack.is_empty() {
        close_top(&mut stack, &mut root);
    }
    Ok(root)
}

/// Serialize nodes back to markup
pub fn to_markup(nodes: &[ContentNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Serialize a borrowed candidate set, as handed to a measurement backend
pub fn refs_to_markup(nodes: &[&ContentNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Append one node's markup to `out`
pub fn write_node(out: &mut String, node: &ContentNode) {
    match node {
        ContentNode::Text(text) => out.push_str(&escape(text.as_str())),
        ContentNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value.as_str()));
                out.push('"');
            }
            out.push('>');
            if is_void_tag(&el.tag) {
                return;
            }
            for child in &el.children {
                match child {
                    ContentNode::Text(text) if is_raw_text_tag(&el.tag) => out.push_str(text),
                    _ => write_node(out, child),
                }
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn fragment_reader(markup: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_dangling_amp = true;
    reader
}

/// Text from `start` up to the end tag of `tag` (any case), and the
/// offset just past that end tag. Runs to end of input when unclosed.
fn raw_text<'a>(markup: &'a str, start: usize, tag: &str) -> (&'a str, usize) {
    let rest = &markup[start..];
    // ASCII lowercasing keeps byte offsets
    let lower = rest.to_ascii_lowercase();
    let close = format!("</{tag}");
    let mut from = 0;
    while let Some(found) = lower[from..].find(&close) {
        let at = from + found;
        let after = at + close.len();
        match lower.as_bytes().get(after) {
            Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r') | None => {
                let end = lower[after..].find('>').map_or(lower.len(), |i| after + i + 1);
                return (&rest[..at], start + end);
            }
            _ => from = after,
        }
    }
    (rest, markup.len())
}

fn decode_references(raw: &str) -> String {
    match unescape_with(raw, resolve_html_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn start_element(e: &BytesStart) -> Result<Element> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let mut el = Element::new(&tag);
    for attr in e.html_attributes() {
        let attr = attr.map_err(|err| Error::Markup(format!("attribute in <{tag}>: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = match unescape_with(&raw, resolve_html_entity) {
            Ok(value) => value.into_owned(),
            Err(_) => raw.into_owned(),
        };
        el.attrs.push((key, value));
    }
    Ok(el)
}

fn resolve_reference(name: &str, text: &mut String) {
    let reference = format!("&{name};");
    match unescape_with(&reference, resolve_html_entity) {
        Ok(resolved) => text.push_str(&resolved),
        // Unknown entity: keep it visible rather than dropping content
        Err(_) => text.push_str(&reference),
    }
}

fn resolve_html_entity(name: &str) -> Option<&'static str> {
    if let Some(resolved) = resolve_predefined_entity(name) {
        return Some(resolved);
    }
    let resolved = match name {
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "middot" => "\u{b7}",
        "times" => "\u{d7}",
        "minus" => "\u{2212}",
        "copy" => "\u{a9}",
        "deg" => "\u{b0}",
        _ => return None,
    };
    Some(resolved)
}

fn append(node: ContentNode, stack: &mut [Element], root: &mut Vec<ContentNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

fn close_top(stack: &mut Vec<Element>, root: &mut Vec<ContentNode>) {
    if let Some(el) = stack.pop() {
        append(el.into(), stack, root);
    }
}

fn flush_text(text: &mut String, stack: &mut [Element], root: &mut Vec<ContentNode>) {
    if !text.is_empty() {
        append(ContentNode::Text(std::mem::take(text)), stack, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks_and_text() {
        let nodes = parse_fragment("<h1>Title</h1>\n<p>One <em>two</em></p>").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].as_element().unwrap().tag, "h1");
        assert!(nodes[1].is_blank_text());
        assert_eq!(nodes[2].text_content(), "One two");
    }

    #[test]
    fn test_void_elements_without_close() {
        let nodes = parse_fragment("<p>a<br>b</p><hr><img src=cat.png width=640 height=480>")
            .unwrap();
        assert_eq!(nodes.len(), 3);
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.children.len(), 3);
        assert!(nodes[1].is_hard_break());
        let img = nodes[2].as_element().unwrap();
        assert_eq!(img.attr("src"), Some("cat.png"));
        assert_eq!(img.attr_px("height"), Some(480.0));
    }

    #[test]
    fn test_entities() {
        let nodes = parse_fragment("<p>a &amp; b&nbsp;&#233; &bogus;</p>").unwrap();
        assert_eq!(nodes[0].text_content(), "a & b\u{a0}\u{e9} &bogus;");
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let nodes = parse_fragment("<div><p>open</div></span><p>tail").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text_content(), "open");
        assert_eq!(nodes[1].text_content(), "tail");
    }

    #[test]
    fn test_comments_dropped() {
        let nodes = parse_fragment("<!-- note --><p>x</p>").unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_serialize_round_trip() {
        let source = "<h2 data-title=\"A &quot;quote&quot;\">A \"quote\"</h2><p>x &lt; y</p><hr><pre>fn main() {\n}</pre><img src=\"a.png\">";
        let nodes = parse_fragment(source).unwrap();
        let markup = to_markup(&nodes);
        assert_eq!(parse_fragment(&markup).unwrap(), nodes);
        assert!(markup.contains("<img src=\"a.png\">"));
        assert!(!markup.contains("</img>"));
    }

    #[test]
    fn test_script_and_style_are_raw_text() {
        let source = "<p>x</p><script>if (a < b && c) { run(); }</script><style>p > a { color: red }</style><p>y</p>";
        let nodes = parse_fragment(source).unwrap();
        assert_eq!(nodes.len(), 4);
        let script = nodes[1].as_element().unwrap();
        assert_eq!(script.children, vec![ContentNode::text("if (a < b && c) { run(); }")]);
        assert_eq!(nodes[3].text_content(), "y");
        assert_eq!(to_markup(&nodes), source);
    }

    #[test]
    fn test_raw_text_end_tag_any_case() {
        let nodes = parse_fragment("<SCRIPT>x = '</scripts>';</Script ><p>after</p>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text_content(), "x = '</scripts>';");
        assert_eq!(nodes[1].text_content(), "after");
    }

    #[test]
    fn test_unclosed_script_runs_to_end() {
        let nodes = parse_fragment("<p>a</p><script>let b = 1 < 2").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].text_content(), "let b = 1 < 2");
    }

    #[test]
    fn test_textarea_decodes_references_only() {
        let nodes = parse_fragment("<textarea>a &lt; <b>b</b></textarea><p>c</p>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text_content(), "a < <b>b</b>");
    }

    #[test]
    fn test_bare_ampersand_is_text() {
        let nodes = parse_fragment("<p>AT&T rocks & rolls</p>").unwrap();
        assert_eq!(nodes[0].text_content(), "AT&T rocks & rolls");
        assert_eq!(to_markup(&nodes), "<p>AT&amp;T rocks &amp; rolls</p>");
    }
}
