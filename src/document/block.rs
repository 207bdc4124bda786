//! Block-level element classification

/// Type of list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListMarker {
    Bullet,
    Numbered,
}

/// The kind of an indivisible display block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    /// Regular paragraph (also the wrapper for coerced inline content)
    #[default]
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    /// Whole list
    List { marker: ListMarker },
    /// List item appearing outside a list
    ListItem,
    /// Preformatted code
    CodeBlock,
    /// Block quotation
    Quote,
    /// Figure with optional caption
    Figure,
    /// Replaced content with intrinsic size (img, svg, canvas, video, iframe)
    Image,
    /// Table
    Table,
    /// Generic block container
    Container,
}

impl BlockKind {
    /// Classify a lowercase tag name. Returns `None` for inline elements
    /// and for the hard-break marker.
    pub fn classify(tag: &str) -> Option<Self> {
        let kind = match tag {
            "p" => BlockKind::Paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => BlockKind::Heading {
                level: tag.as_bytes()[1] - b'0',
            },
            "ul" => BlockKind::List {
                marker: ListMarker::Bullet,
            },
            "ol" => BlockKind::List {
                marker: ListMarker::Numbered,
            },
            "li" => BlockKind::ListItem,
            "pre" => BlockKind::CodeBlock,
            "blockquote" => BlockKind::Quote,
            "figure" => BlockKind::Figure,
            "img" | "svg" | "canvas" | "video" | "iframe" => BlockKind::Image,
            "table" => BlockKind::Table,
            "div" | "section" | "article" | "aside" | "header" | "footer" | "nav" | "main"
            | "address" | "hgroup" | "details" | "dl" | "math" => BlockKind::Container,
            _ => return None,
        };
        Some(kind)
    }

    /// Get the line height multiplier for this block kind
    pub fn line_height_multiplier(&self) -> f32 {
        match self {
            BlockKind::Heading { level } => match level {
                1 => 1.5,
                2 => 1.4,
                3 => 1.3,
                _ => 1.2,
            },
            _ => 1.0,
        }
    }

    /// Get the spacing after this block (in line heights)
    pub fn spacing_after(&self) -> f32 {
        match self {
            BlockKind::Paragraph | BlockKind::List { .. } | BlockKind::Table => 1.0,
            BlockKind::Heading { .. } => 0.5,
            BlockKind::ListItem => 0.25,
            BlockKind::CodeBlock | BlockKind::Quote | BlockKind::Figure | BlockKind::Image => 1.0,
            BlockKind::Container => 0.0,
        }
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    /// Whether text inside keeps its line breaks and spacing
    pub fn is_preformatted(&self) -> bool {
        matches!(self, BlockKind::CodeBlock)
    }
}

/// Tag of the hard-break marker separating author sections
pub const HARD_BREAK_TAG: &str = "hr";

/// Elements whose content is raw text up to the matching end tag
pub fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Elements whose content is text up to the matching end tag, with
/// character references still decoded
pub fn is_rcdata_tag(tag: &str) -> bool {
    tag == "textarea"
}

/// Elements that never have children or a closing tag
pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}
