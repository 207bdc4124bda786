//! Page position indicator and edge-tap navigation

/// Page index under a horizontal scroll offset, clamped to the book
pub fn page_at(scroll_left: f32, client_width: f32, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let idx = (scroll_left / client_width.max(1.0)).round() as i64;
    idx.clamp(0, total as i64 - 1) as usize
}

/// Shows `current / total`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIndicator {
    index: usize,
    total: usize,
}

impl PageIndicator {
    pub fn new(total: usize) -> Self {
        Self { index: 0, total }
    }

    /// Zero-based current page
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Recompute from the scroll position. Returns true if the index changed.
    pub fn update(&mut self, scroll_left: f32, client_width: f32) -> bool {
        let index = page_at(scroll_left, client_width, self.total);
        let changed = index != self.index;
        self.index = index;
        changed
    }

    pub fn text(&self) -> String {
        if self.total == 0 {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.index + 1, self.total)
    }
}

/// Where a tap landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Previous,
    Next,
    Content,
}

impl TapZone {
    /// Classify a tap at `x` (relative to the book's left edge)
    pub fn classify(x: f32, width: f32, zone_ratio: f32) -> Self {
        if x < width * zone_ratio {
            TapZone::Previous
        } else if x > width * (1.0 - zone_ratio) {
            TapZone::Next
        } else {
            TapZone::Content
        }
    }

    pub fn delta(&self) -> i64 {
        match self {
            TapZone::Previous => -1,
            TapZone::Next => 1,
            TapZone::Content => 0,
        }
    }
}

/// A smooth-scroll destination for the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTarget {
    pub page: usize,
    /// Horizontal offset of the target page
    pub left: f32,
}

/// Page `delta` pages away from the one under `scroll_left`, clamped
pub fn snap_target(scroll_left: f32, client_width: f32, delta: i64, total: usize) -> ScrollTarget {
    let width = client_width.max(1.0);
    let current = (scroll_left / width).round() as i64;
    let page = (current + delta).clamp(0, (total as i64 - 1).max(0)) as usize;
    ScrollTarget {
        page,
        left: page as f32 * client_width,
    }
}
