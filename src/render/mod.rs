//! Render output: sheets, indicator and tap navigation

mod book;
mod indicator;

pub use book::{Book, Sheet};
pub use indicator::{page_at, snap_target, PageIndicator, ScrollTarget, TapZone};
