//! Book-pager: viewport-sized pagination for flowed post content
//!
//! This crate turns a post body into a sequence of sheets that each fit
//! the viewport:
//! - Hard breaks (`<hr>`) split content into sections
//! - A heading is always kept on the same sheet as the block after it
//! - Blocks are never split; an oversize block gets a sheet of its own
//! - Resize and load events are debounced into a single reflow

pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod reflow;
pub mod render;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::{JsMeasurer, WasmBook};

// Re-export primary types
pub use config::BookConfig;
pub use document::{BlockKind, ContentNode, ContentTree, Element, ListMarker};
pub use error::{Error, Result};
pub use layout::{paginate, Measurer, MetricsMeasurer, Page, PageBudget, Viewport};
pub use reflow::{ContentReady, ReflowController, ReflowState, ReflowTrigger};
pub use render::{Book, PageIndicator, ScrollTarget, Sheet, TapZone};

/// Parse `markup` and paginate it with the native measurer.
///
/// Returns `Ok(None)` when book mode does not apply (wide viewport or
/// blank content).
pub fn paginate_markup(
    source: &str,
    markup: &str,
    viewport: &Viewport,
    config: &BookConfig,
) -> Result<Option<Book>> {
    config.validate()?;
    let tree = ContentTree::parse(source, markup)?;
    let mut controller = ReflowController::new(config.clone());
    let mut measurer = MetricsMeasurer::default();
    controller.enable(tree, viewport, &mut measurer)?;
    Ok(match controller.state() {
        ReflowState::Paginated => controller.book().cloned(),
        _ => None,
    })
}
