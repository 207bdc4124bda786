//! Pagination pipeline and its stages

mod engine;
pub mod font;
mod line_break;
mod measure;
mod normalize;
mod pagination;
mod section;
mod unit;

pub use engine::{paginate, Viewport};
pub use font::FontMetrics;
pub use line_break::{collapse_whitespace, LineBreaker};
pub use measure::{MeasureSession, Measurer, MetricsMeasurer, HEIGHT_ATTR, INDENT_WIDTH};
pub use normalize::{normalize, normalize_nodes, Block};
pub use pagination::{assemble, pack, Packer, Page, PageBudget, PageSpan};
pub use section::{rejoin, sectionize, Section};
pub use unit::{build_units, Unit};
