//! Print layout: metrics, wrapping, tables and pagination.
//!
//! Everything here works in millimetres on a page whose origin is the top
//! left corner. The output is a [`PageSet`] display list that the PDF
//! writer serializes without making further layout decisions.

mod flow;
mod metrics;
mod page;
mod style;
mod table;
mod wrap;

pub use flow::{DrawOp, FlowEngine, Page, PageSet};
pub use metrics::{FixedWidthMetrics, FontVariant, HelveticaMetrics, TextMeasure, MM_PER_PT};
pub use page::{LayoutCursor, PageSettings};
pub use style::{Color, HeadingStyle, PrintStyle};
pub use table::{RowLayout, TableLayout, TableLayoutEngine};
pub use wrap::{wrap_text, Line, RunWrapper, Segment};
