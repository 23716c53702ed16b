//! Trace rendering - pure transforms from sample history to a page

mod trace;
mod html;

pub use trace::{render_trace, Canvas, TraceGeometry, TraceStats, MIN_AMPLITUDE_SCALE, PLACEHOLDER};
pub use html::render_page;
