//! The post-play report: thumbnail strip, score graph and scrub preview.

pub mod cache;
pub mod layout;
pub mod render;

pub use cache::{ReportCache, ReportKey};
pub use layout::{GRAPH_LINE_WIDTH, ThumbStrip, graph_domain, graph_point, grid_lines, scrub_frame, scrub_rect};
pub use render::{draw_scrub_preview, render_report};
