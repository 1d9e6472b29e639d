//! Drawing on top of `vello_cpu`: a canvas wrapper, pixmap helpers and text.

pub mod canvas;
pub mod surface;
pub mod text;

pub use canvas::{Canvas, Rgba8};
pub use surface::{crop_to_rgba_image, load_image, pixmap_from_frame, pixmap_to_rgba_image};
pub use text::{FontRenderer, HAlign, ParleyFont, VAlign, draw_text};
