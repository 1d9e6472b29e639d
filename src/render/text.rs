use std::{borrow::Cow, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{Point, Rect},
        error::{ReelError, ReelResult},
    },
    render::canvas::{Canvas, Rgba8},
};

/// Text measurement and drawing.
///
/// Positions name the top-left corner of the laid-out text.
pub trait FontRenderer {
    fn bounding_box(&mut self, text: &str, size_px: f32, x: f64, y: f64) -> ReelResult<Rect>;

    fn draw(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        size_px: f32,
        x: f64,
        y: f64,
        color: Rgba8,
    ) -> ReelResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Draw `text` anchored at `(x, y)` and return the rectangle it occupies.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    font: &mut dyn FontRenderer,
    canvas: &mut Canvas,
    text: &str,
    size_px: f32,
    x: f64,
    y: f64,
    align: (HAlign, VAlign),
    color: Rgba8,
) -> ReelResult<Rect> {
    let bbox = font.bounding_box(text, size_px, 0.0, 0.0)?;
    let left = match align.0 {
        HAlign::Left => x,
        HAlign::Center => x - bbox.width() / 2.0,
        HAlign::Right => x - bbox.width(),
    };
    let top = match align.1 {
        VAlign::Top => y,
        VAlign::Center => y - bbox.height() / 2.0,
        VAlign::Bottom => y - bbox.height(),
    };
    font.draw(canvas, text, size_px, left, top, color)?;
    Ok(Rect::new(
        left,
        top,
        left + bbox.width(),
        top + bbox.height(),
    ))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrush;

/// [`FontRenderer`] that shapes with Parley and fills glyphs with vello_cpu.
pub struct ParleyFont {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl ParleyFont {
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(font_bytes: Vec<u8>) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::render("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(&mut self, text: &str, size_px: f32) -> ReelResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation("text size must be finite and > 0"));
        }
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl FontRenderer for ParleyFont {
    fn bounding_box(&mut self, text: &str, size_px: f32, x: f64, y: f64) -> ReelResult<Rect> {
        let layout = self.layout(text, size_px)?;
        Ok(Rect::new(
            x,
            y,
            x + f64::from(layout.width()),
            y + f64::from(layout.height()),
        ))
    }

    fn draw(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        size_px: f32,
        x: f64,
        y: f64,
        color: Rgba8,
    ) -> ReelResult<()> {
        let layout = self.layout(text, size_px)?;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs: Vec<vello_cpu::Glyph> = run
                    .glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                canvas.fill_glyphs(
                    &self.font,
                    run.run().font_size(),
                    glyphs,
                    Point::new(x, y),
                    color,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Monospace stand-in: every glyph is `size/2` wide and `size` tall.
    struct BoxFont {
        drawn: Vec<(String, f64, f64)>,
    }

    impl FontRenderer for BoxFont {
        fn bounding_box(&mut self, text: &str, size_px: f32, x: f64, y: f64) -> ReelResult<Rect> {
            let w = text.chars().count() as f64 * f64::from(size_px) / 2.0;
            Ok(Rect::new(x, y, x + w, y + f64::from(size_px)))
        }

        fn draw(
            &mut self,
            _canvas: &mut Canvas,
            text: &str,
            _size_px: f32,
            x: f64,
            y: f64,
            _color: Rgba8,
        ) -> ReelResult<()> {
            self.drawn.push((text.to_string(), x, y));
            Ok(())
        }
    }

    #[test]
    fn centered_text_is_offset_by_half_its_box() {
        let mut font = BoxFont { drawn: Vec::new() };
        let mut canvas = Canvas::new(crate::foundation::core::Viewport::new(100, 100).unwrap());
        let r = draw_text(
            &mut font,
            &mut canvas,
            "abcd",
            10.0,
            50.0,
            40.0,
            (HAlign::Center, VAlign::Center),
            Rgba8::WHITE,
        )
        .unwrap();
        assert_eq!(r, Rect::new(40.0, 35.0, 60.0, 45.0));
        assert_eq!(font.drawn, vec![("abcd".to_string(), 40.0, 35.0)]);
    }

    #[test]
    fn right_bottom_alignment_ends_at_anchor() {
        let mut font = BoxFont { drawn: Vec::new() };
        let mut canvas = Canvas::new(crate::foundation::core::Viewport::new(100, 100).unwrap());
        let r = draw_text(
            &mut font,
            &mut canvas,
            "ab",
            10.0,
            50.0,
            40.0,
            (HAlign::Right, VAlign::Bottom),
            Rgba8::WHITE,
        )
        .unwrap();
        assert_eq!(r.x1, 50.0);
        assert_eq!(r.y1, 40.0);
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(ParleyFont::from_bytes(b"not a font".to_vec()).is_err());
    }
}
