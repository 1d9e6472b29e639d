use std::sync::Arc;

use vello_cpu::kurbo::{Affine, BezPath, Stroke};

use crate::foundation::core::{Point, Rect, Viewport};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::gray(255);
    pub const BLACK: Self = Self::gray(0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }

    fn to_cpu(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Immediate-mode drawing into a fresh pixmap of a fixed size.
pub struct Canvas {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
}

impl Canvas {
    pub fn new(viewport: Viewport) -> Self {
        // Viewport::new guarantees both sides fit in u16.
        let width = u16::try_from(viewport.width).unwrap_or(u16::MAX);
        let height = u16::try_from(viewport.height).unwrap_or(u16::MAX);
        Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
        }
    }

    pub fn width(&self) -> f64 {
        f64::from(self.width)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.height)
    }

    pub fn clear(&mut self, color: Rgba8) {
        self.fill_rect(Rect::new(0.0, 0.0, self.width(), self.height()), color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.reset_transforms();
        self.ctx.set_paint(color.to_cpu());
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Rgba8, width: f64) {
        self.reset_transforms();
        self.ctx.set_paint(color.to_cpu());
        self.ctx.set_stroke(Stroke::new(width));
        self.ctx.stroke_rect(&rect_to_cpu(rect));
    }

    pub fn line(&mut self, from: Point, to: Point, color: Rgba8, width: f64) {
        self.polyline(&[from, to], color, width);
    }

    /// Open polyline through `points`. Fewer than two points draws nothing.
    pub fn polyline(&mut self, points: &[Point], color: Rgba8, width: f64) {
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        let mut path = BezPath::new();
        path.move_to(point_to_cpu(*first));
        for p in rest {
            path.line_to(point_to_cpu(*p));
        }
        self.reset_transforms();
        self.ctx.set_paint(color.to_cpu());
        self.ctx.set_stroke(Stroke::new(width));
        self.ctx.stroke_path(&path);
    }

    /// Draw `image` stretched into `dst`.
    pub fn draw_image(&mut self, image: &Arc<vello_cpu::Pixmap>, dst: Rect) {
        let (w, h) = (f64::from(image.width()), f64::from(image.height()));
        if w == 0.0 || h == 0.0 || dst.width() <= 0.0 || dst.height() <= 0.0 {
            return;
        }
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(image.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(
            Affine::translate((dst.x0, dst.y0))
                * Affine::scale_non_uniform(dst.width() / w, dst.height() / h),
        );
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        self.ctx.set_transform(Affine::IDENTITY);
    }

    /// Fill positioned glyphs, offset so the layout's top-left corner lands on `origin`.
    pub fn fill_glyphs(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        font_size: f32,
        glyphs: Vec<vello_cpu::Glyph>,
        origin: Point,
        color: Rgba8,
    ) {
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::translate((origin.x, origin.y)));
        self.ctx.set_paint(color.to_cpu());
        self.ctx
            .glyph_run(font)
            .font_size(font_size)
            .fill_glyphs(glyphs.into_iter());
        self.ctx.set_transform(Affine::IDENTITY);
    }

    /// Rasterize everything drawn so far.
    pub fn finish(mut self) -> vello_cpu::Pixmap {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        pixmap
    }

    fn reset_transforms(&mut self) {
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::IDENTITY);
    }
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}
