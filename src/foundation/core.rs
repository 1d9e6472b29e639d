use crate::foundation::error::{ReelError, ReelResult};

pub use kurbo::{Point, Rect};

/// Size of the drawable area in physical pixels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::validation("viewport width/height must be non-zero"));
        }
        // vello_cpu pixmaps are addressed with u16 dimensions.
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(ReelError::validation(format!(
                "viewport {width}x{height} exceeds {}x{}",
                u16::MAX,
                u16::MAX
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// Scale a fraction of the viewport height to pixels.
    pub fn pixh(self, fraction: f64) -> f64 {
        self.height_f64() * fraction
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width_f64(), self.height_f64())
    }
}

/// Rectangle in viewport fractions: `x`/`width` are fractions of the viewport
/// width, `y`/`height` fractions of the viewport height.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(self) -> f64 {
        self.y
    }

    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    pub fn union(self, other: Self) -> Self {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn to_pixels(self, viewport: Viewport) -> Rect {
        let w = viewport.width_f64();
        let h = viewport.height_f64();
        Rect::new(
            self.x * w,
            self.y * h,
            (self.x + self.width) * w,
            self.bottom() * h,
        )
    }

    pub fn validate(self, what: &str) -> ReelResult<()> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(ReelError::validation(format!(
                "{what} must have finite coordinates and a positive size"
            )));
        }
        if self.x < 0.0 || self.y < 0.0 || self.x + self.width > 1.0 || self.bottom() > 1.0 {
            return Err(ReelError::validation(format!(
                "{what} must lie within the unit square"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_rejects_zero_and_oversized() {
        assert!(Viewport::new(0, 10).is_err());
        assert!(Viewport::new(10, 0).is_err());
        assert!(Viewport::new(70_000, 10).is_err());
        assert_eq!(Viewport::new(640, 480).unwrap().pixh(0.5), 240.0);
    }

    #[test]
    fn union_covers_both_bands() {
        let thumbs = NormRect::new(0.0, 0.45, 1.0, 0.05);
        let graph = NormRect::new(0.0, 0.5, 1.0, 0.2);
        let u = thumbs.union(graph);
        assert!((u.top() - 0.45).abs() < 1e-12);
        assert!((u.bottom() - 0.7).abs() < 1e-12);
        assert_eq!(u.width, 1.0);
    }

    #[test]
    fn to_pixels_scales_each_axis() {
        let vp = Viewport::new(1000, 800).unwrap();
        let r = NormRect::new(0.0, 0.5, 1.0, 0.25).to_pixels(vp);
        assert_eq!(r, Rect::new(0.0, 400.0, 1000.0, 600.0));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(NormRect::new(0.0, 0.9, 1.0, 0.2).validate("r").is_err());
        assert!(NormRect::new(0.0, 0.1, 0.0, 0.2).validate("r").is_err());
        assert!(NormRect::new(0.0, 0.1, 1.0, 0.2).validate("r").is_ok());
    }
}
