use std::{path::Path, sync::Arc};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::Rect,
        error::{ReelError, ReelResult},
        math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
    },
    video::VideoFrame,
};

pub(crate) fn pixmap_from_premul(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

pub fn pixmap_from_frame(frame: &VideoFrame) -> ReelResult<Arc<vello_cpu::Pixmap>> {
    pixmap_from_premul(&frame.rgba8_premul, frame.width, frame.height).map(Arc::new)
}

/// Decode a PNG/JPEG from disk into a drawable pixmap.
pub fn load_image(path: &Path) -> ReelResult<Arc<vello_cpu::Pixmap>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let dyn_img = image::load_from_memory(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    pixmap_from_premul(&data, width, height).map(Arc::new)
}

/// Copy a pixmap out as a straight-alpha image.
pub fn pixmap_to_rgba_image(pixmap: &vello_cpu::Pixmap) -> ReelResult<image::RgbaImage> {
    let mut data = pixmap.data_as_u8_slice().to_vec();
    unpremultiply_rgba8_in_place(&mut data);
    image::RgbaImage::from_raw(u32::from(pixmap.width()), u32::from(pixmap.height()), data)
        .ok_or_else(|| ReelError::render("pixmap buffer does not match its dimensions"))
}

/// Region capture: the part of `pixmap` under `region`, clipped to the pixmap.
pub fn crop_to_rgba_image(pixmap: &vello_cpu::Pixmap, region: Rect) -> ReelResult<image::RgbaImage> {
    let full = pixmap_to_rgba_image(pixmap)?;
    let (fw, fh) = (f64::from(full.width()), f64::from(full.height()));
    let x0 = region.x0.clamp(0.0, fw).floor() as u32;
    let y0 = region.y0.clamp(0.0, fh).floor() as u32;
    let x1 = region.x1.clamp(0.0, fw).ceil() as u32;
    let y1 = region.y1.clamp(0.0, fh).ceil() as u32;
    if x1 <= x0 || y1 <= y0 {
        return Err(ReelError::render(format!(
            "capture region {region:?} lies outside the {}x{} frame",
            full.width(),
            full.height()
        )));
    }
    Ok(image::imageops::crop_imm(&full, x0, y0, x1 - x0, y1 - y0).to_image())
}
