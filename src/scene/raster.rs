use std::{io::Cursor, path::Path, sync::Arc};

use anyhow::Context;

use crate::foundation::error::{FlowError, FlowResult};

/// Largest raster edge accepted, in pixels.
const MAX_DIM: u32 = 16_384;

/// A rasterized scene, straight (non-premultiplied) RGBA8.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

fn options() -> usvg::Options<'static> {
    let mut opts = usvg::Options::default();
    Arc::make_mut(&mut opts.fontdb).load_system_fonts();
    opts
}

fn to_px(v: f32, scale: f32) -> FlowResult<u32> {
    let px = (v * scale).ceil();
    if !px.is_finite() || px < 1.0 {
        return Err(FlowError::render("svg has invalid width/height"));
    }
    let px = px as u32;
    if px > MAX_DIM {
        return Err(FlowError::render(format!(
            "raster size too large: {px}px (max {MAX_DIM})"
        )));
    }
    Ok(px)
}

/// Rasterize an SVG document at `scale` device pixels per user unit.
pub fn rasterize(svg: &str, scale: f32) -> FlowResult<Frame> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FlowError::validation("raster scale must be finite and > 0"));
    }
    let tree = usvg::Tree::from_data(svg.as_bytes(), &options()).context("parse svg tree")?;
    let size = tree.size();
    let width = to_px(size.width(), scale)?;
    let height = to_px(size.height(), scale)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| FlowError::render("failed to allocate pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let mut data = pixmap.take();
    demultiply_rgba8_in_place(&mut data);
    tracing::debug!(width, height, "rasterized scene");
    Ok(Frame {
        width,
        height,
        data,
    })
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Encode a frame as PNG bytes.
pub fn encode_png(frame: &Frame) -> FlowResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| FlowError::render("frame buffer does not match its dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Rasterize `svg` straight to PNG bytes.
pub fn render_png(svg: &str, scale: f32) -> FlowResult<Vec<u8>> {
    encode_png(&rasterize(svg, scale)?)
}

/// Rasterize `svg` and write it to `out` as PNG, creating parent directories.
pub fn save_png(svg: &str, scale: f32, out: &Path) -> FlowResult<()> {
    let frame = rasterize(svg, scale)?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/raster.rs"]
mod tests;
