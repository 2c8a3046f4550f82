//! Imaging assembly — the thin collaborator that turns the core's RGBA
//! frame buffers into a sprite sheet, optional per-frame PNGs, and an
//! optional animated GIF (`spec.md` §6.3, `SPEC_FULL.md` §4.6).
//!
//! This module is intentionally small: it depends on the core only
//! through `validate`, `resolve`, and `render_frame`, and never reaches
//! back into layer/op internals.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use image::{imageops::FilterType, Delay, Frame as GifFrame, RgbaImage};
use serde::Serialize;

use crate::color::hex_to_rgba;
use crate::document::Document;
use crate::error::{DecodeError, RenderError};
use crate::{resolve, validate};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("document has outstanding validation diagnostics")]
    Invalid(Vec<validate::Diagnostic>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    Horizontal,
    Grid { cols: u32 },
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub scale: u32,
    pub layout: Layout,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions { scale: 1, layout: Layout::Horizontal }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct AnimationMeta {
    pub frames: Vec<usize>,
    #[serde(rename = "loop")]
    pub loop_: bool,
    #[serde(rename = "frameDurations")]
    pub frame_durations: Vec<u32>,
}

#[derive(Serialize, Debug, Clone)]
pub struct SpriteMeta {
    pub sprite: String,
    #[serde(rename = "frameWidth")]
    pub frame_width: u32,
    #[serde(rename = "frameHeight")]
    pub frame_height: u32,
    #[serde(rename = "totalFrames")]
    pub total_frames: usize,
    pub scale: u32,
    pub layout: String,
    pub animations: BTreeMap<String, AnimationMeta>,
}

pub struct RenderedSprite {
    pub frames: Vec<RgbaImage>,
    pub sheet: RgbaImage,
    pub frame_durations_ms: Vec<u32>,
    pub meta: SpriteMeta,
}

fn buf_to_image(buf: &[i32], w: u32, h: u32, palette: &[image::Rgba<u8>]) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for (i, px) in img.pixels_mut().enumerate() {
        let idx = buf[i].max(0) as usize;
        *px = palette[idx.min(palette.len() - 1)];
    }
    img
}

fn assemble_sheet(frames: &[RgbaImage], w: u32, h: u32, layout: Layout) -> RgbaImage {
    match layout {
        Layout::Horizontal => {
            let mut sheet = RgbaImage::new(w * frames.len().max(1) as u32, h);
            for (i, frame) in frames.iter().enumerate() {
                image::imageops::overlay(&mut sheet, frame, (i as u32 * w) as i64, 0);
            }
            sheet
        }
        Layout::Grid { cols } => {
            let cols = cols.max(1);
            let rows = (frames.len() as u32 + cols - 1) / cols;
            let mut sheet = RgbaImage::new(w * cols, h * rows.max(1));
            for (i, frame) in frames.iter().enumerate() {
                let i = i as u32;
                let (col, row) = (i % cols, i / cols);
                image::imageops::overlay(&mut sheet, frame, (col * w) as i64, (row * h) as i64);
            }
            sheet
        }
    }
}

fn scale_nearest(img: &RgbaImage, scale: u32) -> RgbaImage {
    if scale <= 1 {
        return img.clone();
    }
    image::imageops::resize(img, img.width() * scale, img.height() * scale, FilterType::Nearest)
}

/// Renders a full sprite: validate (strict = false) → resolve → render
/// every frame → assemble the sheet and animation metadata.
///
/// Returns `PipelineError::Invalid` with the full diagnostic list if the
/// document does not pass validation — callers that already validated
/// (e.g. the CLI, which reports diagnostics itself) can ignore this
/// variant in practice by validating up front.
pub fn render_sprite(doc: &Document, name: &str, opts: &RenderOptions) -> Result<RenderedSprite, PipelineError> {
    let diagnostics = validate::validate(doc, None, false);
    if !diagnostics.is_empty() {
        return Err(PipelineError::Invalid(diagnostics));
    }

    let canvas = doc.canvas.as_ref().expect("validated document has a canvas");
    let w = canvas.w.as_i64().unwrap_or(0) as u32;
    let h = canvas.h.as_i64().unwrap_or(0) as u32;

    let mut palette = Vec::with_capacity(doc.palette.len());
    for c in &doc.palette {
        let rgba = hex_to_rgba(c.as_str().unwrap_or_default())?;
        palette.push(image::Rgba([rgba.r, rgba.g, rgba.b, rgba.a]));
    }

    let resolved = resolve::resolve(doc);
    let mut frames = Vec::with_capacity(resolved.len());
    let mut frame_durations_ms = Vec::with_capacity(resolved.len());

    for (i, ops) in resolved.iter().enumerate() {
        let buf = crate::interp::render_frame(ops, w as i64, h as i64)?;
        frames.push(buf_to_image(&buf, w, h, &palette));
        frame_durations_ms.push(doc.frames[i].duration_ms());
    }

    let sheet = scale_nearest(&assemble_sheet(&frames, w, h, opts.layout), opts.scale);

    let mut animations = BTreeMap::new();
    for (anim_name, anim) in &doc.animations {
        let indices: Vec<usize> = anim.frames.iter().filter_map(|v| v.as_i64()).map(|i| i as usize).collect();
        let durations = indices.iter().filter(|&&i| i < frame_durations_ms.len()).map(|&i| frame_durations_ms[i]).collect();
        animations.insert(anim_name.clone(), AnimationMeta { frames: indices, loop_: anim.r#loop, frame_durations: durations });
    }

    let meta = SpriteMeta {
        sprite: name.to_string(),
        frame_width: w,
        frame_height: h,
        total_frames: frames.len(),
        scale: opts.scale,
        layout: match opts.layout {
            Layout::Horizontal => "horizontal".to_string(),
            Layout::Grid { .. } => "grid".to_string(),
        },
        animations,
    };

    Ok(RenderedSprite { frames, sheet, frame_durations_ms, meta })
}

/// Writes an animated GIF using each frame's resolved duration
/// (`spec.md` §6.3's "frame-duration metadata"), nearest-neighbour scaled.
pub fn encode_gif<W: Write>(writer: W, frames: &[RgbaImage], durations_ms: &[u32], scale: u32) -> Result<(), image::ImageError> {
    let mut encoder = image::codecs::gif::GifEncoder::new(writer);
    for (frame, &ms) in frames.iter().zip(durations_ms) {
        let scaled = scale_nearest(frame, scale);
        let delay = Delay::from_saturating_duration(Duration::from_millis(ms as u64));
        encoder.encode_frame(GifFrame::from_parts(scaled, 0, 0, delay))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Document {
        Document::from_slice(
            br#"{"format":"spriteops","canvas":{"w":2,"h":2},"palette":["#00000000","#ff0000"],
                "frames":[{"ops":[["clear",0],["rect_fill",1,0,0,2,2]]}],
                "animations":{"idle":{"frames":[0],"loop":true}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn renders_single_frame_sheet() {
        let doc = sample_doc();
        let rendered = render_sprite(&doc, "sprite", &RenderOptions::default()).unwrap();
        assert_eq!(rendered.frames.len(), 1);
        assert_eq!(rendered.sheet.width(), 2);
        assert_eq!(rendered.sheet.height(), 2);
        assert_eq!(rendered.meta.total_frames, 1);
        assert_eq!(rendered.meta.animations["idle"].frames, vec![0]);
    }

    #[test]
    fn invalid_document_reports_diagnostics() {
        let doc = Document::from_slice(br#"{"format":"bogus","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[{"ops":[]}]}"#).unwrap();
        let err = render_sprite(&doc, "x", &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Invalid(_)));
    }

    #[test]
    fn grid_layout_sizes_sheet_by_columns() {
        let doc = Document::from_slice(
            br#"{"format":"spriteops","canvas":{"w":2,"h":2},"palette":["#000000","#ffffff"],
                "frames":[{"ops":[["clear",0]]},{"ops":[["clear",1]]},{"ops":[["clear",0]]}]}"#,
        )
        .unwrap();
        let opts = RenderOptions { scale: 1, layout: Layout::Grid { cols: 2 } };
        let rendered = render_sprite(&doc, "s", &opts).unwrap();
        assert_eq!(rendered.sheet.width(), 4);
        assert_eq!(rendered.sheet.height(), 4);
    }
}
