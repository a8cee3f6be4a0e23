use std::io::Cursor;

use anyhow::Context as _;
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, ImageDecoder, RgbaImage};

use crate::assemble::quantize::IndexedFrames;
use crate::foundation::error::{StickerError, StickerResult};
use crate::timing::curve::TimingCurve;

/// Pixel payload handed to the encoder.
#[derive(Clone, Copy, Debug)]
pub enum FramePixels<'a> {
    /// Truecolor frames with alpha.
    Rgba(&'a [RgbaImage]),
    /// Palette frames sharing one PLTE/tRNS.
    Indexed(&'a IndexedFrames),
}

impl FramePixels<'_> {
    fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Rgba(frames) => frames.first().map(|f| f.dimensions()),
            Self::Indexed(q) => Some((q.width, q.height)),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Rgba(frames) => frames.len(),
            Self::Indexed(q) => q.indices.len(),
        }
    }
}

/// Encode frames plus per-frame delays into an APNG byte buffer.
///
/// `plays = 0` loops forever. A single frame is written as a plain (static) PNG.
pub fn encode_apng(
    pixels: FramePixels<'_>,
    timing: &TimingCurve,
    plays: u32,
) -> StickerResult<Vec<u8>> {
    let count = pixels.len();
    if count == 0 {
        return Err(StickerError::encode("no frames to encode"));
    }
    if timing.len() != count {
        return Err(StickerError::TimingMismatch {
            expected: count,
            got: timing.len(),
        });
    }
    let Some((width, height)) = pixels.dimensions() else {
        return Err(StickerError::encode("no frames to encode"));
    };
    if width == 0 || height == 0 {
        return Err(StickerError::encode("frames have zero area"));
    }
    let delays = timing
        .durations()
        .iter()
        .map(|&ms| {
            u16::try_from(ms)
                .map_err(|_| StickerError::validation(format!("frame delay {ms} ms exceeds 65535")))
        })
        .collect::<StickerResult<Vec<_>>>()?;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_depth(png::BitDepth::Eight);
        match pixels {
            FramePixels::Rgba(_) => encoder.set_color(png::ColorType::Rgba),
            FramePixels::Indexed(q) => {
                let (plte, trns) = q.png_palette();
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_palette(plte);
                if !trns.is_empty() {
                    encoder.set_trns(trns);
                }
            }
        }
        if count > 1 {
            encoder.set_animated(count as u32, plays)?;
        }
        let mut writer = encoder.write_header()?;
        for (i, delay) in delays.iter().enumerate() {
            if count > 1 {
                writer.set_frame_delay(*delay, 1000)?;
            }
            match pixels {
                FramePixels::Rgba(frames) => {
                    let frame = &frames[i];
                    if frame.dimensions() != (width, height) {
                        return Err(StickerError::encode(format!(
                            "frame {i} is {}x{}, expected {width}x{height}",
                            frame.width(),
                            frame.height()
                        )));
                    }
                    writer.write_image_data(frame.as_raw())?;
                }
                FramePixels::Indexed(q) => writer.write_image_data(&q.indices[i])?,
            }
        }
        writer.finish()?;
    }
    Ok(out)
}

/// Decoded view of an encoded sticker, used for validation and loop scoring.
#[derive(Clone, Debug)]
pub struct DecodedAnimation {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Whether the file carries an acTL chunk.
    pub animated: bool,
    /// Fully composited frames.
    pub frames: Vec<RgbaImage>,
    /// Per-frame delays, rounded to milliseconds.
    pub delays_ms: Vec<u32>,
    /// Size of the encoded file.
    pub byte_size: u64,
}

impl DecodedAnimation {
    /// Sum of all frame delays.
    pub fn total_duration_ms(&self) -> u64 {
        self.delays_ms.iter().map(|&d| u64::from(d)).sum()
    }
}

/// Decode a PNG or APNG from memory into full-canvas RGBA frames.
pub fn decode_apng(bytes: &[u8]) -> StickerResult<DecodedAnimation> {
    let decoder = PngDecoder::new(Cursor::new(bytes)).context("read png header")?;
    let (width, height) = decoder.dimensions();
    let animated = decoder.is_apng().context("inspect png animation control")?;

    let (frames, delays_ms) = if animated {
        let frames = decoder
            .apng()
            .context("open apng frames")?
            .into_frames()
            .collect_frames()
            .context("decode apng frames")?;
        let delays = frames
            .iter()
            .map(|f| {
                let (numer, denom) = f.delay().numer_denom_ms();
                if denom == 0 { 0 } else { (numer + denom / 2) / denom }
            })
            .collect::<Vec<_>>();
        let images = frames.into_iter().map(|f| f.into_buffer()).collect();
        (images, delays)
    } else {
        let image = image::DynamicImage::from_decoder(decoder)
            .context("decode png")?
            .to_rgba8();
        (vec![image], vec![0])
    };

    Ok(DecodedAnimation {
        width,
        height,
        animated,
        frames,
        delays_ms,
        byte_size: bytes.len() as u64,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/apng.rs"]
mod tests;
