//! Image normalization: alpha flattening and creation-time stamping.

use crate::exif;
use anyhow::Context;
use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_parts::png::{Png, PngChunk};
use img_parts::{Bytes, ImageEXIF};
use std::io::Cursor;

const CREATION_TIME_KEYWORD: &[u8] = b"Creation Time";

/// Flattens transparency against white and stamps creation-time metadata.
///
/// Has no error path of consequence to the caller: the request pipeline
/// catches any failure here, degrades the response message and continues with
/// the un-normalized image.
#[derive(Clone, Debug, Default)]
pub struct ImageNormalizer;

impl ImageNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize `img` and return it PNG-encoded with an `eXIf` chunk
    /// (DateTime, DateTimeOriginal, DateTimeDigitized) and a `tEXt`
    /// "Creation Time" chunk, all stamped with `timestamp` at whole-second
    /// precision.
    pub fn normalize(
        &self,
        img: &DynamicImage,
        timestamp: DateTime<Local>,
    ) -> Result<Vec<u8>, anyhow::Error> {
        let flattened = flatten_alpha(img);
        let encoded = encode_png(&flattened)?;
        let stamp = timestamp.format("%Y:%m:%d %H:%M:%S").to_string();

        let mut png =
            Png::from_bytes(Bytes::from(encoded)).context("re-parsing encoded PNG")?;
        png.set_exif(Some(Bytes::from(exif::datetime_exif(&stamp))));

        // tEXt goes right after IHDR; img-parts keeps IHDR at index 0.
        let mut contents = Vec::with_capacity(CREATION_TIME_KEYWORD.len() + 1 + stamp.len());
        contents.extend_from_slice(CREATION_TIME_KEYWORD);
        contents.push(0);
        contents.extend_from_slice(stamp.as_bytes());
        png.chunks_mut()
            .insert(1, PngChunk::new(*b"tEXt", Bytes::from(contents)));

        Ok(png.encoder().bytes().to_vec())
    }

    /// Encode without normalization. Fallback for when `normalize` fails so
    /// the pipeline can still persist and forward the original image.
    pub fn encode_plain(&self, img: &DynamicImage) -> Result<Vec<u8>, anyhow::Error> {
        encode_png(img)
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, anyhow::Error> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .context("encoding PNG")?;
    Ok(buffer)
}

/// Composite over an opaque white background using the alpha channel as the
/// blend mask. Images without alpha pass through unchanged.
fn flatten_alpha(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img.clone();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut background = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        background.put_pixel(x, y, Rgb([blend(r, a), blend(g, a), blend(b, a)]));
    }

    DynamicImage::ImageRgb8(background)
}

fn blend(channel: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(channel) * a + 255 * (255 - a) + 127) / 255) as u8
}
