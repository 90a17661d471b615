//! Static image thumbnails
//!
//! Images are stretched to exactly the requested size; callers that want the
//! aspect ratio kept must crop beforehand.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use log::debug;

use crate::{EncodedImage, Error, ImageFormat, Result, ThumbnailOptions};

/// Decodes raster images and re-encodes them at thumbnail size
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageResizer;

impl ImageResizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode the image at `image_path` and encode a `width x height` thumbnail.
    pub fn resize(&self, image_path: impl AsRef<Path>, opts: &ThumbnailOptions) -> Result<EncodedImage> {
        let path = image_path.as_ref();
        let img = image::open(path).map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;
        debug!(
            "Decoded {} ({}x{}), resizing to {}x{}",
            path.display(),
            img.width(),
            img.height(),
            opts.width,
            opts.height
        );
        self.resize_image(&img, opts)
    }

    /// Encode a thumbnail from an already decoded image.
    pub fn resize_image(&self, img: &DynamicImage, opts: &ThumbnailOptions) -> Result<EncodedImage> {
        let scaled = img.resize_exact(opts.width, opts.height, FilterType::Triangle);
        let bytes = encode(&scaled, opts.image_format, opts.image_quality)?;
        Ok(EncodedImage::from_bytes(opts.image_format, &bytes))
    }
}

/// Map a [0, 1] quality onto the JPEG encoder's 1..=100 scale.
fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: f64) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut cursor = Cursor::new(&mut data);

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut cursor, jpeg_quality(quality)).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Png => {
            img.write_to(&mut cursor, image::ImageFormat::Png)?;
        }
    }

    Ok(data)
}
