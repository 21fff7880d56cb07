use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use pdf_writer::{Filter, Pdf, Ref};

use crate::model::{ImageFormat, RasterImage};

/// Largest main image embedded, in pixels. Bigger inputs are downscaled.
pub const MAX_PIXEL_WIDTH: u32 = 600;
pub const MAX_PIXEL_HEIGHT: u32 = 450;

enum Encoded {
    /// Original JPEG bytes, embedded as-is with DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    /// zlib-compressed RGB samples plus an optional zlib-compressed alpha mask.
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// A main image decoded, size-capped and ready for embedding.
pub struct PreparedImage {
    width: u32,
    height: u32,
    encoded: Encoded,
}

impl PreparedImage {
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when the original JPEG stream is embedded without re-encoding.
    pub fn is_passthrough(&self) -> bool {
        matches!(self.encoded, Encoded::Jpeg { .. })
    }
}

/// Decode and cap the caller's image. Any decoding problem is logged and
/// yields `None`, so the sheet falls back to the placeholder line.
pub fn prepare_image(raster: &RasterImage) -> Option<PreparedImage> {
    let format = match raster.format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    };
    let decoded = match image::load_from_memory_with_format(&raster.data, format) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("Main image could not be decoded ({:?}): {e}", raster.format);
            return None;
        }
    };

    let (w, h) = decoded.dimensions();
    if w == 0 || h == 0 {
        log::warn!("Main image has no pixels ({w}x{h})");
        return None;
    }

    let needs_resize = w > MAX_PIXEL_WIDTH || h > MAX_PIXEL_HEIGHT;
    let decoded = if needs_resize {
        let resized = decoded.resize(MAX_PIXEL_WIDTH, MAX_PIXEL_HEIGHT, FilterType::Triangle);
        log::debug!(
            "Main image downscaled {w}x{h} → {}x{}",
            resized.width(),
            resized.height()
        );
        resized
    } else {
        decoded
    };

    if raster.format == ImageFormat::Jpeg && !needs_resize {
        let gray = matches!(decoded, DynamicImage::ImageLuma8(_));
        let rgb = matches!(decoded, DynamicImage::ImageRgb8(_));
        if gray || rgb {
            return Some(PreparedImage {
                width: w,
                height: h,
                encoded: Encoded::Jpeg {
                    data: raster.data.clone(),
                    gray,
                },
            });
        }
    }

    Some(flate_encode(&decoded))
}

fn flate_encode(img: &DynamicImage) -> PreparedImage {
    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb_data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);
    let alpha = has_alpha.then(|| {
        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6)
    });

    PreparedImage {
        width,
        height,
        encoded: Encoded::Flate { rgb, alpha },
    }
}

/// Write the image XObject (and its soft mask, if any) under `xobj_ref`.
pub(crate) fn write_image(
    pdf: &mut Pdf,
    img: &PreparedImage,
    xobj_ref: Ref,
    alloc: &mut impl FnMut() -> Ref,
) {
    let (w, h) = (img.width as i32, img.height as i32);
    match &img.encoded {
        Encoded::Jpeg { data, gray } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        Encoded::Flate { rgb, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let mut xobj = pdf.image_xobject(xobj_ref, rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
}
