mod config;
mod error;
mod fonts;
pub mod format;
mod model;
mod pdf;
pub mod sheet;
pub mod share;

pub use config::{BRANDING_ENV, Branding, GenerateOptions};
pub use error::Error;
pub use fonts::{FontSet, LoadedFont, Weight};
pub use model::{Amenities, ApiResponse, ImageFormat, PropertyRecord, RasterImage, parse_property_json};
pub use pdf::image::{MAX_PIXEL_HEIGHT, MAX_PIXEL_WIDTH, PreparedImage, prepare_image};

use std::path::Path;
use std::time::Instant;

/// A generated listing sheet, not yet written anywhere.
pub struct PropertyDocument {
    /// `{BRAND}-Propiedad-{id}.pdf`
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// False when no image was given or it could not be decoded.
    pub has_image: bool,
}

/// Generate the PDF listing sheet for one property.
///
/// Missing or malformed optional data never fails the call: fields are left
/// out, and an undecodable `main_image` becomes a placeholder line. Only a
/// failure of the PDF backend itself is returned as an error.
pub fn generate(
    record: &PropertyRecord,
    main_image: Option<&RasterImage>,
    options: &GenerateOptions,
) -> Result<PropertyDocument, Error> {
    let t0 = Instant::now();
    let branding = &options.branding;

    let fonts = FontSet::for_branding(branding);
    let t_fonts = t0.elapsed();

    let prepared = main_image.and_then(prepare_image);
    let t_image = t0.elapsed();

    let sheet = sheet::compose(
        record,
        prepared.as_ref().map(PreparedImage::pixel_size),
        branding,
        options.generated_on,
        &fonts,
    );
    let t_layout = t0.elapsed();

    let title = format!("{} - REF {}", format::title(record), record.id);
    let agency = branding.agency_name();
    let info = pdf::DocInfo {
        title: &title,
        author: &agency,
        created: options.generated_on,
    };
    let bytes = pdf::render(&sheet, &fonts, prepared.as_ref(), &info)?;
    let t_render = t0.elapsed();

    log::info!(
        "Timing: fonts={:.1}ms, image={:.1}ms, layout={:.1}ms, render={:.1}ms, total={:.1}ms (listing {}, {} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_image - t_fonts).as_secs_f64() * 1000.0,
        (t_layout - t_image).as_secs_f64() * 1000.0,
        (t_render - t_layout).as_secs_f64() * 1000.0,
        t_render.as_secs_f64() * 1000.0,
        record.id,
        sheet.pages.len(),
    );

    Ok(PropertyDocument {
        filename: branding.filename(record.id),
        bytes,
        page_count: sheet.pages.len(),
        has_image: prepared.is_some(),
    })
}

/// Read a property JSON file (bare record or API envelope), generate its
/// sheet and write it to `output`. A directory `output` receives the sheet
/// under its default filename. Returns the path written.
pub fn convert_record_file(
    input: &Path,
    main_image: Option<&Path>,
    output: &Path,
    options: &GenerateOptions,
) -> Result<std::path::PathBuf, Error> {
    let json = std::fs::read_to_string(input).map_err(|e| with_path(e, input))?;
    let record = parse_property_json(&json)?;

    let raster = match main_image {
        Some(path) => {
            let data = std::fs::read(path).map_err(|e| with_path(e, path))?;
            match RasterImage::from_bytes(data) {
                Ok(raster) => Some(raster),
                Err(e) => {
                    log::warn!("Ignoring main image {}: {e}", path.display());
                    None
                }
            }
        }
        None => None,
    };

    let document = generate(&record, raster.as_ref(), options)?;
    let target = if output.is_dir() {
        output.join(&document.filename)
    } else {
        output.to_path_buf()
    };
    std::fs::write(&target, &document.bytes).map_err(|e| with_path(e, &target))?;
    Ok(target)
}

fn with_path(e: std::io::Error, path: &Path) -> Error {
    Error::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", e, path.display()),
    ))
}
