#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::fs;

use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use karttem_pdf::{GenerateOptions, PropertyRecord, RasterImage};

/// Footer date used by every test, so output does not depend on the clock.
pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn options() -> GenerateOptions {
    GenerateOptions {
        generated_on: fixed_date(),
        ..GenerateOptions::default()
    }
}

pub fn record(json: &str) -> PropertyRecord {
    karttem_pdf::parse_property_json(json).expect("valid record JSON")
}

/// The "Casa Centro" listing: ARS price, three characteristics, nothing else.
pub fn casa_centro() -> PropertyRecord {
    record(
        r#"{
            "id": 42,
            "title": "Casa Centro",
            "price_ars": 85000000,
            "price_usd": null,
            "bedrooms": 3,
            "bathrooms": 2,
            "covered_area": 180,
            "description": ""
        }"#,
    )
}

/// Regular and bold files of one installed TrueType family.
const FONT_PAIRS: [(&str, &str); 3] = [
    ("DejaVuSans.ttf", "DejaVuSans-Bold.ttf"),
    ("LiberationSans-Regular.ttf", "LiberationSans-Bold.ttf"),
    ("arial.ttf", "arialbd.ttf"),
];

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }
    if let Some(windir) = std::env::var_os("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs
}

fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, name) {
                return Some(found);
            }
        } else if path.file_name().is_some_and(|f| f.eq_ignore_ascii_case(name)) {
            return Some(path);
        }
    }
    None
}

/// A regular/bold pair of system TrueType fonts, if one is installed.
pub fn system_font_pair() -> Option<(PathBuf, PathBuf)> {
    let dirs = font_dirs();
    FONT_PAIRS.iter().find_map(|(regular, bold)| {
        dirs.iter().find_map(|dir| {
            let regular = find_file(dir, regular)?;
            let bold = find_file(dir, bold)?;
            Some((regular, bold))
        })
    })
}

/// Output directory: tests/output/<name>/
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    fs::create_dir_all(&dir).expect("create output dir");
    dir
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// PNG with a transparent left half when `alpha` is set.
pub fn png_bytes(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let a = if alpha && x < width / 2 { 0 } else { 255 };
        Rgba([200, (x % 256) as u8, (y % 256) as u8, a])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn raster(data: Vec<u8>) -> RasterImage {
    RasterImage::from_bytes(data).expect("sniffable test image")
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Payload of every stream object, inflated when it is zlib data.
pub fn streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = find(pdf, b"stream\n", pos) {
        if start >= 3 && &pdf[start - 3..start] == b"end" {
            pos = start + 7;
            continue;
        }
        let body = start + 7;
        let Some(end) = find(pdf, b"\nendstream", body) else {
            break;
        };
        let raw = &pdf[body..end];
        out.push(
            miniz_oxide::inflate::decompress_to_vec_zlib(raw).unwrap_or_else(|_| raw.to_vec()),
        );
        pos = end + 10;
    }
    out
}

/// Decode the string operands of a content stream. Bytes are read as
/// Latin-1, which agrees with WinAnsi for the accented letters used here.
fn string_operands(content: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'(' => {
                let mut bytes = Vec::new();
                let mut depth = 1;
                i += 1;
                while i < content.len() {
                    let b = content[i];
                    match b {
                        b'\\' => {
                            i += 1;
                            let Some(&esc) = content.get(i) else { break };
                            match esc {
                                b'n' => bytes.push(b'\n'),
                                b'r' => bytes.push(b'\r'),
                                b't' => bytes.push(b'\t'),
                                b'b' => bytes.push(0x08),
                                b'f' => bytes.push(0x0C),
                                b'0'..=b'7' => {
                                    let mut value = 0u32;
                                    let mut n = 0;
                                    while n < 3 && matches!(content.get(i), Some(b'0'..=b'7')) {
                                        value = value * 8 + (content[i] - b'0') as u32;
                                        i += 1;
                                        n += 1;
                                    }
                                    bytes.push(value as u8);
                                    continue;
                                }
                                other => bytes.push(other),
                            }
                        }
                        b'(' => {
                            depth += 1;
                            bytes.push(b);
                        }
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            bytes.push(b);
                        }
                        _ => bytes.push(b),
                    }
                    i += 1;
                }
                out.push(bytes.iter().map(|&b| b as char).collect());
            }
            b'<' => {
                let end = content[i..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(content.len(), |p| p + i);
                let hex: Vec<u8> = content[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let bytes: Vec<u8> = hex
                    .chunks(2)
                    .filter_map(|pair| {
                        let s = std::str::from_utf8(pair).ok()?;
                        u8::from_str_radix(s, 16).ok()
                    })
                    .collect();
                out.push(bytes.iter().map(|&b| b as char).collect());
                i = end;
            }
            _ => {}
        }
        i += 1;
    }
    out
}

/// Every string shown by a page content stream (Helvetica sheets only).
pub fn pdf_texts(pdf: &[u8]) -> Vec<String> {
    streams(pdf)
        .iter()
        .filter(|s| find(s, b"Tj", 0).is_some())
        .flat_map(|s| string_operands(s))
        .collect()
}

pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Number of `/Type /Page` dictionaries (the `/Pages` node excluded).
pub fn page_objects(pdf: &[u8]) -> usize {
    count_occurrences(pdf, b"/Type /Page") - count_occurrences(pdf, b"/Type /Pages")
}
