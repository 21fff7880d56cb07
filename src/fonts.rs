use std::collections::{HashMap, HashSet};
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

use crate::config::Branding;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    Bold,
}

struct TrueTypeData {
    data: Mmap,
    face_index: u32,
    units_per_em: f32,
}

/// A font measured but not yet written to the PDF. Layout needs the widths
/// before the used characters (and thus the subset) are known.
pub struct LoadedFont {
    name: String,
    weight: Weight,
    /// Advance widths in 1000-units for WinAnsi bytes 32..=255.
    widths_1000: Vec<f32>,
    /// Widths of every other character the face maps, read once at load.
    extra_widths: HashMap<char, f32>,
    truetype: Option<TrueTypeData>,
}

impl LoadedFont {
    pub fn helvetica(weight: Weight) -> Self {
        let name = match weight {
            Weight::Regular => "Helvetica",
            Weight::Bold => "Helvetica-Bold",
        };
        Self {
            name: name.to_string(),
            weight,
            widths_1000: helvetica_widths(weight),
            extra_widths: HashMap::new(),
            truetype: None,
        }
    }

    /// Map and measure a TrueType/OpenType file. `None` when it cannot be
    /// opened or parsed.
    pub fn from_file(path: &Path, weight: Weight) -> Option<Self> {
        let file = std::fs::File::open(path).ok()?;
        let data = unsafe { Mmap::map(&file) }.ok()?;
        let face_index = 0;
        let face = Face::parse(&data, face_index).ok()?;

        let units = face.units_per_em() as f32;
        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0)
            })
            .collect();
        let extra_widths = non_winansi_widths(&face, units);
        let name = font_family_name(&face).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "BrandFont".to_string())
        });

        Some(Self {
            name,
            weight,
            widths_1000,
            extra_widths,
            truetype: Some(TrueTypeData {
                data,
                face_index,
                units_per_em: units,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_embedded(&self) -> bool {
        self.truetype.is_some()
    }

    /// Width of a single character in 1000-units; 0 for characters the font
    /// cannot show.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        match char_to_winansi(ch) {
            Some(byte) => self.widths_1000[(byte - 32) as usize],
            None => self.extra_widths.get(&ch).copied().unwrap_or(0.0),
        }
    }

    /// Width of `text` in points at `font_size` points.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }
}

/// Advance widths of the Unicode characters outside WinAnsi that `face` maps.
fn non_winansi_widths(face: &Face, units: f32) -> HashMap<char, f32> {
    let mut widths = HashMap::new();
    let Some(cmap) = face.tables().cmap else {
        return widths;
    };
    for subtable in cmap.subtables.into_iter().filter(|st| st.is_unicode()) {
        subtable.codepoints(|cp| {
            let Some(ch) = char::from_u32(cp) else {
                return;
            };
            if char_to_winansi(ch).is_some() || widths.contains_key(&ch) {
                return;
            }
            if let Some(adv) = subtable
                .glyph_index(cp)
                .and_then(|gid| face.glyph_hor_advance(gid))
            {
                widths.insert(ch, adv as f32 / units * 1000.0);
            }
        });
    }
    widths
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

/// The two faces a listing sheet is set in.
pub struct FontSet {
    pub regular: LoadedFont,
    pub bold: LoadedFont,
}

impl FontSet {
    pub fn helvetica() -> Self {
        Self {
            regular: LoadedFont::helvetica(Weight::Regular),
            bold: LoadedFont::helvetica(Weight::Bold),
        }
    }

    /// Load the brand fonts named in the config, falling back to Helvetica
    /// per weight when a file is missing or unreadable.
    pub fn for_branding(branding: &Branding) -> Self {
        let load = |path: Option<&Path>, weight: Weight| {
            let Some(path) = path else {
                return LoadedFont::helvetica(weight);
            };
            match LoadedFont::from_file(path, weight) {
                Some(font) => {
                    log::debug!("Loaded {weight:?} font {} from {}", font.name, path.display());
                    font
                }
                None => {
                    log::warn!(
                        "Font not usable: {} ({weight:?}), using Helvetica",
                        path.display()
                    );
                    LoadedFont::helvetica(weight)
                }
            }
        };
        Self {
            regular: load(branding.font_regular.as_deref(), Weight::Regular),
            bold: load(branding.font_bold.as_deref(), Weight::Bold),
        }
    }

    pub fn get(&self, weight: Weight) -> &LoadedFont {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

/// A font after it has been written to the PDF.
pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    /// Bytes for a `Tj` string: glyph IDs for embedded fonts, WinAnsi otherwise.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Characters at WinAnsi bytes 0x80..=0x9F, the only range where the code
/// page departs from Latin-1. Five slots are unassigned.
const WINANSI_C1: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('“'), Some('”'), Some('•'), Some('–'), Some('\u{2014}'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WINANSI_C1[(byte - 0x80) as usize].unwrap_or(byte as char),
        _ => byte as char,
    }
}

fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u8),
        _ => WINANSI_C1
            .iter()
            .position(|&slot| slot == Some(c))
            .map(|i| 0x80 + i as u8),
    }
}

/// WinAnsi bytes for a Helvetica `Tj` string. Characters outside the code
/// page are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(weight: Weight) -> Vec<f32> {
    let bold = weight == Weight::Bold;
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                                       // space
            44 | 46 => 278.0,                                  // , .
            33..=47 => if bold { 333.0 } else { 278.0 },       // punctuation
            48..=57 => 556.0,                                  // digits
            58..=64 => 333.0,                                  // more punctuation
            73 => 278.0,                                       // I
            74 => 556.0,                                       // J
            77 => 833.0,                                       // M (wide)
            87 => 944.0,                                       // W (wide)
            65..=90 => if bold { 722.0 } else { 667.0 },       // uppercase A-Z (average)
            91..=96 => 333.0,                                  // brackets etc.
            105 | 106 | 108 => 278.0,                          // narrow lowercase: i j l
            102 | 116 => 333.0,                                // f t
            114 => if bold { 389.0 } else { 333.0 },           // r
            109 => 889.0,                                      // m
            119 => if bold { 778.0 } else { 722.0 },           // w
            97..=122 => if bold { 611.0 } else { 556.0 },      // lowercase a-z (average)
            0x95 => 350.0,                                     // bullet
            0xB2 | 0xB3 | 0xB9 => 333.0,                       // superscript digits
            0xC0..=0xDD => if bold { 722.0 } else { 667.0 },   // accented uppercase
            0xE0..=0xFF => if bold { 611.0 } else { 556.0 },   // accented lowercase
            _ => 556.0,
        })
        .collect()
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font: &LoadedFont,
    tt: &TrueTypeData,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(&tt.data, tt.face_index).ok()?;

    let units = tt.units_per_em;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
        }
    }

    let subset_data = subsetter::subset(&tt.data, tt.face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {}: {e}; embedding full font", font.name);
        tt.data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len()).ok()?;
    let data_ref = alloc();
    let descriptor_ref = alloc();
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font.name.replace(' ', "");

    let mut flags = pdf_writer::types::FontFlags::NON_SYMBOLIC;
    if font.weight == Weight::Bold {
        flags |= pdf_writer::types::FontFlags::FORCE_BOLD;
    }
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(flags)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(if font.weight == Weight::Bold { 140.0 } else { 80.0 })
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .filter_map(|(&ch, &new_gid)| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, adv as f32 / units * 1000.0))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}

/// Write `font` into the PDF. Embedded fonts are subset to `used_chars`; an
/// embedding failure degrades to the matching Helvetica face.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    font: &LoadedFont,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = font
        .truetype
        .as_ref()
        .and_then(|tt| embed_truetype(pdf, font_ref, font, tt, used_chars, alloc));

    if char_to_gid.is_none() {
        if font.is_embedded() {
            log::warn!("Embedding {} failed, using Helvetica", font.name);
        }
        let base_font = LoadedFont::helvetica(font.weight).name;
        pdf.type1_font(font_ref)
            .base_font(Name(base_font.as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    log::debug!(
        "register_font: {} ({} chars) → {:.1}ms",
        font.name,
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    }
}
