//! Lays a property record out as a list of pages of positioned items.
//!
//! Coordinates are millimetres from the top-left corner of an A4 portrait
//! page; text items are positioned by their baseline. The PDF backend only
//! converts these into content streams, so every layout decision is made (and
//! can be inspected) here.

use chrono::NaiveDate;

use crate::config::Branding;
use crate::fonts::{FontSet, Weight};
use crate::format;
use crate::model::PropertyRecord;
use crate::pdf::layout::wrap_text;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Baseline of the first line on every page.
pub const TOP: f32 = 20.0;
/// Lowest baseline for body content; the footer band sits below it.
pub const CONTENT_BOTTOM: f32 = 270.0;
pub const FOOTER_LINES: [f32; 3] = [280.0, 285.0, 290.0];
/// Tallest the main image may be drawn (a 4:3 image at full content width).
pub const MAX_IMAGE_HEIGHT: f32 = CONTENT_WIDTH * 450.0 / 600.0;
pub const AMENITY_COLUMNS: usize = 3;
pub const NO_CHARACTERISTICS: &str = "No hay características adicionales especificadas.";
pub const IMAGE_PLACEHOLDER: &str = "Imagen no disponible";

const VALUE_OFFSET: f32 = 45.0;
const RULE_GRAY: u8 = 200;
const HEADING_GRAY: u8 = 40;
const BODY_GRAY: u8 = 60;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Align {
    Left,
    /// `x` is the right edge of the text.
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    /// Points.
    pub size: f32,
    pub weight: Weight,
    pub gray: u8,
    pub align: Align,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Text(TextItem),
    Rule { x1: f32, x2: f32, y: f32, gray: u8 },
    Image { x: f32, top: f32, width: f32, height: f32 },
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    pub items: Vec<Item>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextItem> {
        self.items.iter().filter_map(|item| match item {
            Item::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.items.iter().any(|item| matches!(item, Item::Image { .. }))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Sheet {
    pub pages: Vec<Page>,
}

impl Sheet {
    pub fn texts(&self) -> impl Iterator<Item = &TextItem> {
        self.pages.iter().flat_map(Page::texts)
    }

    /// First text item whose content is exactly `text`.
    pub fn find_text(&self, text: &str) -> Option<&TextItem> {
        self.texts().find(|t| t.text == text)
    }

    pub fn count_text(&self, text: &str) -> usize {
        self.texts().filter(|t| t.text == text).count()
    }

    /// Index of the page holding the first exact match.
    pub fn page_of(&self, text: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.texts().any(|t| t.text == text))
    }
}

/// One characteristic row, in table order, for the fields the record has.
pub fn characteristics(record: &PropertyRecord) -> Vec<(&'static str, String)> {
    let rows: [(&'static str, Option<String>); 9] = [
        ("Superficie Cubierta:", format::area(record.covered_area).map(format::format_area)),
        ("Superficie Total:", format::area(record.total_area).map(format::format_area)),
        ("Dormitorios:", record.bedrooms.map(|n| n.to_string())),
        ("Baños:", record.bathrooms.map(|n| n.to_string())),
        ("Cochera:", record.garage.map(|b| format::yes_no(b).to_string())),
        ("Electricidad:", record.has_electricity.map(|b| format::yes_no(b).to_string())),
        ("Gas Natural:", record.has_natural_gas.map(|b| format::yes_no(b).to_string())),
        ("Cloacas:", record.has_sewage.map(|b| format::yes_no(b).to_string())),
        (
            "Calle Pavimentada:",
            record.has_paved_street.map(|b| format::yes_no(b).to_string()),
        ),
    ];
    rows.into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
}

/// Owns the cursor and pages of a single layout pass.
///
/// Lives for one [`compose`] call: content is appended at the cursor and
/// moves to a fresh page whenever it would cross the bottom of the current
/// one. [`Composer::finish`] consumes the composer, so nothing can be added
/// after the footers are stamped.
pub struct Composer<'a> {
    fonts: &'a FontSet,
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'a> Composer<'a> {
    pub fn new(fonts: &'a FontSet) -> Self {
        Self {
            fonts,
            pages: Vec::new(),
            current: Page::default(),
            y: TOP,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.y
    }

    pub fn page_number(&self) -> usize {
        self.pages.len() + 1
    }

    fn at_page_top(&self) -> bool {
        (self.y - TOP).abs() < 0.01
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn page_break(&mut self) {
        log::debug!(
            "page break after page {} at y={:.1}mm",
            self.page_number(),
            self.y
        );
        self.pages.push(std::mem::take(&mut self.current));
        self.y = TOP;
    }

    /// Break unless `height` more millimetres fit above [`CONTENT_BOTTOM`].
    pub fn ensure_room(&mut self, height: f32) {
        if self.y + height > CONTENT_BOTTOM && !self.at_page_top() {
            self.page_break();
        }
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, size: f32, weight: Weight, gray: u8) {
        self.push_text(text.into(), x, self.y, size, weight, gray, Align::Left);
    }

    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &mut self,
        text: String,
        x: f32,
        baseline: f32,
        size: f32,
        weight: Weight,
        gray: u8,
        align: Align,
    ) {
        self.current.items.push(Item::Text(TextItem {
            text,
            x,
            baseline,
            size,
            weight,
            gray,
            align,
        }));
    }

    pub fn rule(&mut self) {
        self.current.items.push(Item::Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y: self.y,
            gray: RULE_GRAY,
        });
    }

    pub fn image(&mut self, x: f32, top: f32, width: f32, height: f32) {
        self.current.items.push(Item::Image {
            x,
            top,
            width,
            height,
        });
    }

    /// Wrap `text` to the content width and emit one line per `pitch`,
    /// moving to a new page whenever the next line would not fit.
    pub fn paragraph(&mut self, text: &str, size: f32, weight: Weight, gray: u8, pitch: f32) {
        let lines = wrap_text(text, self.fonts.get(weight), size, CONTENT_WIDTH);
        for line in lines {
            self.ensure_room(0.0);
            if !line.is_empty() {
                self.text(line, MARGIN, size, weight, gray);
            }
            self.y += pitch;
        }
    }

    /// Separator rule plus section title. `keep_with` is the height of the
    /// content that must land on the same page as the title; a section that
    /// cannot fit its title and first row above [`CONTENT_BOTTOM`] starts on a
    /// new page.
    pub fn section_heading(&mut self, title: &str, gap: f32, keep_with: f32) {
        self.ensure_room(8.0 + gap + keep_with);
        self.rule();
        self.y += 8.0;
        self.text(title, MARGIN, 14.0, Weight::Bold, HEADING_GRAY);
        self.y += gap;
    }

    /// Stamp the footer on every page and hand back the finished sheet.
    pub fn finish(mut self, branding: &Branding, generated_on: NaiveDate) -> Sheet {
        self.pages.push(std::mem::take(&mut self.current));
        let date = format!("Generado el: {}", format::format_date(generated_on));
        let right = PAGE_WIDTH - MARGIN;
        let [first, second, third] = FOOTER_LINES;

        for page in &mut self.pages {
            let mut footer = |text: String, x: f32, baseline: f32, align: Align| {
                page.items.push(Item::Text(TextItem {
                    text,
                    x,
                    baseline,
                    size: 9.0,
                    weight: Weight::Regular,
                    gray: 120,
                    align,
                }));
            };
            footer(branding.agency_name(), MARGIN, first, Align::Left);
            footer(format!("Tel: {}", branding.phone), MARGIN, second, Align::Left);
            footer(format!("Email: {}", branding.email), MARGIN, third, Align::Left);
            footer(date.clone(), right, second, Align::Right);
            footer(branding.website.clone(), right, third, Align::Right);
        }

        Sheet { pages: self.pages }
    }
}

/// Lay out the listing sheet for `record`.
///
/// `main_image` is the pixel size of the image the caller managed to prepare;
/// without one a placeholder line stands in for it.
pub fn compose(
    record: &PropertyRecord,
    main_image: Option<(u32, u32)>,
    branding: &Branding,
    generated_on: NaiveDate,
    fonts: &FontSet,
) -> Sheet {
    let mut c = Composer::new(fonts);

    header(&mut c, branding);
    summary(&mut c, record);
    image_block(&mut c, main_image);
    description(&mut c, record);
    characteristics_table(&mut c, record);
    amenities(&mut c, record);

    contact(&mut c, branding);

    c.finish(branding, generated_on)
}

fn header(c: &mut Composer, branding: &Branding) {
    c.text(branding.name.as_str(), MARGIN, 22.0, Weight::Bold, 0);
    c.advance(7.0);
    c.text(branding.subtitle.as_str(), MARGIN, 11.0, Weight::Regular, 0);
    c.advance(10.0);
    c.rule();
    c.advance(10.0);
}

/// Reference, title, location, price and the type/status line.
fn summary(c: &mut Composer, record: &PropertyRecord) {
    c.text(format!("REF: {}", record.id), MARGIN, 10.0, Weight::Regular, 100);
    c.advance(8.0);

    c.paragraph(format::title(record), 16.0, Weight::Bold, 0, 8.0);
    c.advance(2.0);

    if let Some(location) = format::location_line(record) {
        c.ensure_room(0.0);
        c.text(location, MARGIN, 11.0, Weight::Regular, 80);
        c.advance(8.0);
    }

    c.ensure_room(7.0);
    c.text(format::property_price(record), MARGIN, 14.0, Weight::Bold, 0);
    c.advance(7.0);
    c.text(format::status_line(record), MARGIN, 12.0, Weight::Regular, 80);
    c.advance(15.0);
}

/// Display size of the main image: full content width, aspect ratio kept,
/// height capped at [`MAX_IMAGE_HEIGHT`].
pub fn image_display_size(pixel_width: u32, pixel_height: u32) -> (f32, f32) {
    let aspect = pixel_height.max(1) as f32 / pixel_width.max(1) as f32;
    let height = CONTENT_WIDTH * aspect;
    if height > MAX_IMAGE_HEIGHT {
        (MAX_IMAGE_HEIGHT / aspect, MAX_IMAGE_HEIGHT)
    } else {
        (CONTENT_WIDTH, height)
    }
}

fn image_block(c: &mut Composer, main_image: Option<(u32, u32)>) {
    let Some((pw, ph)) = main_image else {
        c.ensure_room(0.0);
        c.text(IMAGE_PLACEHOLDER, MARGIN, 11.0, Weight::Regular, 120);
        c.advance(15.0);
        return;
    };

    let (width, height) = image_display_size(pw, ph);
    // Top edge sits where the cap height of a line at the cursor would be
    let cap = 4.0;
    c.ensure_room(height - cap);
    let top = c.cursor() - cap;
    let x = MARGIN + (CONTENT_WIDTH - width) / 2.0;
    c.image(x, top, width, height);
    c.advance(height + 10.0);
}

fn description(c: &mut Composer, record: &PropertyRecord) {
    let Some(text) = format::description(record) else {
        return;
    };
    c.section_heading("Descripción", 8.0, 6.0);
    c.paragraph(text, 11.0, Weight::Regular, BODY_GRAY, 6.0);
    c.advance(10.0);
}

fn characteristics_table(c: &mut Composer, record: &PropertyRecord) {
    let rows = characteristics(record);
    c.section_heading("Características principales", 10.0, 7.0);

    if rows.is_empty() {
        c.text(NO_CHARACTERISTICS, MARGIN, 11.0, Weight::Regular, BODY_GRAY);
        c.advance(10.0);
        return;
    }

    for (label, value) in rows {
        c.ensure_room(0.0);
        c.text(label, MARGIN, 11.0, Weight::Bold, HEADING_GRAY);
        c.text(value, MARGIN + VALUE_OFFSET, 11.0, Weight::Regular, HEADING_GRAY);
        c.advance(7.0);
    }
}

fn amenities(c: &mut Composer, record: &PropertyRecord) {
    let labels = record.amenity_labels();
    if labels.is_empty() {
        return;
    }
    c.section_heading("Servicios y Amenities", 10.0, 7.0);

    let column_width = CONTENT_WIDTH / AMENITY_COLUMNS as f32;
    for row in labels.chunks(AMENITY_COLUMNS) {
        c.ensure_room(0.0);
        for (col, label) in row.iter().enumerate() {
            let x = MARGIN + col as f32 * column_width;
            c.text(format!("• {label}"), x, 11.0, Weight::Regular, BODY_GRAY);
        }
        c.advance(7.0);
    }
    c.advance(8.0);
}

fn contact(c: &mut Composer, branding: &Branding) {
    let lines = [
        "Para más información sobre esta propiedad, contáctenos:".to_string(),
        format!("• Teléfono: {}", branding.phone),
        format!("• Email: {}", branding.email),
        format!("• Dirección: {}", branding.address),
    ];
    // The whole block stays on one page
    c.section_heading("Contacto", 8.0, (lines.len() - 1) as f32 * 6.0);
    for line in lines {
        c.text(line, MARGIN, 11.0, Weight::Regular, BODY_GRAY);
        c.advance(6.0);
    }
}
