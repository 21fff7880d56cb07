pub(crate) mod image;
pub(crate) mod layout;

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{FontEntry, FontSet, Weight, register_font};
use crate::sheet::{Align, Item, PAGE_HEIGHT, PAGE_WIDTH, Sheet, TextItem};

use self::image::{PreparedImage, write_image};
use self::layout::{PT_PER_MM, text_width_mm};

const IMAGE_NAME: &str = "Im1";

/// Document information dictionary values.
pub(crate) struct DocInfo<'a> {
    pub(crate) title: &'a str,
    pub(crate) author: &'a str,
    pub(crate) created: NaiveDate,
}

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Page y (mm from the top) to PDF user space (points from the bottom).
fn pdf_y(mm_from_top: f32) -> f32 {
    pt(PAGE_HEIGHT - mm_from_top)
}

fn gray_level(gray: u8) -> f32 {
    gray as f32 / 255.0
}

struct Fonts {
    regular: FontEntry,
    bold: FontEntry,
}

impl Fonts {
    fn get(&self, weight: Weight) -> &FontEntry {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

fn draw_text(content: &mut Content, item: &TextItem, entry: &FontEntry, font_set: &FontSet) {
    let x_mm = match item.align {
        Align::Left => item.x,
        Align::Right => {
            item.x - text_width_mm(font_set.get(item.weight), &item.text, item.size)
        }
    };
    let bytes = entry.encode(&item.text);
    content.set_fill_gray(gray_level(item.gray));
    content
        .begin_text()
        .set_font(Name(entry.pdf_name.as_bytes()), item.size)
        .next_line(pt(x_mm), pdf_y(item.baseline))
        .show(Str(&bytes))
        .end_text();
}

fn draw_page(
    content: &mut Content,
    items: &[Item],
    fonts: &Fonts,
    font_set: &FontSet,
    has_image: bool,
) {
    for item in items {
        match item {
            Item::Text(text) => {
                if text.text.is_empty() {
                    continue;
                }
                draw_text(content, text, fonts.get(text.weight), font_set);
            }
            Item::Rule { x1, x2, y, gray } => {
                content.save_state();
                content.set_stroke_gray(gray_level(*gray));
                content.set_line_width(0.5);
                content.move_to(pt(*x1), pdf_y(*y));
                content.line_to(pt(*x2), pdf_y(*y));
                content.stroke();
                content.restore_state();
            }
            Item::Image {
                x,
                top,
                width,
                height,
            } => {
                if !has_image {
                    continue;
                }
                content.save_state();
                content.transform([
                    pt(*width),
                    0.0,
                    0.0,
                    pt(*height),
                    pt(*x),
                    pdf_y(top + height),
                ]);
                content.x_object(Name(IMAGE_NAME.as_bytes()));
                content.restore_state();
            }
        }
    }
}

fn used_chars(sheet: &Sheet, weight: Weight) -> HashSet<char> {
    let mut chars: HashSet<char> = sheet
        .texts()
        .filter(|t| t.weight == weight)
        .flat_map(|t| t.text.chars())
        .collect();
    chars.insert(' ');
    chars
}

/// Serialize a composed sheet to PDF bytes.
pub(crate) fn render(
    sheet: &Sheet,
    font_set: &FontSet,
    image: Option<&PreparedImage>,
    info: &DocInfo,
) -> Result<Vec<u8>, Error> {
    if sheet.pages.is_empty() {
        return Err(Error::Pdf("sheet has no pages".into()));
    }

    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: fonts, subset to the characters each weight actually shows
    let fonts = Fonts {
        regular: register_font(
            &mut pdf,
            &font_set.regular,
            "F1".to_string(),
            &mut alloc,
            &used_chars(sheet, Weight::Regular),
        ),
        bold: register_font(
            &mut pdf,
            &font_set.bold,
            "F2".to_string(),
            &mut alloc,
            &used_chars(sheet, Weight::Bold),
        ),
    };
    let t_fonts = t0.elapsed();

    // Phase 2: the main image, shared by whichever page draws it
    let image_ref = image.map(|img| {
        let xobj_ref = alloc();
        write_image(&mut pdf, img, xobj_ref, &mut alloc);
        xobj_ref
    });
    let t_images = t0.elapsed();

    // Phase 3: content streams
    let n = sheet.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in sheet.pages.iter().enumerate() {
        let mut content = Content::new();
        draw_page(&mut content, &page.items, &fonts, font_set, image_ref.is_some());
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        if i32::try_from(compressed.len()).is_err() {
            return Err(Error::Pdf(format!(
                "content stream of page {} is too large ({} bytes)",
                i + 1,
                compressed.len()
            )));
        }
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }
    let t_layout = t0.elapsed();

    // Phase 4: document structure
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, pt(PAGE_WIDTH), pt(PAGE_HEIGHT)))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for entry in [&fonts.regular, &fonts.bold] {
                font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
            }
        }
        if let Some(xobj_ref) = image_ref {
            resources
                .x_objects()
                .pair(Name(IMAGE_NAME.as_bytes()), xobj_ref);
        }
    }

    let created = Date::new(info.created.year_ce().1 as u16)
        .month(info.created.month() as u8)
        .day(info.created.day() as u8);
    pdf.document_info(info_id)
        .title(TextStr(info.title))
        .author(TextStr(info.author))
        .producer(TextStr(concat!("karttem-pdf ", env!("CARGO_PKG_VERSION"))))
        .creation_date(created);

    let bytes = pdf.finish();

    log::info!(
        "Render phases: fonts={:.1}ms, images={:.1}ms, pages={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_layout - t_images).as_secs_f64() * 1000.0,
        t0.elapsed().as_secs_f64() * 1000.0,
        n,
        bytes.len(),
    );

    Ok(bytes)
}
