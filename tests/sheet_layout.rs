mod common;

use karttem_pdf::sheet::{
    self, AMENITY_COLUMNS, CONTENT_BOTTOM, CONTENT_WIDTH, IMAGE_PLACEHOLDER, Item, MARGIN,
    MAX_IMAGE_HEIGHT, NO_CHARACTERISTICS, Sheet,
};
use karttem_pdf::{Branding, FontSet, PropertyRecord};

const AMENITY_ORDER: [&str; 11] = [
    "Piscina",
    "Calefacción",
    "Aire Acondicionado",
    "Jardín",
    "Lavadero",
    "Estacionamiento",
    "Calefacción Central",
    "Césped",
    "Chimenea",
    "Aire Acondicionado Central",
    "Techos Altos",
];

fn compose(record: &PropertyRecord, image: Option<(u32, u32)>) -> Sheet {
    sheet::compose(
        record,
        image,
        &Branding::default(),
        common::fixed_date(),
        &FontSet::helvetica(),
    )
}

fn amenity_entries(sheet: &Sheet) -> Vec<String> {
    sheet
        .texts()
        .filter_map(|t| t.text.strip_prefix("• "))
        .filter(|label| AMENITY_ORDER.contains(label))
        .map(str::to_string)
        .collect()
}

fn assert_footer_on_every_page(sheet: &Sheet) {
    for (i, page) in sheet.pages.iter().enumerate() {
        let footer: Vec<&str> = page
            .texts()
            .filter(|t| t.baseline > CONTENT_BOTTOM)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(
            footer,
            vec![
                "KARTTEM Inmobiliaria",
                "Tel: +54 9 2664 46-3038",
                "Email: info@karttemsa.com",
                "Generado el: 15/03/2024",
                "www.karttemsa.com",
            ],
            "footer of page {}",
            i + 1
        );
    }
}

#[test]
fn casa_centro_scenario() {
    let sheet = compose(&common::casa_centro(), None);

    assert_eq!(sheet.pages.len(), 1);
    assert!(sheet.find_text("KARTTEM").is_some());
    assert!(sheet.find_text("REF: 42").is_some());
    assert!(sheet.find_text("Casa Centro").is_some());
    assert!(sheet.find_text("$85.000.000").is_some());
    assert!(sheet.find_text("Propiedad").is_some());
    assert_eq!(sheet.count_text(IMAGE_PLACEHOLDER), 1);

    assert!(sheet.find_text("Descripción").is_none());
    assert!(sheet.find_text("Servicios y Amenities").is_none());
    assert!(amenity_entries(&sheet).is_empty());

    let rows = [
        ("Superficie Cubierta:", "180 m²"),
        ("Dormitorios:", "3"),
        ("Baños:", "2"),
    ];
    for (label, value) in rows {
        let label_item = sheet.find_text(label).unwrap_or_else(|| panic!("{label} missing"));
        let value_item = sheet
            .texts()
            .find(|t| t.text == value && t.baseline == label_item.baseline)
            .unwrap_or_else(|| panic!("{value} not on the {label} row"));
        assert_eq!(value_item.x, MARGIN + 45.0);
    }
    for absent in ["Superficie Total:", "Cochera:", "Electricidad:", "Cloacas:"] {
        assert!(sheet.find_text(absent).is_none(), "{absent} should be omitted");
    }
    assert!(sheet.find_text(NO_CHARACTERISTICS).is_none());

    assert!(sheet.find_text("Contacto").is_some());
    assert!(sheet.find_text("• Teléfono: +54 9 2664 46-3038").is_some());
    assert_footer_on_every_page(&sheet);
}

#[test]
fn sections_appear_in_order() {
    let record = common::record(
        r#"{
            "id": 3,
            "title": "Casa con pileta",
            "description": "Amplia casa en barrio cerrado.",
            "bedrooms": 4,
            "amenities": {"has_pool": true}
        }"#,
    );
    let sheet = compose(&record, None);
    let baseline = |text: &str| {
        sheet
            .find_text(text)
            .unwrap_or_else(|| panic!("{text} missing"))
            .baseline
    };
    let order = [
        "KARTTEM",
        "REF: 3",
        "Casa con pileta",
        "Consultar",
        IMAGE_PLACEHOLDER,
        "Descripción",
        "Amplia casa en barrio cerrado.",
        "Características principales",
        "Dormitorios:",
        "Servicios y Amenities",
        "• Piscina",
        "Contacto",
    ];
    for pair in order.windows(2) {
        assert!(
            baseline(pair[0]) < baseline(pair[1]),
            "{} should come before {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn zero_counts_shown_zero_areas_omitted() {
    let record = common::record(
        r#"{"id": 8, "bedrooms": 0, "bathrooms": 0, "covered_area": 0, "total_area": 0, "garage": false}"#,
    );
    let rows = sheet::characteristics(&record);
    assert_eq!(
        rows,
        vec![
            ("Dormitorios:", "0".to_string()),
            ("Baños:", "0".to_string()),
            ("Cochera:", "No".to_string()),
        ]
    );
}

#[test]
fn characteristics_table_order() {
    let record = common::record(
        r#"{
            "id": 8,
            "has_paved_street": 1,
            "has_sewage": 0,
            "has_natural_gas": true,
            "has_electricity": true,
            "garage": true,
            "bathrooms": 1,
            "bedrooms": 2,
            "total_area": 300,
            "covered_area": 120.5
        }"#,
    );
    let labels: Vec<&str> = sheet::characteristics(&record)
        .into_iter()
        .map(|(label, _)| label)
        .collect();
    assert_eq!(
        labels,
        vec![
            "Superficie Cubierta:",
            "Superficie Total:",
            "Dormitorios:",
            "Baños:",
            "Cochera:",
            "Electricidad:",
            "Gas Natural:",
            "Cloacas:",
            "Calle Pavimentada:",
        ]
    );
    let sheet = compose(&record, None);
    assert!(sheet.find_text("120.5 m²").is_some());
    assert_eq!(sheet.count_text("Sí"), 4);
    assert_eq!(sheet.count_text("No"), 1);
}

#[test]
fn fallback_line_exactly_once() {
    let sheet = compose(&common::record(r#"{"id": 1}"#), None);
    assert_eq!(sheet.count_text(NO_CHARACTERISTICS), 1);
    assert_eq!(sheet.count_text("Características principales"), 1);
    assert!(sheet.find_text("Propiedad sin título").is_some());
    assert!(sheet.find_text("Consultar").is_some());
}

#[test]
fn amenities_grid() {
    let all = common::record(
        r#"{
            "id": 5,
            "amenities": {
                "has_pool": true, "has_heating": true, "has_ac": true,
                "has_garden": true, "has_laundry": true, "has_parking": true,
                "has_central_heating": true, "has_lawn": true, "has_fireplace": true,
                "has_central_ac": true, "has_high_ceiling": true
            }
        }"#,
    );
    let sheet = compose(&all, None);
    assert_eq!(amenity_entries(&sheet), AMENITY_ORDER);

    let column_width = CONTENT_WIDTH / AMENITY_COLUMNS as f32;
    let items: Vec<_> = sheet
        .texts()
        .filter(|t| {
            t.text
                .strip_prefix("• ")
                .is_some_and(|label| AMENITY_ORDER.contains(&label))
        })
        .collect();
    for (i, item) in items.iter().enumerate() {
        let col = i % AMENITY_COLUMNS;
        assert!((item.x - (MARGIN + col as f32 * column_width)).abs() < 0.01);
        assert_eq!(item.baseline, items[i - col].baseline, "row of {}", item.text);
    }
    // 11 entries fill four rows
    let mut rows: Vec<f32> = items.iter().map(|t| t.baseline).collect();
    rows.dedup();
    assert_eq!(rows.len(), 4);
}

#[test]
fn amenities_only_true_flags() {
    let record = common::record(
        r#"{"id": 5, "amenities": {"has_pool": false, "has_fireplace": true, "has_ac": null, "has_lawn": 1}}"#,
    );
    let sheet = compose(&record, None);
    assert_eq!(amenity_entries(&sheet), vec!["Césped", "Chimenea"]);

    let none = common::record(r#"{"id": 6, "amenities": {"has_pool": false}}"#);
    let sheet = compose(&none, None);
    assert!(sheet.find_text("Servicios y Amenities").is_none());
}

#[test]
fn long_description_flows_onto_new_pages() {
    let description: Vec<String> = (1..=50).map(|n| format!("Línea {n} de la descripción")).collect();
    let mut record = common::casa_centro();
    record.description = Some(description.join("\n"));

    let sheet = compose(&record, None);
    assert_eq!(sheet.pages.len(), 2);
    assert_footer_on_every_page(&sheet);

    for (i, line) in description.iter().enumerate() {
        assert_eq!(sheet.count_text(line), 1, "line {} placed once", i + 1);
    }
    // Nothing but the footer goes below the content bottom
    for page in &sheet.pages {
        let body_overflow = page
            .texts()
            .filter(|t| t.baseline > CONTENT_BOTTOM && t.size != 9.0)
            .count();
        assert_eq!(body_overflow, 0);
    }
    // The second page continues at the top margin
    let first_on_page_two = sheet.pages[1].texts().next().expect("page 2 has text");
    assert_eq!(first_on_page_two.baseline, sheet::TOP);
    assert_eq!(sheet.page_of("Línea 1 de la descripción"), Some(0));
    assert_eq!(sheet.page_of("Línea 50 de la descripción"), Some(1));
    assert_eq!(sheet.page_of("Contacto"), Some(sheet.pages.len() - 1));
}

#[test]
fn contact_block_kept_together() {
    // Enough description to leave the cursor just above the content bottom
    for lines in 20..40 {
        let mut record = common::record(r#"{"id": 11}"#);
        record.description = Some(vec!["texto"; lines].join("\n"));
        let sheet = compose(&record, None);
        let heading = sheet.page_of("Contacto");
        let last_line = sheet.page_of("• Dirección: Colón 647, San Luis, Argentina");
        assert_eq!(heading, last_line, "{lines} description lines");
    }
}

#[test]
fn section_starting_low_moves_to_next_page() {
    let fonts = FontSet::helvetica();
    // Title plus first row need 25mm, so 245mm is the last start that fits
    for (start, page) in [(244.0, 0), (245.0, 0), (247.0, 1), (249.5, 1), (252.0, 1)] {
        let mut c = sheet::Composer::new(&fonts);
        c.advance(start - sheet::TOP);
        c.section_heading("Características principales", 10.0, 7.0);
        let sheet = c.finish(&Branding::default(), common::fixed_date());
        assert_eq!(
            sheet.page_of("Características principales"),
            Some(page),
            "section starting at {start}mm"
        );
        let title = sheet.find_text("Características principales").expect("title");
        assert!(title.baseline + 17.0 <= CONTENT_BOTTOM, "first row fits below {start}mm");
    }
}

#[test]
fn long_title_wraps() {
    let mut record = common::record(r#"{"id": 12}"#);
    let title = "Excelente casa de tres dormitorios con amplio jardín y quincho en el centro de la ciudad";
    record.title = Some(title.to_string());
    let sheet = compose(&record, None);

    let title_lines: Vec<_> = sheet
        .texts()
        .filter(|t| t.size == 16.0)
        .map(|t| t.text.clone())
        .collect();
    assert!(title_lines.len() >= 2, "title should wrap: {title_lines:?}");
    assert_eq!(title_lines.join(" "), title);
}

#[test]
fn image_block_sizes() {
    let record = common::casa_centro();

    let sheet = compose(&record, Some((600, 450)));
    assert_eq!(sheet.count_text(IMAGE_PLACEHOLDER), 0);
    assert!(sheet.pages[0].has_image());
    let (x, width, height) = sheet.pages[0]
        .items
        .iter()
        .find_map(|item| match item {
            Item::Image { x, width, height, .. } => Some((*x, *width, *height)),
            _ => None,
        })
        .expect("image item");
    assert_eq!(x, MARGIN);
    assert!((width - CONTENT_WIDTH).abs() < 0.01);
    assert!((height - MAX_IMAGE_HEIGHT).abs() < 0.01);

    // Wide images keep full width and their aspect ratio
    let (w, h) = sheet::image_display_size(1200, 300);
    assert!((w - CONTENT_WIDTH).abs() < 0.01);
    assert!((h - 45.0).abs() < 0.01);

    // Tall images are capped and centred
    let tall = compose(&record, Some((300, 600)));
    let (x, width, height) = tall.pages[0]
        .items
        .iter()
        .find_map(|item| match item {
            Item::Image { x, width, height, .. } => Some((*x, *width, *height)),
            _ => None,
        })
        .expect("image item");
    assert!((height - MAX_IMAGE_HEIGHT).abs() < 0.01);
    assert!((width - MAX_IMAGE_HEIGHT / 2.0).abs() < 0.01);
    assert!((x - (MARGIN + (CONTENT_WIDTH - width) / 2.0)).abs() < 0.01);
}

#[test]
fn custom_branding_in_header_and_footer() {
    let branding = Branding::from_json(
        r#"{"name": "ACME", "subtitle": "PROPIEDADES", "phone": "123", "email": "a@b.c", "website": "acme.example"}"#,
    )
    .expect("branding JSON");
    let sheet = sheet::compose(
        &common::casa_centro(),
        None,
        &branding,
        common::fixed_date(),
        &FontSet::helvetica(),
    );
    assert!(sheet.find_text("ACME").is_some());
    assert!(sheet.find_text("PROPIEDADES").is_some());
    assert!(sheet.find_text("ACME Inmobiliaria").is_some());
    assert!(sheet.find_text("Tel: 123").is_some());
    assert!(sheet.find_text("acme.example").is_some());
    assert!(sheet.find_text("KARTTEM").is_none());
}
