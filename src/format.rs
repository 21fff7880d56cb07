//! Display strings shared by the listing sheet and the share links.

use chrono::NaiveDate;

use crate::model::PropertyRecord;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Currency {
    Ars,
    Usd,
}

/// Shown whenever a listing has no usable price.
pub const PRICE_ON_REQUEST: &str = "Consultar";

const DEFAULT_TYPE: &str = "Propiedad";

/// `1234567` → `"1.234.567"`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Rounds half away from zero, then groups. Non-positive amounts are not
/// prices, so they read as [`PRICE_ON_REQUEST`].
pub fn format_price(amount: f64, currency: Currency) -> String {
    if !amount.is_finite() || amount <= 0.0 {
        return PRICE_ON_REQUEST.to_string();
    }
    let grouped = group_thousands(amount.round() as i64);
    match currency {
        Currency::Ars => format!("${grouped}"),
        Currency::Usd => format!("U$D {grouped}"),
    }
}

/// ARS wins over USD; with neither, the price is on request.
pub fn property_price(record: &PropertyRecord) -> String {
    match (record.price_ars, record.price_usd) {
        (Some(ars), _) if ars > 0.0 => format_price(ars, Currency::Ars),
        (_, Some(usd)) if usd > 0.0 => format_price(usd, Currency::Usd),
        _ => PRICE_ON_REQUEST.to_string(),
    }
}

pub fn status_label(status: &str) -> &str {
    match status {
        "sale" => "Venta",
        "rent" => "Alquiler",
        "temporary_rent" => "Alquiler Temporario",
        "venta_en_pozo" => "Venta en Pozo",
        "sold" => "Vendido",
        "rented" => "Alquilado",
        "reserved" => "Reservado",
        other => other,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `type_name`, then `type`, then the generic "Propiedad".
pub fn type_label(record: &PropertyRecord) -> &str {
    [&record.type_name, &record.property_type]
        .into_iter()
        .find_map(non_blank)
        .unwrap_or(DEFAULT_TYPE)
}

/// "Casa en venta"; just the type when the listing has no status.
pub fn status_line(record: &PropertyRecord) -> String {
    let kind = type_label(record);
    match non_blank(&record.status) {
        Some(status) => format!("{kind} en {}", status_label(status).to_lowercase()),
        None => kind.to_string(),
    }
}

pub fn location_line(record: &PropertyRecord) -> Option<String> {
    let parts: Vec<&str> = [&record.address, &record.city]
        .into_iter()
        .filter_map(non_blank)
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

pub fn title(record: &PropertyRecord) -> &str {
    non_blank(&record.title).unwrap_or("Propiedad sin título")
}

pub fn description(record: &PropertyRecord) -> Option<&str> {
    non_blank(&record.description)
}

/// Areas only count when strictly positive; zero means "not loaded".
pub fn area(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

pub fn format_area(square_meters: f64) -> String {
    format!("{square_meters} m²")
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "Sí" } else { "No" }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
