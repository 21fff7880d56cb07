//! WhatsApp, e-mail and social links for contacting the agency about a
//! listing or sharing it.

use url::form_urlencoded;

use crate::config::Branding;
use crate::format;
use crate::model::PropertyRecord;

/// Percent-encode like a URI component: spaces become `%20`, not `+`.
fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// What the visitor wants to do with the listing, as a verb.
fn inquiry_verb(status: &str) -> &str {
    match status {
        "sale" | "venta_en_pozo" => "comprar",
        "rent" => "alquilar",
        "temporary_rent" => "alquilar temporalmente",
        other => other,
    }
}

/// Message sent to the agency's WhatsApp number from a listing.
pub fn inquiry_message(record: &PropertyRecord) -> String {
    let title = format::title(record);
    let intent = match record.status.as_deref().map(str::trim) {
        Some(status) if !status.is_empty() => format!("en {} la propiedad", inquiry_verb(status)),
        _ => "en la propiedad".to_string(),
    };
    format!(
        "Hola, estoy interesado/a {intent}: {title} (ID: {}). ¿Podrían brindarme más información?",
        record.id
    )
}

/// `https://wa.me/<agency number>?text=…` opening a chat with the agency.
pub fn whatsapp_inquiry_link(record: &PropertyRecord, branding: &Branding) -> String {
    format!(
        "https://wa.me/{}?text={}",
        branding.whatsapp,
        encode_component(&inquiry_message(record))
    )
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Message a visitor forwards to a contact.
pub fn share_message(record: &PropertyRecord, page_url: &str, branding: &Branding) -> String {
    let mut text = format!(
        "¡Mira esta {} en {}!\n\n",
        format::status_line(record),
        branding.agency_name()
    );
    if let Some(location) = format::location_line(record) {
        text.push_str(&format!("📍 {location}\n"));
    }
    text.push_str(&format!("💰 {}\n\n", format::property_price(record)));
    if let Some(description) = format::description(record) {
        text.push_str(&format!("{}...\n\n", excerpt(description, 100)));
    }
    text.push_str(&format!("Más detalles: {page_url}"));
    text
}

/// `https://wa.me/?text=…` letting the visitor pick who to share with.
pub fn whatsapp_share_link(record: &PropertyRecord, page_url: &str, branding: &Branding) -> String {
    format!(
        "https://wa.me/?text={}",
        encode_component(&share_message(record, page_url, branding))
    )
}

/// `mailto:` link with a prefilled subject and a summary of the listing.
pub fn email_share_link(record: &PropertyRecord, page_url: &str, branding: &Branding) -> String {
    let location = format::location_line(record);
    // The subject names the street address only; the body carries the city
    let address = record.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
    let subject = match address {
        Some(address) => format!("{} - {address}", format::status_line(record)),
        None => format::status_line(record),
    };

    let mut body = format!(
        "¡Mira esta propiedad que encontré en {}!\n\n{}\n",
        branding.agency_name(),
        format::title(record)
    );
    if let Some(location) = &location {
        body.push_str(&format!("Ubicación: {location}\n"));
    }
    body.push_str(&format!("Precio: {}\n\n", format::property_price(record)));
    if let Some(description) = format::description(record) {
        body.push_str(description);
        body.push_str("\n\n");
    }

    let mut features = Vec::new();
    if let Some(n) = record.bedrooms {
        features.push(format!("- Habitaciones: {n}"));
    }
    if let Some(n) = record.bathrooms {
        features.push(format!("- Baños: {n}"));
    }
    if let Some(area) = format::area(record.covered_area) {
        features.push(format!("- Superficie cubierta: {}", format::format_area(area)));
    }
    if let Some(area) = format::area(record.total_area) {
        features.push(format!("- Superficie total: {}", format::format_area(area)));
    }
    if !features.is_empty() {
        body.push_str("Características principales:\n");
        body.push_str(&features.join("\n"));
        body.push_str("\n\n");
    }
    body.push_str(&format!("Más detalles: {page_url}"));

    format!(
        "mailto:?subject={}&body={}",
        encode_component(&subject),
        encode_component(&body)
    )
}

/// Facebook's sharer dialog for the listing page.
pub fn facebook_share_link(page_url: &str) -> String {
    format!(
        "https://www.facebook.com/sharer/sharer.php?u={}",
        encode_component(page_url)
    )
}

/// Tweet composer prefilled with "{title} - {price} | {agency}" and the page.
pub fn twitter_share_link(record: &PropertyRecord, page_url: &str, branding: &Branding) -> String {
    let text = format!(
        "{} - {} | {}",
        format::title(record),
        format::property_price(record),
        branding.agency_name()
    );
    format!(
        "https://twitter.com/intent/tweet?text={}&url={}",
        encode_component(&text),
        encode_component(page_url)
    )
}
