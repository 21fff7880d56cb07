use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Error;

/// A property listing as served by `GET /property/public/{id}`.
///
/// The backend is loose about types (tinyint booleans, decimal strings), so
/// every optional field goes through a lenient deserializer: anything it
/// cannot make sense of becomes `None` instead of failing the whole record.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropertyRecord {
    #[serde(deserialize_with = "listing_id")]
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub property_type: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_ars: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub covered_area: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_area: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub garage: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_electricity: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_natural_gas: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_sewage: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_paved_street: Option<bool>,
    #[serde(default)]
    pub amenities: Option<Amenities>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Amenities {
    #[serde(deserialize_with = "lenient_bool")]
    pub has_pool: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_heating: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_ac: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_garden: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_laundry: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_parking: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_central_heating: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_lawn: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_fireplace: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_central_ac: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_high_ceiling: Option<bool>,
}

/// Display labels in the order the amenities grid is filled (row-major).
const AMENITY_LABELS: [(fn(&Amenities) -> Option<bool>, &str); 11] = [
    (|a: &Amenities| a.has_pool, "Piscina"),
    (|a: &Amenities| a.has_heating, "Calefacción"),
    (|a: &Amenities| a.has_ac, "Aire Acondicionado"),
    (|a: &Amenities| a.has_garden, "Jardín"),
    (|a: &Amenities| a.has_laundry, "Lavadero"),
    (|a: &Amenities| a.has_parking, "Estacionamiento"),
    (|a: &Amenities| a.has_central_heating, "Calefacción Central"),
    (|a: &Amenities| a.has_lawn, "Césped"),
    (|a: &Amenities| a.has_fireplace, "Chimenea"),
    (|a: &Amenities| a.has_central_ac, "Aire Acondicionado Central"),
    (|a: &Amenities| a.has_high_ceiling, "Techos Altos"),
];

impl Amenities {
    /// Labels of the flags that are explicitly `true`, in declaration order.
    pub fn labels(&self) -> Vec<&'static str> {
        AMENITY_LABELS
            .iter()
            .filter(|(flag, _)| flag(self) == Some(true))
            .map(|&(_, label)| label)
            .collect()
    }
}

impl PropertyRecord {
    pub fn amenity_labels(&self) -> Vec<&'static str> {
        self.amenities
            .as_ref()
            .map(Amenities::labels)
            .unwrap_or_default()
    }
}

/// Response envelope used by every public endpoint of the listings API.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

/// Parse a property from JSON, accepting either the bare record or the
/// `{ ok, msg, data }` envelope the API wraps it in.
pub fn parse_property_json(json: &str) -> Result<PropertyRecord, Error> {
    let value: Value = serde_json::from_str(json)?;
    let is_envelope = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("ok") && obj.contains_key("data"));
    if !is_envelope {
        return Ok(serde_json::from_value(value)?);
    }

    let response: ApiResponse<PropertyRecord> = serde_json::from_value(value)?;
    if !response.ok {
        return Err(Error::Api(response.msg));
    }
    response
        .data
        .ok_or_else(|| Error::Api(format!("response has no data ({})", response.msg)))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// An already-captured main image, still in its encoded form.
#[derive(Clone)]
pub struct RasterImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl RasterImage {
    /// Sniff the format from the magic bytes and read the header dimensions.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        let format = match data.as_slice() {
            [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,
            [0x89, b'P', b'N', b'G', ..] => ImageFormat::Png,
            _ => return Err(Error::InvalidImage("not a JPEG or PNG file".into())),
        };
        let image_format = match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        };
        let (pixel_width, pixel_height) =
            image::ImageReader::with_format(std::io::Cursor::new(&data), image_format)
                .into_dimensions()
                .map_err(|e| Error::InvalidImage(e.to_string()))?;
        Ok(Self {
            data,
            format,
            pixel_width,
            pixel_height,
        })
    }
}

fn listing_id<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid listing id {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid listing id {s:?}"))),
        other => Err(serde::de::Error::custom(format!(
            "invalid listing id {other}"
        ))),
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let parsed = match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|n| n.is_finite()))
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let parsed = match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(parsed.and_then(|n| u32::try_from(n).ok()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
