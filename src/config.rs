use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Error;

/// Environment variable the CLI reads when `--branding` is not given.
pub const BRANDING_ENV: &str = "KARTTEM_PDF_BRANDING";

/// Agency details printed on every sheet. Nothing here comes from the record.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Branding {
    /// Large header text; also the filename prefix.
    pub name: String,
    pub subtitle: String,
    pub phone: String,
    /// Digits only, as `wa.me` expects them.
    pub whatsapp: String,
    pub email: String,
    pub address: String,
    pub website: String,
    /// TrueType/OpenType files for body and bold text. Helvetica when unset.
    pub font_regular: Option<PathBuf>,
    pub font_bold: Option<PathBuf>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "KARTTEM".into(),
            subtitle: "INMOBILIARIA".into(),
            phone: "+54 9 2664 46-3038".into(),
            whatsapp: "5492664463038".into(),
            email: "info@karttemsa.com".into(),
            address: "Colón 647, San Luis, Argentina".into(),
            website: "www.karttemsa.com".into(),
            font_regular: None,
            font_bold: None,
        }
    }
}

impl Branding {
    /// Missing keys keep their defaults, so a file may override a single field.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        let mut branding = Self::from_json(&json)?;
        // Font paths in the file are relative to the file itself
        if let Some(dir) = path.parent() {
            for font in [&mut branding.font_regular, &mut branding.font_bold]
                .into_iter()
                .flatten()
            {
                if font.is_relative() {
                    *font = dir.join(&*font);
                }
            }
        }
        Ok(branding)
    }

    /// "KARTTEM Inmobiliaria", used in the footer and share messages.
    pub fn agency_name(&self) -> String {
        format!("{} Inmobiliaria", self.name)
    }

    pub fn filename(&self, listing_id: u64) -> String {
        format!("{}-Propiedad-{}.pdf", self.name, listing_id)
    }
}

/// Per-call inputs that are not part of the record.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub branding: Branding,
    /// Printed in the footer as "Generado el: dd/mm/yyyy".
    pub generated_on: NaiveDate,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            branding: Branding::default(),
            generated_on: chrono::Local::now().date_naive(),
        }
    }
}
