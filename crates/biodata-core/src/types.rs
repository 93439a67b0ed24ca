// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: export identifiers, colours, page strategy, export
// receipts, and the biodata profile content.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BiodataError;

/// Unique identifier for one export invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExportId(pub Uuid);

impl ExportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque sRGB colour, written as `#rrggbb` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`.
    pub fn parse_hex(value: &str) -> Result<Self, BiodataError> {
        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| BiodataError::Config(format!("colour must start with '#': {value}")))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BiodataError::Config(format!("invalid hex digits in colour: {value}")));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_owned(),
            _ => {
                return Err(BiodataError::Config(format!(
                    "colour must be #rgb or #rrggbb: {value}"
                )));
            }
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| BiodataError::Config(format!("invalid hex digits in colour: {value}")))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = BiodataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// How the snapshot is distributed over pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStrategy {
    /// Embed the full snapshot once and place it on every page, shifted up
    /// by one page height per page. Relies on the viewer clipping to the
    /// page box.
    #[default]
    Reposition,
    /// Crop a page-tall slice of the snapshot for every page.
    Crop,
}

/// Result of a successful export, handed back to the trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReceipt {
    pub export_id: ExportId,
    /// Filename the host stored the document under (may differ from the
    /// requested name when the host de-duplicates).
    pub filename: String,
    /// Where the host put the file, if it is addressable.
    pub location: Option<PathBuf>,
    pub page_count: usize,
    /// Snapshot size in device pixels (width, height).
    pub snapshot_px: (u32, u32),
    /// SHA-256 of the PDF bytes, lowercase hex.
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

// -- Profile content ----------------------------------------------------------

/// Family background block of the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub father: String,
    pub mother: String,
    #[serde(default)]
    pub brother: Option<String>,
    pub native: String,
    pub current: String,
    #[serde(default)]
    pub maternal_uncle: Option<String>,
}

/// One photo in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Asset path, relative to the configured asset root unless absolute.
    pub src: String,
    pub alt: String,
}

/// The full biodata profile rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biodata {
    pub name: String,
    #[serde(default)]
    pub headline: Option<String>,
    pub caste: String,
    pub dob: String,
    pub blood: String,
    pub height: String,
    pub weight: String,
    pub age: String,
    pub education: String,
    /// Current employer; shown as "Open to Opportunities" when absent.
    #[serde(default)]
    pub company: Option<String>,
    pub current_place: String,
    pub phone: String,
    pub email: String,
    pub family: Family,
    #[serde(default)]
    pub property: Vec<String>,
    pub profile_photo: String,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub more_photos_url: Option<String>,
}

impl Biodata {
    /// Parse a profile from its JSON representation and validate it.
    pub fn from_json(json: &str) -> Result<Self, BiodataError> {
        let profile: Biodata = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject profiles the page cannot render meaningfully.
    pub fn validate(&self) -> Result<(), BiodataError> {
        if self.name.trim().is_empty() {
            return Err(BiodataError::InvalidProfile("name is empty".into()));
        }
        if self.profile_photo.trim().is_empty() {
            return Err(BiodataError::InvalidProfile("profile photo is empty".into()));
        }
        if let Some(bad) = self.gallery.iter().position(|img| img.src.trim().is_empty()) {
            return Err(BiodataError::InvalidProfile(format!(
                "gallery image {bad} has no source"
            )));
        }
        Ok(())
    }

    /// Occupation line as displayed.
    pub fn occupation(&self) -> &str {
        self.company.as_deref().unwrap_or("Open to Opportunities")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r##"{
        "name": "Test Person",
        "caste": "Hindu",
        "dob": "01/01/2000",
        "blood": "O+",
        "height": "5' 9\"",
        "weight": "70 kg",
        "age": "26",
        "education": "B.E.",
        "currentPlace": "Ahmedabad",
        "phone": "+91 00000 00000",
        "email": "test@example.com",
        "family": {
            "father": "Father",
            "mother": "Mother",
            "native": "Village",
            "current": "Town"
        },
        "profilePhoto": "profile.jpg",
        "gallery": [{ "src": "a.jpg", "alt": "A" }]
    }"##;

    #[test]
    fn parse_short_and_long_hex() {
        assert_eq!(Color::parse_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse_hex("#b45309").unwrap(), Color::rgb(0xb4, 0x53, 0x09));
        assert_eq!(Color::rgb(1, 2, 255).to_hex(), "#0102ff");
    }

    #[test]
    fn reject_malformed_hex() {
        assert!(Color::parse_hex("ffffff").is_err());
        assert!(Color::parse_hex("#ffff").is_err());
        assert!(Color::parse_hex("#gg0000").is_err());
    }

    #[test]
    fn reject_non_hex_characters_without_panicking() {
        for value in ["#0é000", "#é00", "#+f0000", "#00 000"] {
            let err = Color::parse_hex(value).unwrap_err();
            assert!(matches!(err, BiodataError::Config(_)), "{value}: {err}");
        }
        let err = serde_json::from_str::<Color>("\"#0é000\"").unwrap_err();
        assert!(err.to_string().contains("invalid hex digits"));
    }

    #[test]
    fn profile_parses_with_optional_fields_missing() {
        let profile = Biodata::from_json(PROFILE).expect("parse profile");
        assert_eq!(profile.name, "Test Person");
        assert_eq!(profile.occupation(), "Open to Opportunities");
        assert!(profile.family.brother.is_none());
        assert_eq!(profile.gallery.len(), 1);
    }

    #[test]
    fn empty_name_is_rejected() {
        let json = PROFILE.replace("Test Person", "  ");
        let err = Biodata::from_json(&json).unwrap_err();
        assert!(matches!(err, BiodataError::InvalidProfile(_)));
    }

    #[test]
    fn page_strategy_defaults_to_reposition() {
        assert_eq!(PageStrategy::default(), PageStrategy::Reposition);
        let crop: PageStrategy = serde_json::from_str("\"crop\"").unwrap();
        assert_eq!(crop, PageStrategy::Crop);
    }
}
