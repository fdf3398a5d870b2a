use std::{convert::TryFrom, fmt, str::FromStr};

use crate::error::NwsError;

/// Response representations offered by api.weather.gov.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    GeoJson,
    JsonLd,
    Dwml,
    Oxml,
    Cap,
    Atom,
}

impl Format {
    /// Logical name, as accepted by [`Format::try_from`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::GeoJson => "geojson",
            Format::JsonLd => "json-ld",
            Format::Dwml => "dwml",
            Format::Oxml => "oxml",
            Format::Cap => "cap",
            Format::Atom => "atom",
        }
    }

    /// Value sent in the `Accept` header.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::GeoJson => "application/geo+json",
            Format::JsonLd => "application/ld+json",
            Format::Dwml => "application/vnd.noaa.dwml+xml",
            Format::Oxml => "application/vnd.noaa.obs+xml",
            Format::Cap => "application/cap+xml",
            Format::Atom => "application/atom+xml",
        }
    }

    /// Bodies of JSON formats are decoded; everything else is handed back as text.
    pub fn is_json(&self) -> bool {
        matches!(self, Format::GeoJson | Format::JsonLd)
    }

    pub const fn all() -> &'static [Format] {
        &[
            Format::GeoJson,
            Format::JsonLd,
            Format::Dwml,
            Format::Oxml,
            Format::Cap,
            Format::Atom,
        ]
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Format {
    type Error = NwsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "geojson" => Ok(Format::GeoJson),
            "json-ld" | "jsonld" => Ok(Format::JsonLd),
            "dwml" => Ok(Format::Dwml),
            "oxml" => Ok(Format::Oxml),
            "cap" => Ok(Format::Cap),
            "atom" => Ok(Format::Atom),
            _ => Err(NwsError::UnsupportedFormat(value.to_string())),
        }
    }
}

impl FromStr for Format {
    type Err = NwsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::try_from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_as_str_roundtrip() {
        for format in Format::all() {
            let parsed = Format::try_from(format.as_str()).expect("roundtrip should succeed");
            assert_eq!(*format, parsed);
        }
    }

    #[test]
    fn content_types_match_upstream_table() {
        assert_eq!(Format::GeoJson.content_type(), "application/geo+json");
        assert_eq!(Format::JsonLd.content_type(), "application/ld+json");
        assert_eq!(Format::Dwml.content_type(), "application/vnd.noaa.dwml+xml");
        assert_eq!(Format::Oxml.content_type(), "application/vnd.noaa.obs+xml");
        assert_eq!(Format::Cap.content_type(), "application/cap+xml");
        assert_eq!(Format::Atom.content_type(), "application/atom+xml");
    }

    #[test]
    fn parsing_is_case_insensitive_and_accepts_aliases() {
        assert_eq!("GeoJSON".parse::<Format>().unwrap(), Format::GeoJson);
        assert_eq!("JSONLD".parse::<Format>().unwrap(), Format::JsonLd);
        assert_eq!(" Json-LD ".parse::<Format>().unwrap(), Format::JsonLd);
        assert_eq!("ATOM".parse::<Format>().unwrap(), Format::Atom);
    }

    #[test]
    fn unknown_format_error() {
        let err = Format::try_from("yaml").unwrap_err();
        assert!(matches!(err, NwsError::UnsupportedFormat(ref name) if name == "yaml"));
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("Unsupported format 'yaml'"));
    }

    #[test]
    fn only_json_family_is_decoded() {
        let json: Vec<_> = Format::all().iter().filter(|f| f.is_json()).collect();
        assert_eq!(json, vec![&Format::GeoJson, &Format::JsonLd]);
        assert_eq!(Format::default(), Format::GeoJson);
    }
}
