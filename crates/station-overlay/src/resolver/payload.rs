// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Station service payload decoding.
//!
//! The station service has been seen answering in two shapes:
//!
//! ```text
//! {"latitude": -3.765, "longitude": -38.535, "nome": "Posto 1", "raio": 100}
//! {"Lat": "-3.765", "Lng": "-38.535", "Nome": "Posto 1", "Raio": "100"}
//! <posto><latitude>-3.765</latitude><longitude>-38.535</longitude><nome>Posto 1</nome></posto>
//! ```
//!
//! JSON is the canonical contract. Tagged text is accepted when the body
//! starts with `<`. Keys and tag names are matched case-insensitively and
//! numeric fields may be numbers or strings.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{parse_coordinate, parse_radius};

const LATITUDE_KEYS: &[&str] = &["latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "lng", "lon"];
const NAME_KEYS: &[&str] = &["nome", "name"];
const RADIUS_KEYS: &[&str] = &["raio", "radius"];

/// Errors decoding a station payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("empty payload")]
    Empty,

    #[error("malformed JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Station fields as found in a payload; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub name: Option<String>,
    pub radius_m: Option<u32>,
}

/// Decode a station payload in either JSON or tagged-text form.
pub fn parse_station_payload(body: &str) -> Result<RawStation, PayloadError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(PayloadError::Empty);
    }

    if trimmed.starts_with('<') {
        Ok(parse_tagged(trimmed))
    } else {
        parse_json(trimmed)
    }
}

fn parse_json(body: &str) -> Result<RawStation, PayloadError> {
    let value: Value = serde_json::from_str(body)?;
    let object = match &value {
        Value::Object(map) => map,
        Value::Array(_) => return Err(PayloadError::NotAnObject("array")),
        Value::String(_) => return Err(PayloadError::NotAnObject("string")),
        Value::Number(_) => return Err(PayloadError::NotAnObject("number")),
        Value::Bool(_) => return Err(PayloadError::NotAnObject("bool")),
        Value::Null => return Err(PayloadError::NotAnObject("null")),
    };

    Ok(RawStation {
        latitude: json_field(object, LATITUDE_KEYS).and_then(json_coordinate),
        longitude: json_field(object, LONGITUDE_KEYS).and_then(json_coordinate),
        name: json_field(object, NAME_KEYS).and_then(json_name),
        radius_m: json_field(object, RADIUS_KEYS).and_then(json_radius),
    })
}

/// First value whose key matches one of `aliases`, in alias order.
fn json_field<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        object
            .iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(alias) && !value.is_null())
            .map(|(_, value)| value)
    })
}

fn json_coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_coordinate(s),
        _ => None,
    }
}

fn json_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "radius is range-checked before truncating to whole meters"
)]
fn json_radius(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 1.0 && *v <= f64::from(u32::MAX))
            .map(|v| v.trunc() as u32),
        Value::String(s) => parse_radius(s),
        _ => None,
    }
}

fn parse_tagged(body: &str) -> RawStation {
    RawStation {
        latitude: tagged_field(body, LATITUDE_KEYS).and_then(|v| parse_coordinate(&v)),
        longitude: tagged_field(body, LONGITUDE_KEYS).and_then(|v| parse_coordinate(&v)),
        name: tagged_field(body, NAME_KEYS).filter(|v| !v.is_empty()),
        radius_m: tagged_field(body, RADIUS_KEYS).and_then(|v| parse_radius(&v)),
    }
}

fn tagged_field(body: &str, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|tag| tag_text(body, tag))
        .map(|text| unescape(text.trim()))
}

/// Text between `<tag ...>` and `</tag>`, matching the tag name case-insensitively.
fn tag_text<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets identical to `body`.
    let lower = body.to_ascii_lowercase();
    let tag = tag.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");

    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find(&open) {
        let start = search_from + found;
        let after_name = start + open.len();

        // Reject longer tag names sharing the prefix, e.g. <latitude_ref>.
        match lower[after_name..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {}
            _ => {
                search_from = after_name;
                continue;
            }
        }

        let tag_end = after_name + lower[after_name..].find('>')?;
        // Self-closing tags carry no text; keep looking for a full element.
        if lower[..tag_end].ends_with('/') {
            search_from = tag_end + 1;
            continue;
        }

        let content_start = tag_end + 1;
        let content_end = content_start + lower[content_start..].find(&close)?;
        return Some(&body[content_start..content_end]);
    }

    None
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_lowercase_keys() {
        let raw = parse_station_payload(
            r#"{"latitude": -3.765, "longitude": -38.535, "nome": "Posto Centro", "raio": 100}"#,
        )
        .unwrap();
        assert_eq!(raw.latitude, Some(-3.765));
        assert_eq!(raw.longitude, Some(-38.535));
        assert_eq!(raw.name.as_deref(), Some("Posto Centro"));
        assert_eq!(raw.radius_m, Some(100));
    }

    #[test]
    fn test_parse_json_capitalised_string_fields() {
        let raw = parse_station_payload(
            r#"{"Lat": "-3.75", "Lng": "-38.52", "Nome": "Posto 2", "Raio": "80"}"#,
        )
        .unwrap();
        assert_eq!(raw.latitude, Some(-3.75));
        assert_eq!(raw.longitude, Some(-38.52));
        assert_eq!(raw.name.as_deref(), Some("Posto 2"));
        assert_eq!(raw.radius_m, Some(80));
    }

    #[test]
    fn test_parse_json_missing_fields_are_none() {
        let raw = parse_station_payload(r#"{"latitude": -3.7, "nome": null}"#).unwrap();
        assert_eq!(raw.latitude, Some(-3.7));
        assert!(raw.longitude.is_none());
        assert!(raw.name.is_none());
        assert!(raw.radius_m.is_none());
    }

    #[test]
    fn test_parse_json_rejects_non_object() {
        assert!(matches!(
            parse_station_payload("[1, 2]"),
            Err(PayloadError::NotAnObject("array"))
        ));
        assert!(matches!(
            parse_station_payload("{not json"),
            Err(PayloadError::InvalidJson(_))
        ));
        assert!(matches!(parse_station_payload("  "), Err(PayloadError::Empty)));
    }

    #[test]
    fn test_parse_tagged_text() {
        let raw = parse_station_payload(
            "<posto>\n  <Latitude>-3.7780</Latitude>\n  <longitude>-38.5450</longitude>\n  <nome>Posto &amp; Terminal</nome>\n  <raio>120</raio>\n</posto>",
        )
        .unwrap();
        assert_eq!(raw.latitude, Some(-3.778));
        assert_eq!(raw.longitude, Some(-38.545));
        assert_eq!(raw.name.as_deref(), Some("Posto & Terminal"));
        assert_eq!(raw.radius_m, Some(120));
    }

    #[test]
    fn test_tag_text_skips_longer_tag_names() {
        let body = "<r><latitude_ref>x</latitude_ref><latitude>-3.5</latitude></r>";
        assert_eq!(tag_text(body, "latitude"), Some("-3.5"));
        assert_eq!(tag_text(body, "lat"), None);
    }

    #[test]
    fn test_tag_text_skips_self_closing_tags() {
        assert_eq!(
            tag_text("<latitude/><latitude>-3.5</latitude>", "latitude"),
            Some("-3.5")
        );
        assert_eq!(
            tag_text(r#"<raio unit="m" /><raio>90</raio>"#, "raio"),
            Some("90")
        );
        assert_eq!(tag_text("<latitude/>", "latitude"), None);
    }

    #[test]
    fn test_tag_text_with_attributes() {
        let body = r#"<posto><raio unit="m">90</raio></posto>"#;
        assert_eq!(tag_text(body, "raio"), Some("90"));
    }
}
