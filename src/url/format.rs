//! Response formats and decoded payloads

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::UrlError;

/// Expected format of a URL response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// JSON document (`"json"`)
    Json,
    /// UTF-8 text (`"string"`)
    String,
    /// Raw bytes (`"data"`)
    Data,
    /// Property list, XML or binary (`"plist"`)
    Plist,
    /// PNG, GIF or JPEG image (`"image"`)
    Image,
}

impl ResponseFormat {
    /// Format tag as used in manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::String => "string",
            ResponseFormat::Data => "data",
            ResponseFormat::Plist => "plist",
            ResponseFormat::Image => "image",
        }
    }

    /// Decode a response body
    pub fn decode(&self, body: Bytes) -> Result<Payload, UrlError> {
        match self {
            ResponseFormat::Json => serde_json::from_slice(&body)
                .map(Payload::Json)
                .map_err(|e| UrlError::decode(*self, e)),
            ResponseFormat::String => String::from_utf8(body.to_vec())
                .map(Payload::Text)
                .map_err(|e| UrlError::decode(*self, e)),
            ResponseFormat::Data => Ok(Payload::Data(body)),
            ResponseFormat::Plist => plist::Value::from_reader(Cursor::new(&body[..]))
                .map(Payload::Plist)
                .map_err(|e| UrlError::decode(*self, e)),
            ResponseFormat::Image => image::load_from_memory(&body)
                .map(|img| Payload::Image(Arc::new(img)))
                .map_err(|e| UrlError::decode(*self, e)),
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "string" => Ok(ResponseFormat::String),
            "data" => Ok(ResponseFormat::Data),
            "plist" => Ok(ResponseFormat::Plist),
            "image" => Ok(ResponseFormat::Image),
            _ => Err(UrlError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded URL response
///
/// Cheap to clone: images are shared and raw data is reference-counted.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    Data(Bytes),
    Plist(plist::Value),
    Image(Arc<image::DynamicImage>),
}

impl Payload {
    /// Format this payload was decoded from
    pub fn format(&self) -> ResponseFormat {
        match self {
            Payload::Json(_) => ResponseFormat::Json,
            Payload::Text(_) => ResponseFormat::String,
            Payload::Data(_) => ResponseFormat::Data,
            Payload::Plist(_) => ResponseFormat::Plist,
            Payload::Image(_) => ResponseFormat::Image,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_plist(&self) -> Option<&plist::Value> {
        match self {
            Payload::Plist(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&image::DynamicImage> {
        match self {
            Payload::Image(img) => Some(img),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_tags() {
        assert_eq!("json".parse::<ResponseFormat>().unwrap(), ResponseFormat::Json);
        assert_eq!("String".parse::<ResponseFormat>().unwrap(), ResponseFormat::String);
        assert_eq!(" data ".parse::<ResponseFormat>().unwrap(), ResponseFormat::Data);
        assert_eq!("plist".parse::<ResponseFormat>().unwrap(), ResponseFormat::Plist);
        assert_eq!("image".parse::<ResponseFormat>().unwrap(), ResponseFormat::Image);
        assert!(matches!(
            "xml".parse::<ResponseFormat>(),
            Err(UrlError::UnknownFormat(tag)) if tag == "xml"
        ));
    }

    #[test]
    fn test_decode_json() {
        let payload = ResponseFormat::Json
            .decode(Bytes::from_static(br#"{"temp": 21}"#))
            .unwrap();

        assert_eq!(payload.as_json().unwrap()["temp"], 21);
        assert_eq!(payload.format(), ResponseFormat::Json);
    }

    #[test]
    fn test_decode_text() {
        let payload = ResponseFormat::String
            .decode(Bytes::from_static(b"hello"))
            .unwrap();

        assert_eq!(payload.as_text(), Some("hello"));
    }

    #[test]
    fn test_decode_data_is_zero_copy() {
        let body = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);
        let payload = ResponseFormat::Data.decode(body.clone()).unwrap();

        assert_eq!(payload.as_bytes(), Some(&body));
    }

    #[test]
    fn test_decode_xml_plist() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>count</key>
    <integer>3</integer>
</dict>
</plist>"#;
        let payload = ResponseFormat::Plist.decode(Bytes::from_static(body)).unwrap();

        let dict = payload.as_plist().unwrap().as_dictionary().unwrap();
        assert_eq!(dict.get("count").and_then(|v| v.as_signed_integer()), Some(3));
    }

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        image::DynamicImage::new_rgb8(2, 3)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let payload = ResponseFormat::Image.decode(Bytes::from(png)).unwrap();
        let img = payload.as_image().unwrap();
        assert_eq!((img.width(), img.height()), (2, 3));
    }

    #[test]
    fn test_decode_errors_name_the_format() {
        let err = ResponseFormat::Json
            .decode(Bytes::from_static(b"not json"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to decode json response"));

        assert!(ResponseFormat::String
            .decode(Bytes::from_static(&[0xff, 0xfe]))
            .is_err());
        assert!(ResponseFormat::Image
            .decode(Bytes::from_static(b"not an image"))
            .is_err());
    }

    #[test]
    fn test_serde_tags() {
        let format: ResponseFormat = serde_json::from_str("\"plist\"").unwrap();

        assert_eq!(format, ResponseFormat::Plist);
        assert_eq!(serde_json::to_string(&ResponseFormat::Image).unwrap(), "\"image\"");
    }
}
