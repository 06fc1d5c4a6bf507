//! Encoding resolution for uploaded CSV bytes.
//!
//! Turns an upload of unknown encoding into text. No record-specific logic
//! here; row splitting lives in [`rows`].
//!
//! Candidates are tried in a fixed order:
//!
//! 1. byte-order mark (UTF-8, UTF-16LE, UTF-16BE), stripped before decoding
//! 2. strict UTF-8
//! 3. chardet's guess, when its confidence reaches [`DETECTION_CONFIDENCE`]
//! 4. Windows-1251
//!
//! Legacy decodes substitute U+FFFD for undecodable sequences instead of
//! failing, so a file in an unexpected encoding still decodes and is caught
//! later by the header check.

pub mod rows;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};

use crate::error::DecodeError;

pub use rows::{split_rows, HeaderMap, RowRecord, SplitFile, DELIMITER};

/// Minimum chardet confidence for its guess to be used.
pub const DETECTION_CONFIDENCE: f32 = 0.7;

/// Encoding used when detection is inconclusive. Maps every byte, so it
/// never fails on text input.
pub const LEGACY_FALLBACK: &Encoding = WINDOWS_1251;

/// Text decoded from an upload, with the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Decoded content, BOM removed.
    pub text: String,
    /// Name of the encoding used (WHATWG label, e.g. `UTF-8`, `windows-1251`).
    pub encoding: &'static str,
    /// Whether undecodable sequences were replaced with U+FFFD.
    pub had_replacements: bool,
}

impl DecodedText {
    /// Split into lines on universal newline boundaries (`\r\n`, `\r`, `\n`).
    ///
    /// A trailing line terminator does not produce an extra empty line.
    pub fn lines(&self) -> Vec<&str> {
        universal_lines(&self.text)
    }
}

/// Split text on `\r\n`, `\r` and `\n`.
pub fn universal_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        lines.push(&text[start..]);
    }

    lines
}

/// Resolve the encoding of raw upload bytes and decode them.
///
/// Pure function of its input. `DecodeError` is reserved for input no
/// candidate can map to text; Windows-1251 maps every byte, so with the
/// current candidates every input decodes.
///
/// # Example
/// ```ignore
/// use repairlog::parser::resolve;
///
/// let decoded = resolve("name;type\nHouse;PROPERTY".as_bytes()).unwrap();
/// assert_eq!(decoded.encoding, "UTF-8");
/// assert_eq!(decoded.lines(), vec!["name;type", "House;PROPERTY"]);
/// ```
pub fn resolve(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return Ok(decode_with(&bytes[bom_len..], encoding));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(DecodedText {
            text: text.to_string(),
            encoding: UTF_8.name(),
            had_replacements: false,
        });
    }

    let encoding = detect_encoding(bytes).unwrap_or(LEGACY_FALLBACK);
    Ok(decode_with(bytes, encoding))
}

/// Ask chardet for a best guess. Returns `None` below the confidence
/// threshold or when the charset has no known decoder.
pub fn detect_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let (charset, confidence, _language) = chardet::detect(bytes);
    if confidence < DETECTION_CONFIDENCE || charset.is_empty() {
        return None;
    }

    let label = chardet::charset2encoding(&charset);
    Encoding::for_label(label.as_bytes())
}

/// Decode with a specific encoding, replacing malformed sequences.
pub fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedText {
    let (text, had_replacements) = encoding.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_replacements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{ISO_8859_15, UTF_16LE};

    #[test]
    fn test_utf8_passthrough() {
        let text = "asset_name;date\nДом у озера;15.01.2024\r\nCafé €;2024-02-10\n";
        let decoded = resolve(text.as_bytes()).unwrap();

        assert_eq!(decoded.text, text);
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(!decoded.had_replacements);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"name;type\nHouse;PROPERTY");
        let decoded = resolve(&bytes).unwrap();

        assert_eq!(decoded.text, "name;type\nHouse;PROPERTY");
        assert_eq!(decoded.lines()[0], "name;type");
    }

    #[test]
    fn test_utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "name;type".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = resolve(&bytes).unwrap();

        assert_eq!(decoded.text, "name;type");
        assert_eq!(decoded.encoding, UTF_16LE.name());
    }

    #[test]
    fn test_windows_1251_resolved() {
        let text = "name;type\nДом у озера;PROPERTY\nГараж на улице Ленина;OTHER\nКвартира в центре города;PROPERTY\n";
        let (bytes, _, _) = WINDOWS_1251.encode(text);
        let decoded = resolve(&bytes).unwrap();

        assert_eq!(decoded.text, text);
        assert_eq!(decoded.encoding, "windows-1251");
    }

    #[test]
    fn test_windows_1251_decoding() {
        let bytes: &[u8] = &[0xC4, 0xEE, 0xEC];
        let decoded = decode_with(bytes, WINDOWS_1251);
        assert_eq!(decoded.text, "Дом");
        assert_eq!(decoded.encoding, "windows-1251");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_with(bytes, ISO_8859_15);
        assert_eq!(decoded.text, "Société");
    }

    #[test]
    fn test_nul_bytes_still_decode() {
        let decoded = resolve(b"name;type\nCaf\xe9\x00;OTHER\n").unwrap();
        assert!(decoded.text.starts_with("name;type\n"));
        assert_eq!(decoded.lines().len(), 2);

        let bytes: &[u8] = &[0x50, 0x4B, 0x03, 0x04, 0x00, 0x00, 0xFF, 0xFE, 0x00];
        assert!(resolve(bytes).is_ok());
    }

    #[test]
    fn test_universal_lines() {
        assert_eq!(universal_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(universal_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(universal_lines("").is_empty());
    }
}
