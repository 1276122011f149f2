//! Content-Disposition header handling.
//!
//! Uploads carry the source filename to the service in a `Content-Disposition`
//! header; downloads derive the destination filename from the same header on
//! the response. Both directions support the plain quoted form
//! (`filename="track.mp3"`) and the RFC 5987 extended form with a charset
//! prefix (`filename*=utf-8''na%C3%AFve.mp3`).

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use super::error::ApiError;

/// Format an `attachment` Content-Disposition value for the given filename.
///
/// ASCII names use the plain quoted form; anything else is percent-encoded
/// into the extended `filename*` form.
pub fn attachment(filename: &str) -> String {
    if filename.is_ascii() {
        format!("attachment; filename=\"{filename}\"")
    } else {
        let quoted = utf8_percent_encode(filename, NON_ALPHANUMERIC);
        format!("attachment; filename*=utf-8''{quoted}")
    }
}

/// Extract the filename from a Content-Disposition header value.
///
/// The extended `filename*` form takes precedence over the plain form when
/// both are present. Only the `utf-8` charset is accepted.
pub fn parse_filename(header: &str) -> Result<String, ApiError> {
    let mut plain: Option<String> = None;

    for raw_segment in header.split(';') {
        let segment = raw_segment.trim();
        if let Some(encoded) = segment.strip_prefix("filename*=") {
            let (charset, rest) = encoded.split_once("''").ok_or_else(|| {
                ApiError::Protocol(format!("malformed extended filename: {encoded:?}"))
            })?;
            if !charset.eq_ignore_ascii_case("utf-8") {
                return Err(ApiError::Protocol(format!(
                    "unsupported filename charset: {charset:?}"
                )));
            }
            let decoded = percent_decode_str(rest).decode_utf8().map_err(|_| {
                ApiError::Protocol(format!("extended filename is not valid UTF-8: {rest:?}"))
            })?;
            return Ok(decoded.into_owned());
        }
        if let Some(quoted) = segment.strip_prefix("filename=") {
            plain = Some(quoted.trim_matches('"').to_string());
        }
    }

    plain.ok_or_else(|| ApiError::Protocol(format!("invalid Content-Disposition: {header:?}")))
}
