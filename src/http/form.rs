//! Form field decoding
//!
//! Only what the transcode endpoint needs: look up one field by name in a
//! urlencoded or multipart request body, or in a query string.

use std::convert::Infallible;

use hyper::body::Bytes;
use percent_encoding::percent_decode_str;

/// Content type of HTML form posts
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Content type browsers use for `FormData` posts
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// How a request body carries its form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    UrlEncoded,
    Multipart,
}

impl FormEncoding {
    /// Classify a `Content-Type` header value; `None` for non-form bodies
    pub fn from_content_type(value: &str) -> Option<Self> {
        let mime = value.split(';').next()?.trim();
        if mime.eq_ignore_ascii_case(FORM_URLENCODED) {
            Some(Self::UrlEncoded)
        } else if mime.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
            Some(Self::Multipart)
        } else {
            None
        }
    }
}

/// Iterate over decoded `(name, value)` pairs
pub fn parse_pairs(input: &str) -> impl Iterator<Item = (String, String)> + '_ {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (decode_component(name), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
}

/// First value of field `name`, if present
pub fn find_field(input: &str, name: &str) -> Option<String> {
    parse_pairs(input).find(|(n, _)| n == name).map(|(_, v)| v)
}

/// `+` means space, then percent-decode; invalid UTF-8 is replaced
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// First value of part `name` in a `multipart/form-data` body.
///
/// `content_type` is the full header value; the boundary is taken from it.
/// Parts with other names, file uploads included, are skipped unread.
pub async fn find_multipart_field(
    body: Bytes,
    content_type: &str,
    name: &str,
) -> Result<Option<String>, multer::Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(name) {
            return field.text().await.map(Some);
        }
    }
    Ok(None)
}
