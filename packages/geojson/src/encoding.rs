//! Response charset normalization.
//!
//! Public APIs mostly answer in UTF-8, but some still declare `ISO-8859-*`
//! or `UTF-16` in their `Content-Type`. Everything is transcoded to UTF-8
//! before the JSON parser sees it. Bodies without a declared charset are
//! assumed to be UTF-8 and passed through; invalid byte sequences are left
//! for the JSON parser to reject.

use std::borrow::Cow;

use crate::IngestError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extracts the `charset` parameter from a `Content-Type` header value.
///
/// Surrounding quotes are stripped; case is preserved.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then_some(value)
    })
}

/// Transcodes `body` to UTF-8 according to the declared `charset`.
///
/// # Errors
///
/// Returns [`IngestError::UnsupportedEncoding`] for any charset other than
/// `UTF-8`, `US-ASCII`, `ISO-8859-*` or `UTF-16*` (notably `UTF-32`).
pub fn normalize<'a>(body: &'a [u8], charset: Option<&str>) -> Result<Cow<'a, [u8]>, IngestError> {
    let Some(charset) = charset.map(str::trim) else {
        return Ok(Cow::Borrowed(strip_utf8_bom(body)));
    };
    let label = charset.to_ascii_uppercase();

    if label.starts_with("UTF-8") || label == "UTF8" || label == "US-ASCII" || label == "ASCII" {
        return Ok(Cow::Borrowed(strip_utf8_bom(body)));
    }

    if label.starts_with("ISO-8859-") {
        return Ok(into_bytes(decode_iso_8859(body, &label)));
    }

    if label.starts_with("UTF-16") {
        let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
            .unwrap_or(encoding_rs::UTF_16LE);
        let (text, actual, had_errors) = encoding.decode(body);
        if had_errors {
            log::warn!(
                "Response declared {charset} but contained malformed {} sequences; \
                 invalid code units were replaced",
                actual.name()
            );
        }
        return Ok(into_bytes(text));
    }

    log::warn!("Unsupported response charset: {charset}");
    Err(IngestError::UnsupportedEncoding {
        charset: charset.to_string(),
    })
}

/// `ISO-8859-1` is reinterpreted byte-for-byte; other parts use their own
/// codec when one exists.
///
/// `ISO-8859-9` and `ISO-8859-11` only have `windows-1254` and `windows-874`
/// codecs, which put printable characters at 0x80-0x9F. Those bytes are
/// decoded as C1 controls instead, matching the ISO tables.
fn decode_iso_8859<'a>(body: &'a [u8], label: &str) -> Cow<'a, str> {
    if label == "ISO-8859-1" {
        return encoding_rs::mem::decode_latin1(body);
    }

    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding)
            if encoding == encoding_rs::WINDOWS_1254 || encoding == encoding_rs::WINDOWS_874 =>
        {
            Cow::Owned(decode_with_c1(body, encoding))
        }
        Some(encoding) if encoding != encoding_rs::WINDOWS_1252 => {
            encoding.decode_without_bom_handling(body).0
        }
        _ => {
            log::debug!("No dedicated codec for {label}, decoding as Latin-1");
            encoding_rs::mem::decode_latin1(body)
        }
    }
}

fn decode_with_c1(body: &[u8], encoding: &'static encoding_rs::Encoding) -> String {
    let mut text = String::with_capacity(body.len());
    for chunk in body.split_inclusive(|b| (0x80..=0x9F).contains(b)) {
        let (rest, c1) = match chunk.split_last() {
            Some((&last, rest)) if (0x80..=0x9F).contains(&last) => (rest, Some(char::from(last))),
            _ => (chunk, None),
        };
        text.push_str(&encoding.decode_without_bom_handling(rest).0);
        text.extend(c1);
    }
    text
}

fn strip_utf8_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(UTF8_BOM).unwrap_or(body)
}

fn into_bytes(text: Cow<'_, str>) -> Cow<'_, [u8]> {
    match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}
