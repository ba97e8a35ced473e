//! Plain-text extraction from a (possibly multi-part) message body.
//!
//! Plain-text parts win; HTML parts are a fallback with tags stripped.
//! Attachments are never read. Decoding is lossy: bad bytes become U+FFFD
//! and one broken part never hides the others.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use tracing::debug;

use crate::pipeline::types::{BodyPart, MessageBody, PartKind};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<]+?>").unwrap());

/// Extract the text used for classification from a message body.
///
/// Returns an empty string when the body has no readable text part.
pub fn extract_text(body: &MessageBody) -> String {
    let plain = collect(body, PartKind::PlainText);
    if !plain.is_empty() {
        return plain.join("\n");
    }

    let html = collect(body, PartKind::Html);
    if !html.is_empty() {
        return strip_tags(&html.join("\n"));
    }

    String::new()
}

/// Decode every non-attachment part of `kind`, in document order.
fn collect(body: &MessageBody, kind: PartKind) -> Vec<String> {
    body.parts()
        .iter()
        .filter(|part| part.kind == kind && !part.is_attachment())
        .map(decode_part)
        .collect()
}

/// Decode a part with its declared charset, defaulting to UTF-8.
pub fn decode_part(part: &BodyPart) -> String {
    let encoding = match part.charset.as_deref() {
        Some(label) => Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
            debug!(charset = %label, "Unknown charset label, decoding as UTF-8");
            UTF_8
        }),
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(&part.bytes);
    if had_errors {
        debug!(
            charset = used.name(),
            "Part contained undecodable bytes, substituted replacement characters"
        );
    }
    text.into_owned()
}

/// Best-effort tag stripper: removes `<...>` spans, keeps everything else.
///
/// Not an HTML parser; entities and script bodies pass through untouched.
pub fn strip_tags(markup: &str) -> String {
    TAG.replace_all(markup, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ContentDisposition;

    #[test]
    fn single_plain_part() {
        let body = MessageBody::Single(BodyPart::plain("Table for two please"));
        assert_eq!(extract_text(&body), "Table for two please");
    }

    #[test]
    fn plain_parts_joined_with_newlines() {
        let body = MessageBody::Multipart(vec![
            BodyPart::plain("first"),
            BodyPart::html("<p>ignored</p>"),
            BodyPart::plain("second"),
        ]);
        assert_eq!(extract_text(&body), "first\nsecond");
    }

    #[test]
    fn html_fallback_strips_tags() {
        let body = MessageBody::Multipart(vec![BodyPart::html("<p>party of 3 at 8pm</p>")]);
        assert_eq!(extract_text(&body), "party of 3 at 8pm");
    }

    #[test]
    fn html_with_attributes_stripped() {
        assert_eq!(
            strip_tags(r#"<a href="https://example.com">Book</a> <b>now</b>"#),
            "Book now"
        );
    }

    #[test]
    fn stray_angle_bracket_survives() {
        assert_eq!(strip_tags("5 < 6 guests"), "5 < 6 guests");
    }

    #[test]
    fn attachments_are_skipped() {
        let body = MessageBody::Multipart(vec![
            BodyPart::plain("menu.txt contents")
                .with_disposition(ContentDisposition::Attachment),
            BodyPart::html("<div>hello</div>"),
        ]);
        assert_eq!(extract_text(&body), "hello");
    }

    #[test]
    fn inline_disposition_is_read() {
        let body = MessageBody::Single(
            BodyPart::plain("inline text").with_disposition(ContentDisposition::Inline),
        );
        assert_eq!(extract_text(&body), "inline text");
    }

    #[test]
    fn no_text_parts_yields_empty_string() {
        let body = MessageBody::Multipart(vec![BodyPart::new(PartKind::Other, vec![0xFF, 0xD8])]);
        assert_eq!(extract_text(&body), "");
    }

    #[test]
    fn declared_charset_is_honoured() {
        let part = BodyPart::new(PartKind::PlainText, vec![b'c', b'a', b'f', 0xE9])
            .with_charset("iso-8859-1");
        assert_eq!(decode_part(&part), "café");
    }

    #[test]
    fn invalid_bytes_are_replaced_not_dropped() {
        let body = MessageBody::Multipart(vec![
            BodyPart::new(PartKind::PlainText, vec![b'o', b'k', 0xFF]),
            BodyPart::plain("still here"),
        ]);
        assert_eq!(extract_text(&body), "ok\u{FFFD}\nstill here");
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        let part = BodyPart::plain("booking").with_charset("x-made-up");
        assert_eq!(decode_part(&part), "booking");
    }
}
