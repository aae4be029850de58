//! Plain-text conversion of rendered messages

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\n\r ]+").expect("valid whitespace regex"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&#?[a-z0-9]{2,8};").expect("valid entity regex"));

/// Remove HTML tags, keep text content
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Single-line text suitable for SMS
///
/// Tags are removed, runs of newlines/carriage returns/spaces collapse to one
/// space and HTML entities are dropped.
pub fn sms_text(message: &str) -> String {
    let text = strip_tags(message);
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    ENTITY.replace_all(&text, "").into_owned()
}
