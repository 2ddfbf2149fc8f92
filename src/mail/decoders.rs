use chrono::{DateTime, SecondsFormat};

/// Decoded value of an envelope header, resolving RFC 2047 encoded-words.
/// Falls back to the raw bytes (lossy UTF-8) when the header does not parse.
pub fn decode_header(name: &str, raw: &[u8]) -> String {
    let parts: [&[u8]; 4] = [name.as_bytes(), b": ", raw, b"\r\n"];
    let line = parts.concat();
    mailparse::parse_header(&line)
        .map(|(h, _)| h.get_value())
        .unwrap_or_else(|_| String::from_utf8_lossy(raw).into_owned())
}

pub fn decode_subject(raw: &[u8]) -> String {
    decode_header("Subject", raw)
}

/// `mailbox@host`, or `None` when the envelope address has no mailbox
/// (group syntax markers).
pub fn format_address(mailbox: Option<&[u8]>, host: Option<&[u8]>) -> Option<String> {
    let mailbox = String::from_utf8_lossy(mailbox?).trim().to_string();
    if mailbox.is_empty() {
        return None;
    }
    match host.map(|h| String::from_utf8_lossy(h).trim().to_string()) {
        Some(h) if !h.is_empty() => Some(format!("{mailbox}@{h}")),
        _ => Some(mailbox),
    }
}

/// RFC 2822 envelope date to ISO-8601 in UTC, so cached dates sort
/// lexically. Unparseable dates become an empty string.
pub fn normalize_date(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    mailparse::dateparse(s.trim())
        .ok()
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
