use mailparse::{DispositionType, ParsedMail};

use crate::error::{MailError, Result};

/// Picks the display body of a raw RFC 822 message.
///
/// Leaf parts are walked in order. The first `text/plain` part wins outright;
/// if none exists, every `text/html` part is concatenated instead. Line
/// endings are normalized to LF and surrounding whitespace trimmed.
pub fn extract_body(raw: &[u8]) -> Result<String> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| MailError::MalformedData(e.to_string()))?;

    let mut leaves = Vec::new();
    collect_leaves(&parsed, &mut leaves);

    let mut html = String::new();
    for part in leaves {
        if matches!(
            part.get_content_disposition().disposition,
            DispositionType::Attachment
        ) {
            continue;
        }
        match part.ctype.mimetype.to_ascii_lowercase().as_str() {
            "text/plain" => match part.get_body() {
                Ok(text) => return Ok(clean(&text)),
                Err(e) => log::warn!("skipping undecodable text/plain part: {e}"),
            },
            "text/html" => match part.get_body() {
                Ok(text) => html.push_str(&text),
                Err(e) => log::warn!("skipping undecodable text/html part: {e}"),
            },
            _ => {}
        }
    }
    Ok(clean(&html))
}

fn collect_leaves<'a, 'm>(p: &'a ParsedMail<'m>, out: &mut Vec<&'a ParsedMail<'m>>) {
    if p.subparts.is_empty() {
        out.push(p);
        return;
    }
    for sp in &p.subparts {
        collect_leaves(sp, out);
    }
}

fn clean(s: &str) -> String {
    s.replace("\r\n", "\n").trim().to_string()
}
