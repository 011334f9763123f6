//! HTML export of a chat transcript.
//!
//! Produces the same markup shape as the web widget (`message`,
//! `message-personal`, `loading`, `timestamp`). Plain text is always escaped;
//! markup bubbles keep only a few attribute-free inline tags.

use domain::transcript::{Bubble, MessageContent, Role, Transcript};
use shared::utils::escape_html;

pub const AVATAR_URL: &str =
    "https://media.tenor.com/images/4c347ea7198af12fd0a66790515f958f/tenor.gif";

/// Inline tags allowed through `sanitize_markup`, without attributes.
const ALLOWED_TAGS: &[&str] = &["b", "i", "em", "strong", "br", "code"];

/// Length of an allowed tag at the start of `tail`, e.g. `<b>`, `</em>`, `<br/>`.
fn allowed_tag_len(tail: &str) -> Option<usize> {
    let body = tail.strip_prefix('<')?;
    let end = body.find('>')?;
    let inner = &body[..end];
    let name = inner.strip_prefix('/').unwrap_or(inner);
    let name = name.strip_suffix('/').unwrap_or(name).trim_end();
    ALLOWED_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(name))
        .then_some(end + 2)
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_end_matches('>')
        .trim_start_matches('/')
        .trim_end_matches('/')
        .trim()
        .to_ascii_lowercase()
}

/// Escape everything except allowed inline tags.
pub fn sanitize_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find(['<', '>', '&', '"', '\'']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(len) = allowed_tag_len(tail) {
            out.push_str(&tail[..len]);
            rest = &tail[len..];
        } else {
            out.push_str(&escape_html(&tail[..1]));
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Terminal rendition of markup: `<br>` becomes a newline, other allowed tags vanish.
pub fn markup_to_plain(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match allowed_tag_len(tail) {
            Some(len) => {
                if tag_name(&tail[..len]) == "br" {
                    out.push('\n');
                }
                rest = &tail[len..];
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn content_html(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => escape_html(text),
        MessageContent::Markup(markup) => sanitize_markup(markup),
    }
}

fn avatar() -> String {
    format!(r#"<figure class="avatar"><img src="{}" /></figure>"#, AVATAR_URL)
}

pub fn render_bubble(bubble: &Bubble) -> String {
    let mut html = match bubble.role {
        Role::Personal => format!(
            r#"<div class="message message-personal">{}"#,
            content_html(&bubble.content)
        ),
        Role::Response => format!(
            r#"<div class="message">{}{}"#,
            avatar(),
            content_html(&bubble.content)
        ),
        Role::Loading => format!(r#"<div class="message loading">{}<span></span>"#, avatar()),
    };
    if let Some(label) = &bubble.timestamp {
        html.push_str(&format!(
            r#"<div class="timestamp">{}</div>"#,
            escape_html(label)
        ));
    }
    html.push_str("</div>");
    html
}

pub fn render_transcript(transcript: &Transcript) -> String {
    let mut html = String::from(r#"<div class="messages-content">"#);
    for bubble in transcript.iter() {
        html.push('\n');
        html.push_str(&render_bubble(bubble));
    }
    html.push_str("\n</div>");
    html
}

/// Standalone page wrapping `render_transcript`.
pub fn render_document(title: &str, transcript: &Transcript) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#1e1e1e;color:#ccc;margin:0;padding:20px}}
.messages-content{{display:flex;flex-direction:column;gap:10px;max-width:720px;margin:0 auto}}
.message{{position:relative;max-width:80%;padding:8px 12px 8px 48px;border-radius:12px;background:#252526;align-self:flex-start;white-space:pre-wrap}}
.message-personal{{align-self:flex-end;padding-left:12px;background:#2a2d2e}}
.avatar{{position:absolute;left:6px;top:6px;margin:0}}
.avatar img{{width:30px;height:30px;border-radius:50%}}
.timestamp{{font-size:11px;color:#888;margin-top:4px}}
</style>
</head>
<body>
{body}
</body>
</html>
"##,
        title = escape_html(title),
        body = render_transcript(transcript),
    )
}
