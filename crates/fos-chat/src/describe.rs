//! Spoken descriptions
//!
//! Text that assistive technology reads in place of visual content.

use crate::transport::{Attachment, AttachmentKind};

const EMOJI_LABELS: &[(&str, &str)] = &[
    ("😀", "grinning face"),
    ("😂", "face with tears of joy"),
    ("❤️", "red heart"),
    ("👍", "thumbs up"),
    ("👎", "thumbs down"),
    ("🎉", "party popper"),
    ("🔥", "fire"),
    ("💯", "hundred points symbol"),
];

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human file size: `0 Bytes`, `1.5 KB`, `10 MB`
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Description of an attachment for screen readers
pub fn attachment_description(attachment: &Attachment) -> String {
    let title = attachment.title.as_deref().unwrap_or("Untitled");
    match attachment.kind {
        AttachmentKind::Image => match attachment.alt_text.as_deref() {
            Some(alt) if !alt.is_empty() => alt.to_string(),
            _ => format!("Image: {title}"),
        },
        AttachmentKind::Video => format!("Video: {title}"),
        AttachmentKind::Audio => format!("Audio: {title}"),
        AttachmentKind::File => match attachment.file_size {
            Some(size) if size > 0 => format!("File: {title} ({})", format_file_size(size)),
            _ => format!("File: {title}"),
        },
    }
}

/// Label for a known emoji
pub fn emoji_label(emoji: &str) -> Option<&'static str> {
    EMOJI_LABELS.iter().find(|(e, _)| *e == emoji).map(|(_, label)| *label)
}

/// `text` with each known emoji replaced by its label
pub fn spoken_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(c) = rest.chars().next() {
        for (emoji, label) in EMOJI_LABELS {
            if let Some(after) = rest.strip_prefix(emoji) {
                out.push_str(label);
                rest = after;
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Typing indicator text; `None` when nobody is typing
pub fn typing_text(users: &[String]) -> Option<String> {
    match users {
        [] => None,
        [one] => Some(format!("{one} is typing")),
        many => Some(format!("{} are typing", many.join(", "))),
    }
}
