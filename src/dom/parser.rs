use crate::dom::document::{Document, NodeId};
use crate::error::PageError;

/// Tolerant tag-soup parser.
///
/// Unknown or stray end tags are ignored, unclosed elements are closed at end
/// of input, and the contents of `script`/`style` are kept as raw text.
/// Markup cut off mid-construct (a start tag, comment or quoted value that
/// never closes) is dropped and everything parsed before it is kept.
pub fn parse_html(html: &str) -> Result<Document, PageError> {
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            // An unclosed comment swallows the rest of the input.
            i = find_subslice(bytes, i + 4, b"-->").map_or(bytes.len(), |end| end + 3);
            continue;
        }

        // <!DOCTYPE ...> and other declarations
        if starts_with_at(bytes, i, b"<!") || starts_with_at(bytes, i, b"<?") {
            i = find_subslice(bytes, i, b">").map_or(bytes.len(), |end| end + 1);
            continue;
        }

        if bytes[i] == b'<' && starts_with_at(bytes, i, b"</") {
            let Some((tag, next)) = parse_end_tag(html, i) else {
                tracing::debug!(offset = i, "Dropped truncated end tag");
                break;
            };
            i = next;
            close_element(&doc, &mut stack, &tag);
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            let Some(StartTag {
                tag,
                attrs,
                self_closing,
                next,
            }) = parse_start_tag(html, i)
            else {
                tracing::debug!(offset = i, "Dropped truncated start tag");
                break;
            };
            i = next;

            let parent = current(&stack)?;
            let node = doc.push_parsed_element(parent, &tag, attrs);

            if is_raw_text_tag(&tag) {
                let close = find_end_tag(bytes, i, tag.as_bytes()).unwrap_or(bytes.len());
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        doc.push_parsed_text(node, body.to_string());
                    }
                }
                i = close;
                if i < bytes.len() {
                    i = parse_end_tag(html, i).map_or(bytes.len(), |(_, after_end)| after_end);
                }
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        // Text run; a lone '<' that does not open a tag is literal text.
        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }
        if let Some(text) = html.get(text_start..i) {
            let parent = current(&stack)?;
            doc.push_parsed_text(parent, decode_character_references(text));
        }
    }

    doc.init_textarea_values();
    Ok(doc)
}

fn current(stack: &[NodeId]) -> Result<NodeId, PageError> {
    stack
        .last()
        .copied()
        .ok_or_else(|| PageError::HtmlParse("missing parent element".into()))
}

fn close_element(doc: &Document, stack: &mut Vec<NodeId>, tag: &str) {
    let Some(pos) = stack
        .iter()
        .rposition(|n| doc.tag(*n).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    else {
        return;
    };
    // Never pop the document root.
    stack.truncate(pos.max(1));
}

struct StartTag {
    tag: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    next: usize,
}

/// `None` when the input ends before the tag closes.
fn parse_start_tag(html: &str, at: usize) -> Option<StartTag> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html.get(tag_start..i)?.to_ascii_lowercase();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return None;
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' {
            i += 1;
            if bytes.get(i) == Some(&b'>') {
                self_closing = true;
                i += 1;
                break;
            }
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        let name = html.get(name_start..i)?.to_ascii_lowercase();
        if name.is_empty() {
            // Stray `=` or quote where a name belongs.
            i += 1;
            continue;
        }

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, &mut i)?
        } else {
            String::new()
        };

        // First occurrence wins, as in browsers.
        if !attrs.iter().any(|(k, _)| *k == name) {
            attrs.push((name, value));
        }
    }

    Some(StartTag {
        tag,
        attrs,
        self_closing,
        next: i,
    })
}

/// `None` when the input ends before the closing `>`.
fn parse_end_tag(html: &str, at: usize) -> Option<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html.get(tag_start..i)?.to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    Some((tag, i + 1))
}

fn parse_attr_value(html: &str, i: &mut usize) -> Option<String> {
    let bytes = html.as_bytes();
    if *i >= bytes.len() {
        return None;
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return None;
        }
        let value = html.get(start..*i)?;
        *i += 1;
        return Some(decode_character_references(value));
    }

    let start = *i;
    while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }
    html.get(start..*i).map(decode_character_references)
}

/// Decode the handful of character references real form markup uses.
pub fn decode_character_references(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            decode_entity(entity).map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'')
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.get(at..at + needle.len()) == Some(needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn find_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while let Some(pos) = find_subslice(bytes, i, b"</") {
        let name = bytes.get(pos + 2..pos + 2 + tag.len())?;
        if name.eq_ignore_ascii_case(tag) {
            return Some(pos);
        }
        i = pos + 2;
    }
    None
}
