//! Lenient markup tokenizer for fragments.
//!
//! Mirrors what a browser does with a `<template>`'s `innerHTML` closely
//! enough for rendered components: it never fails, drops doctypes, keeps
//! comments, and reads `style`/`script`/`textarea`/`title` bodies verbatim.
//! Entities are left undecoded.

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End(String),
    Text(String),
    Comment(String),
}

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) fn is_void(name: &str) -> bool {
    VOID.contains(&name)
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT.contains(&name)
}

pub(crate) fn tokenize(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = src;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            let (body, tail) = match after.find("-->") {
                Some(i) => (&after[..i], &after[i + 3..]),
                None => (after, ""),
            };
            tokens.push(Token::Comment(body.to_string()));
            rest = tail;
            continue;
        }

        // doctype, CDATA, processing instructions
        if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = rest.find('>').map_or("", |i| &rest[i + 1..]);
            continue;
        }

        if let Some(after) = rest.strip_prefix("</")
            && after.starts_with(|c: char| c.is_ascii_alphabetic())
        {
            let end = after.find('>').unwrap_or(after.len());
            let name = after[..end]
                .split(|c: char| c.is_ascii_whitespace() || c == '/')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            tokens.push(Token::End(name));
            rest = after.get(end + 1..).unwrap_or_default();
            continue;
        }

        if let Some(after) = rest.strip_prefix('<')
            && after.starts_with(|c: char| c.is_ascii_alphabetic())
        {
            let (token, mut tail) = start_tag(after);
            let raw = match &token {
                Token::Start {
                    name,
                    self_closing: false,
                    ..
                } if is_raw_text(name) => Some(name.clone()),
                _ => None,
            };
            tokens.push(token);

            if let Some(name) = raw {
                let close = format!("</{name}");
                let end = find_ignore_ascii_case(tail, &close).unwrap_or(tail.len());
                push_text(&mut tokens, &tail[..end]);
                tokens.push(Token::End(name));
                tail = &tail[end..];
                tail = tail.find('>').map_or("", |i| &tail[i + 1..]);
            }
            rest = tail;
            continue;
        }

        // Plain text up to the next '<'. A '<' that opened nothing above is
        // kept as text.
        let skip = rest.chars().next().map_or(1, char::len_utf8);
        let next = rest[skip..].find('<').map_or(rest.len(), |i| i + skip);
        push_text(&mut tokens, &rest[..next]);
        rest = &rest[next..];
    }

    tokens
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text(prev)) = tokens.last_mut() {
        prev.push_str(text);
    } else {
        tokens.push(Token::Text(text.to_string()));
    }
}

/// Parses a start tag body (after `<`). Returns the token and what follows `>`.
fn start_tag(src: &str) -> (Token, &str) {
    let bytes = src.as_bytes();
    let len = bytes.len();

    let mut i = 0;
    while i < len && !is_tag_delim(bytes[i]) {
        i += 1;
    }
    let name = src[..i].to_ascii_lowercase();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                i += 1;
                if bytes.get(i) == Some(&b'>') {
                    self_closing = true;
                    i += 1;
                    break;
                }
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < len && !is_tag_delim(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        if i == name_start {
            // lone '='
            i += 1;
            continue;
        }
        let attr = src[name_start..i].to_ascii_lowercase();

        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let start = i + 1;
                    let end = src[start..].find(q as char).map_or(len, |e| start + e);
                    value = src[start..end].to_string();
                    i = (end + 1).min(len);
                }
                _ => {
                    let start = i;
                    while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = src[start..i].to_string();
                }
            }
        }

        if !attrs.iter().any(|(n, _)| *n == attr) {
            attrs.push((attr, value));
        }
    }

    let token = Token::Start {
        name,
        attrs,
        self_closing,
    };
    (token, &src[i.min(len)..])
}

fn is_tag_delim(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'>' || b == b'/'
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let n = needle.len();
    if n > haystack.len() {
        return None;
    }
    (0..=haystack.len() - n).find(|&i| {
        haystack.is_char_boundary(i)
            && haystack.as_bytes()[i..i + n].eq_ignore_ascii_case(needle.as_bytes())
    })
}
