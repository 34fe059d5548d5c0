// Comment text -> HTML with links and @mentions. URLs win over mentions,
// so an @ inside a URL is never linked twice.

use crate::sanitize::{ANCHORS_ONLY, escape_html, sanitize};

const TRAILING_PUNCTUATION: &[u8] = b".,;:!?)";
const EXTERNAL_REL: &str = "nofollow noopener noreferrer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention<'a> {
    pub user: &'a str,
    pub domain: Option<&'a str>,
}

impl Mention<'_> {
    // Profile link: the remote instance for `@user@domain`, the local
    // profile page otherwise.
    pub fn href(&self) -> String {
        match self.domain {
            Some(domain) => format!("https://{}/@{}", domain, self.user),
            None => format!("/users/{}", self.user),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.domain.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    // `trailing` is sentence punctuation cut off the end of the URL.
    Url { href: &'a str, trailing: &'a str },
    Mention(Mention<'a>),
}

// Render `text` as safe HTML.
pub fn linkify(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut html = String::with_capacity(text.len() * 2);
    for span in tokenize(text) {
        render_span(&mut html, &span);
    }
    sanitize(&html, &ANCHORS_ONLY)
}

fn render_span(out: &mut String, span: &Span<'_>) {
    match span {
        Span::Text(text) => out.push_str(&escape_html(text)),
        Span::Url { href, trailing } => {
            let href = escape_html(href);
            out.push_str(&format!(
                "<a href=\"{href}\" target=\"_blank\" rel=\"{EXTERNAL_REL}\">{href}</a>"
            ));
            out.push_str(&escape_html(trailing));
        }
        Span::Mention(mention) => {
            let href = escape_html(&mention.href());
            let label = match mention.domain {
                Some(domain) => escape_html(&format!("@{}@{}", mention.user, domain)),
                None => escape_html(&format!("@{}", mention.user)),
            };
            if mention.is_remote() {
                out.push_str(&format!(
                    "<a href=\"{href}\" target=\"_blank\" rel=\"{EXTERNAL_REL}\">{label}</a>"
                ));
            } else {
                out.push_str(&format!("<a href=\"{href}\">{label}</a>"));
            }
        }
    }
}

// Split `text` into plain text, URL and mention spans.
// Concatenating the source text of every span reproduces the input.
pub fn tokenize(text: &str) -> Vec<Span<'_>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let token = match bytes[i] {
            b'h' => scan_url(text, i).map(|(href_end, end)| {
                (
                    Span::Url {
                        href: &text[i..href_end],
                        trailing: &text[href_end..end],
                    },
                    end,
                )
            }),
            b'@' if starts_mention(text, i) => {
                scan_mention(text, i).map(|(mention, end)| (Span::Mention(mention), end))
            }
            _ => None,
        };

        match token {
            Some((span, end)) => {
                if text_start < i {
                    spans.push(Span::Text(&text[text_start..i]));
                }
                spans.push(span);
                i = end;
                text_start = end;
            }
            // triggers are ASCII, so stepping bytewise never splits a match
            None => i += 1,
        }
    }

    if text_start < bytes.len() {
        spans.push(Span::Text(&text[text_start..]));
    }
    spans
}

// Returns `(href_end, token_end)` for a URL starting at `start`.
fn scan_url(text: &str, start: usize) -> Option<(usize, usize)> {
    let rest = &text.as_bytes()[start..];
    let body_start = if rest.starts_with(b"https://") {
        start + 8
    } else if rest.starts_with(b"http://") {
        start + 7
    } else {
        return None;
    };

    let body_len = text[body_start..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace() || matches!(c, '<' | '>' | '"'))
        .map_or(text.len() - body_start, |(idx, _)| idx);
    let end = body_start + body_len;

    let bytes = text.as_bytes();
    let mut href_end = end;
    while href_end > body_start && TRAILING_PUNCTUATION.contains(&bytes[href_end - 1]) {
        href_end -= 1;
    }
    if href_end == body_start {
        return None;
    }
    Some((href_end, end))
}

fn is_user_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')
}

fn is_domain_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-')
}

// An `@` opens a mention only at a word boundary. Email addresses and
// escaped entities (`&@`) are left alone.
fn starts_mention(text: &str, at: usize) -> bool {
    match text[..at].chars().next_back() {
        None => true,
        Some(prev) => !(prev.is_alphanumeric() || matches!(prev, '_' | '.' | '-' | '@' | '&')),
    }
}

fn scan_mention(text: &str, at: usize) -> Option<(Mention<'_>, usize)> {
    let bytes = text.as_bytes();
    let user_start = at + 1;
    let mut user_end = user_start;
    while user_end < bytes.len() && is_user_byte(bytes[user_end]) {
        user_end += 1;
    }

    if user_end < bytes.len() && bytes[user_end] == b'@' {
        let domain_start = user_end + 1;
        let mut domain_end = domain_start;
        while domain_end < bytes.len() && is_domain_byte(bytes[domain_end]) {
            domain_end += 1;
        }
        let domain = text[domain_start..domain_end].trim_end_matches(['.', '-']);
        if user_end > user_start && !domain.is_empty() {
            let mention = Mention {
                user: &text[user_start..user_end],
                domain: Some(domain),
            };
            return Some((mention, domain_start + domain.len()));
        }
    }

    // "@alice." ends a sentence, the dot is not part of the name
    let user = text[user_start..user_end].trim_end_matches('.');
    if user.is_empty() {
        return None;
    }
    Some((Mention { user, domain: None }, user_start + user.len()))
}
