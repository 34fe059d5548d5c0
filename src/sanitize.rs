// Escaping and the allow-list pass for rendered comments

// Tags, attributes and href schemes a rendered document may contain.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub tags: &'static [&'static str],
    pub attributes: &'static [&'static str],
    pub url_schemes: &'static [&'static str],
    pub allow_relative: bool,
}

// The only markup comments are allowed to carry.
pub const ANCHORS_ONLY: Policy = Policy {
    tags: &["a"],
    attributes: &["href", "target", "rel"],
    url_schemes: &["http", "https"],
    allow_relative: true,
};

impl Policy {
    fn allows_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    fn allows_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn allows_href(&self, href: &str) -> bool {
        let href = href.trim();
        if self.allow_relative && href.starts_with('/') && !href.starts_with("//") {
            return true;
        }
        self.url_schemes.iter().any(|scheme| {
            href.len() > scheme.len() + 3
                && href
                    .get(..scheme.len())
                    .is_some_and(|s| s.eq_ignore_ascii_case(scheme))
                && href[scheme.len()..].starts_with("://")
        })
    }
}

// Escape text for use in a text node or a double-quoted attribute.
// Besides the markup characters this also defangs `javascript:` and inline
// event handler assignments (`onerror=`), so those substrings never survive
// even as inert text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for (i, c) in input.char_indices() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            ':' if follows_script_scheme(input, i) => out.push_str("&#58;"),
            '=' if follows_event_handler(input, i) => out.push_str("&#61;"),
            _ => out.push(c),
        }
    }
    out
}

fn follows_script_scheme(input: &str, at: usize) -> bool {
    ["javascript", "vbscript"].iter().any(|scheme| {
        at >= scheme.len()
            && input
                .get(at - scheme.len()..at)
                .is_some_and(|w| w.eq_ignore_ascii_case(scheme))
    })
}

fn follows_event_handler(input: &str, at: usize) -> bool {
    let head = &input[..at];
    let word_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(p, _)| p);
    match word_start {
        // "on" plus at least one more letter anywhere in the run, so
        // "xonerror=" is caught as well as "onerror="
        Some(p) => {
            let word = head[p..].to_ascii_lowercase();
            word.len() > 2 && word[..word.len() - 1].contains("on")
        }
        None => false,
    }
}

// Rebuild `html` keeping only what `policy` allows.
// Text between tags is copied through untouched; it is expected to be
// escaped already. Unknown tags vanish, unknown attributes are dropped, an
// href with a disallowed scheme is dropped, and anchors left open are closed.
pub fn sanitize(html: &str, policy: &Policy) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut open = 0usize;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) => {
                if let Some(tag) = rebuild_tag(&tail[1..end], policy, &mut open) {
                    out.push_str(&tag);
                }
                rest = &tail[end + 1..];
            }
            None => {
                // unterminated tag; keep it as text
                out.push_str(&tail.replace('<', "&lt;"));
                rest = "";
            }
        }
    }
    out.push_str(rest);

    for _ in 0..open {
        out.push_str("</a>");
    }
    out
}

fn rebuild_tag(raw: &str, policy: &Policy, open: &mut usize) -> Option<String> {
    let raw = raw.trim();
    if let Some(closing) = raw.strip_prefix('/') {
        let name = closing.trim();
        if policy.allows_tag(name) && *open > 0 {
            *open -= 1;
            return Some(format!("</{}>", name.to_ascii_lowercase()));
        }
        return None;
    }

    let name_end = raw
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(raw.len());
    let name = &raw[..name_end];
    // nested anchors are not valid markup
    if !policy.allows_tag(name) || *open > 0 {
        return None;
    }

    let mut tag = format!("<{}", name.to_ascii_lowercase());
    for (attr, value) in parse_attributes(&raw[name_end..]) {
        if !policy.allows_attribute(attr) {
            continue;
        }
        let Some(value) = value else { continue };
        if attr.eq_ignore_ascii_case("href") && !policy.allows_href(value) {
            continue;
        }
        tag.push(' ');
        tag.push_str(&attr.to_ascii_lowercase());
        tag.push_str("=\"");
        tag.push_str(&value.replace('"', "&quot;").replace('<', "&lt;"));
        tag.push('"');
    }
    tag.push('>');
    *open += 1;
    Some(tag)
}

// Split the attribute section of a tag into `(name, value)` pairs.
fn parse_attributes(mut s: &str) -> Vec<(&str, Option<&str>)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if s.is_empty() {
            break;
        }
        let name_end = s
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(s.len());
        let name = &s[..name_end];
        s = s[name_end..].trim_start();

        let Some(after_eq) = s.strip_prefix('=') else {
            attrs.push((name, None));
            continue;
        };
        let after_eq = after_eq.trim_start();
        let (value, remainder) = match after_eq.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &after_eq[1..];
                match body.find(q) {
                    Some(close) => (&body[..close], &body[close + 1..]),
                    None => (body, ""),
                }
            }
            _ => {
                let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };
        attrs.push((name, Some(value)));
        s = remainder;
    }
    attrs
}
