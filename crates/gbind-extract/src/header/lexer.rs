//! Line-level lexical helpers for header scanning.

/// Remove `//` and `/* */` comments from a line.
///
/// `in_block` carries an unterminated block comment across lines.
pub fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    loop {
        if *in_block {
            match rest.find("*/") {
                Some(end) => {
                    *in_block = false;
                    rest = &rest[end + 2..];
                }
                None => return out,
            }
        }
        let line_comment = rest.find("//");
        let block_comment = rest.find("/*");
        match (line_comment, block_comment) {
            (Some(l), Some(b)) if l < b => {
                out.push_str(&rest[..l]);
                return out;
            }
            (Some(l), None) => {
                out.push_str(&rest[..l]);
                return out;
            }
            (_, Some(b)) => {
                out.push_str(&rest[..b]);
                out.push(' ');
                *in_block = true;
                rest = &rest[b + 2..];
            }
            (None, None) => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Split on `sep` outside `<>`, `()` and `{}` nesting.
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '{' => depth += 1,
            '>' | ')' | '}' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let tail = s[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Index of the bracket closing the one at `open`.
pub fn matching_close(s: &str, open: usize) -> Option<usize> {
    let open_ch = s[open..].chars().next()?;
    let close_ch = match open_ch {
        '(' => ')',
        '<' => '>',
        '{' => '}',
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        if c == open_ch {
            depth += 1;
        } else if c == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(open + i);
            }
        }
    }
    None
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a leading (possibly `::`-qualified) identifier off `s`.
pub fn leading_ident(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        if is_ident_char(bytes[end] as char) {
            end += 1;
        } else if bytes[end] == b':' && bytes.get(end + 1) == Some(&b':') {
            end += 2;
        } else {
            break;
        }
    }
    if end == 0 {
        None
    } else {
        Some((&s[..end], &s[end..]))
    }
}

/// Split a trailing identifier off `s`: `"const T & name"` → `("const T &", "name")`.
pub fn trailing_ident(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_end();
    let start = s
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    if start == s.len() {
        None
    } else {
        Some((s[..start].trim_end(), &s[start..]))
    }
}

/// Whether a token looks like an export/visibility macro (`TORCH_API`).
pub fn is_macro_token(tok: &str) -> bool {
    tok.len() > 1
        && tok.contains('_')
        && tok
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Net `{`/`}` events of a line, in order: `true` opens, `false` closes.
pub fn brace_events(line: &str) -> Vec<bool> {
    let mut events = Vec::new();
    let mut in_string = false;
    let mut prev = '\0';
    for c in line.chars() {
        match c {
            '"' if prev != '\\' => in_string = !in_string,
            '{' if !in_string => events.push(true),
            '}' if !in_string => events.push(false),
            _ => {}
        }
        prev = c;
    }
    events
}

/// Split a `template <...>` prefix off a line, returning parameter names
/// and the remainder.
pub fn split_template_prefix(line: &str) -> Option<(Vec<String>, &str)> {
    let rest = line.strip_prefix("template")?.trim_start();
    if !rest.starts_with('<') {
        return None;
    }
    let close = matching_close(rest, 0)?;
    let params = split_top_level(&rest[1..close], ',')
        .into_iter()
        .filter_map(|p| {
            let p = p.split('=').next().unwrap_or(p);
            trailing_ident(p).map(|(_, name)| name.to_string())
        })
        .collect();
    Some((params, rest[close + 1..].trim_start()))
}
