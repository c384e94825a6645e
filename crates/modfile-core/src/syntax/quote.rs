//! Quoting rules for directive arguments

/// Decode a quoted token
///
/// Double-quoted strings understand the usual backslash escapes; backquoted
/// strings are raw. Returns `None` for malformed input.
pub fn unquote(token: &str) -> Option<String> {
    if let Some(raw) = token
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
    {
        return (!raw.contains('`')).then(|| raw.to_string());
    }

    let body = token.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return None,
            '\\' => {
                let escaped = match chars.next()? {
                    'a' => '\x07',
                    'b' => '\x08',
                    'f' => '\x0c',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'v' => '\x0b',
                    '0' => '\0',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    'x' => hex_char(&mut chars, 2)?,
                    'u' => hex_char(&mut chars, 4)?,
                    'U' => hex_char(&mut chars, 8)?,
                    _ => return None,
                };
                out.push(escaped);
            }
            c => out.push(c),
        }
    }
    Some(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return None;
    }
    char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
}

/// Report whether an argument must be quoted to survive re-parsing
pub fn must_quote(s: &str) -> bool {
    let structural = s.chars().any(|c| match c {
        ' ' | '"' | '\'' | '`' => true,
        '(' | ')' | '[' | ']' | '{' | '}' | ',' => s.len() > 1,
        c => c.is_control() || c.is_whitespace(),
    });
    structural || s.is_empty() || s.contains("//") || s.contains("/*")
}

/// Quote `s` only when [`must_quote`] says so
pub fn auto_quote(s: &str) -> String {
    if must_quote(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Double-quote `s` with escapes [`unquote`] reads back
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if c.is_control() => match u16::try_from(c as u32) {
                Ok(unit) => out.push_str(&format!("\\u{unit:04x}")),
                Err(_) => out.push_str(&format!("\\U{:08x}", c as u32)),
            },
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Report whether a replacement target names a local directory
///
/// Directory paths are rooted (`/`, `\`, a drive letter) or relative to the
/// descriptor (`.`, `..` and their `./`, `.\` forms).
pub fn is_directory_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    path == "."
        || path == ".."
        || ["./", ".\\", "../", "..\\", "/", "\\"]
            .iter()
            .any(|prefix| path.starts_with(prefix))
        || drive
}
