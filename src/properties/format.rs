//! Reading and writing the flat `key=value` properties format.
//!
//! The dialect is the common properties-file convention used by JVM tooling:
//!
//! - `#` and `!` start comment lines; blank lines are ignored
//! - the key ends at the first unescaped `=`, `:` or whitespace
//! - a line ending in an odd number of backslashes continues on the next line
//! - `\t`, `\n`, `\r`, `\f`, `\uXXXX` are escapes; any other escaped character is literal
//!
//! [`write_properties`] never emits a timestamp, so identical content always produces
//! identical bytes.

use std::io::{self, Write};

/// Decode raw file bytes. UTF-8 is tried first, ISO-8859-1 is the fallback.
#[must_use]
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

/// Parse properties text into `(key, value)` pairs in file order.
///
/// A key appearing more than once keeps every occurrence; callers collecting into a map get
/// last-one-wins, like the JVM loader.
///
/// # Errors
///
/// Returns a description of the problem for malformed `\uXXXX` escapes.
pub fn parse(text: &str) -> Result<Vec<(String, String)>, String> {
    let mut entries = Vec::new();
    let mut lines = text.lines().flat_map(|line| line.split('\r'));

    while let Some(line) = lines.next() {
        let trimmed = trim_start_ws(line);
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::from(trimmed);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(trim_start_ws(next)),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_key_value(&logical);
        entries.push((unescape(raw_key)?, unescape(raw_value)?));
    }

    Ok(entries)
}

fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn trim_start_ws(s: &str) -> &str {
    s.trim_start_matches(is_ws)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut separator = None;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                separator = Some(c);
                break;
            }
            c if is_ws(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];
    match separator {
        Some(sep) => rest = &rest[sep.len_utf8()..],
        None => {
            rest = trim_start_ws(rest);
            if let Some(stripped) = rest.strip_prefix(['=', ':']) {
                rest = stripped;
            }
        }
    }

    (key, trim_start_ws(rest))
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut pending_high: Option<u16> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            break;
        };

        if escaped == 'u' {
            let hex: String = chars.by_ref().take(4).collect();
            if hex.len() != 4 {
                return Err("Malformed \\uxxxx encoding".to_string());
            }
            let unit = u16::from_str_radix(&hex, 16)
                .map_err(|_| format!("Malformed \\uxxxx encoding: \\u{hex}"))?;
            push_utf16_unit(&mut out, &mut pending_high, unit);
            continue;
        }

        flush_surrogate(&mut out, &mut pending_high);
        out.push(match escaped {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\x0C',
            other => other,
        });
    }

    flush_surrogate(&mut out, &mut pending_high);
    Ok(out)
}

fn push_utf16_unit(out: &mut String, pending_high: &mut Option<u16>, unit: u16) {
    match (*pending_high, unit) {
        (Some(high), 0xDC00..=0xDFFF) => {
            *pending_high = None;
            let decoded = char::decode_utf16([high, unit])
                .next()
                .and_then(Result::ok)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            out.push(decoded);
        }
        (_, 0xD800..=0xDBFF) => {
            flush_surrogate(out, pending_high);
            *pending_high = Some(unit);
        }
        _ => {
            flush_surrogate(out, pending_high);
            out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u16>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

/// Escape a key (`escape_space = true`) or a value (`false`, only a leading space is escaped).
#[must_use]
pub fn escape(text: &str, escape_space: bool) -> String {
    let mut out = String::with_capacity(text.len() + 8);

    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' if i == 0 || escape_space => out.push_str("\\ "),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0C' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if c < ' ' || c > '~' => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
            c => out.push(c),
        }
    }

    out
}

/// Write a header comment followed by one escaped `key=value` line per entry.
///
/// # Errors
///
/// Propagates any error from the underlying writer.
pub fn write_properties<'a, W, I>(
    writer: &mut W,
    header: Option<&str>,
    entries: I,
) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if let Some(header) = header {
        for line in header.lines() {
            writeln!(writer, "#{line}")?;
        }
    }

    for (key, value) in entries {
        writeln!(writer, "{}={}", escape(key, true), escape(value, false))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> Vec<(String, String)> {
        parse(text).unwrap()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_separators_and_comments() {
        let text = "# comment\n! also comment\n\na=1\nb : 2\nc 3\n  d=\n";
        assert_eq!(
            parsed(text),
            vec![pair("a", "1"), pair("b", "2"), pair("c", "3"), pair("d", "")]
        );
    }

    #[test]
    fn test_continuation_lines() {
        let text = "path=one,\\\n    two,\\\n    three\nnext=x\n";
        assert_eq!(parsed(text), vec![pair("path", "one,two,three"), pair("next", "x")]);
    }

    #[test]
    fn test_escaped_backslash_is_not_continuation() {
        let text = "dir=C:\\\\\nnext=x\n";
        assert_eq!(parsed(text), vec![pair("dir", "C:\\"), pair("next", "x")]);
    }

    #[test]
    fn test_escapes_in_keys_and_values() {
        let text = "my\\ key=tab\\there\nurl\\:x=a\\=b\nuni=caf\\u00e9\n";
        assert_eq!(
            parsed(text),
            vec![pair("my key", "tab\there"), pair("url:x", "a=b"), pair("uni", "café")]
        );
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(parsed("e=\\uD83D\\uDE00\n"), vec![pair("e", "😀")]);
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let err = parse("bad=\\u12\n").unwrap_err();
        assert!(err.contains("Malformed"));
        assert!(parse("bad=\\uZZZZ\n").is_err());
    }

    #[test]
    fn test_windows_line_endings() {
        assert_eq!(parsed("a=1\r\nb=2\r\n"), vec![pair("a", "1"), pair("b", "2")]);
    }

    #[test]
    fn test_latin1_fallback() {
        let bytes = b"name=caf\xe9\n".to_vec();
        assert_eq!(decode(bytes), "name=café\n");
    }

    #[test]
    fn test_escape_rules() {
        assert_eq!(escape("a b", true), "a\\ b");
        assert_eq!(escape(" lead and inner", false), "\\ lead and inner");
        assert_eq!(escape("C:\\repo", false), "C\\:\\\\repo");
        assert_eq!(escape("x=y#z!", false), "x\\=y\\#z\\!");
        assert_eq!(escape("café", false), "caf\\u00E9");
        assert_eq!(escape("😀", false), "\\uD83D\\uDE00");
    }

    #[test]
    fn test_write_then_parse_preserves_awkward_values() {
        let entries = [("key with space", " value: with=stuff\nand newline"), ("π", "ü")];
        let mut buffer = Vec::new();
        write_properties(&mut buffer, Some("Generated by test"), entries.iter().copied()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("#Generated by test\n"));

        let back = parsed(&text);
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], pair(entries[0].0, entries[0].1));
        assert_eq!(back[1], pair(entries[1].0, entries[1].1));
    }
}
