//! CSV header cleanup and line tokenization
//!
//! Voter-file exports arrive with messy headers (BOM prefixes, wrapping
//! quotes, stray whitespace). `normalize_header` cleans them for display and
//! heuristic matching; `parse_line` tokenizes one delimited line with
//! best-effort recovery. It never fails: an unterminated quote simply makes
//! the remainder of the line the final field.

/// UTF-8 byte-order mark as it appears at the start of a decoded string.
const BOM: char = '\u{feff}';

/// Clean a raw column header into a display label suitable for matching.
///
/// Total and idempotent: strips a leading BOM, trims whitespace, removes one
/// layer of wrapping quotes, and collapses internal whitespace runs to a
/// single space. Empty input yields an empty string.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim_start_matches(BOM).trim();
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    };

    let mut out = String::with_capacity(unquoted.len());
    let mut last_was_space = false;
    for c in unquoted.chars() {
        if c.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Tokenize one line of delimited text into unescaped field values.
///
/// Quoted fields may contain the delimiter; a doubled quote inside a quoted
/// field is an escaped literal quote. A blank line yields no fields.
pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    // An unterminated quote leaves in_quotes set; the accumulated remainder
    // is still emitted as the final field.
    fields.push(current);
    fields
}

/// `parse_line` with the comma delimiter used by voter-file exports.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    parse_line(line, ',')
}
