//! JSON string scanning and unescaping primitives.
//!
//! These operate on an accumulated buffer that grows as argument deltas
//! arrive, so "not found" always means "not enough data yet" rather than a
//! parse error. All delimiter checks are byte-based: the interesting bytes
//! (`"`, `\`, hex digits) are ASCII and cannot occur inside a UTF-8
//! continuation sequence.

/// Find the closing quote of a JSON string starting at `start` (the first
/// byte after the opening quote).
///
/// Returns the byte offset of the closing `"`, or `None` when the buffer
/// ends before the string closes - including when it ends in the middle of
/// a two-character escape or a six-character `\uXXXX` escape. Callers must
/// not advance their cursor on `None`; the same scan is re-run once more
/// data has been appended.
#[must_use]
pub fn find_string_end(raw: &str, start: usize) -> Option<usize> {
    let bytes = raw.as_bytes();
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => return Some(pos),
            b'\\' => {
                if pos + 1 >= bytes.len() {
                    // Lone backslash at the end of the buffer: escape
                    // incomplete, wait for more data.
                    return None;
                }
                if bytes[pos + 1] == b'u' {
                    // \uXXXX needs six bytes in total.
                    if pos + 5 >= bytes.len() {
                        return None;
                    }
                    pos += 6;
                } else {
                    pos += 2;
                }
            }
            _ => pos += 1,
        }
    }
    None
}

fn hex4(bytes: &[u8], start: usize) -> Option<u32> {
    if start + 4 > bytes.len() {
        return None;
    }
    let mut value = 0u32;
    for &b in &bytes[start..start + 4] {
        value = value * 16 + (b as char).to_digit(16)?;
    }
    Some(value)
}

/// Unescape a JSON string body (the text between the quotes).
///
/// Handles the standard short escapes, `\uXXXX` code units (surrogate pairs
/// are combined), and is deliberately lenient: malformed `\uXXXX` hex is
/// passed through literally, an unknown escape letter is passed through
/// without its backslash, and a trailing lone backslash is kept. Never
/// fails.
#[must_use]
pub fn unescape_json(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'\\' {
            // Copy the plain run up to the next backslash verbatim.
            let run_len = raw[pos..].find('\\').unwrap_or(raw.len() - pos);
            out.push_str(&raw[pos..pos + run_len]);
            pos += run_len;
            continue;
        }
        if pos + 1 >= bytes.len() {
            out.push('\\');
            break;
        }

        let next = bytes[pos + 1];
        if next == b'u' {
            match hex4(bytes, pos + 2) {
                Some(unit) => {
                    pos += 6;
                    out.push(decode_code_unit(unit, bytes, &mut pos));
                    continue;
                }
                None => {
                    // Malformed hex: keep the literal \u and let the rest
                    // of the text flow through unchanged.
                    out.push('\\');
                    out.push('u');
                    pos += 2;
                    continue;
                }
            }
        }

        out.push(match next {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{0008}',
            b'f' => '\u{000C}',
            other => other as char,
        });
        pos += 2;
    }

    out
}

/// Turn one decoded `\uXXXX` unit into a char, consuming a following low
/// surrogate when `unit` is a high surrogate. `pos` already points past the
/// first escape; it is advanced past the second one when a pair combines.
fn decode_code_unit(unit: u32, bytes: &[u8], pos: &mut usize) -> char {
    if (0xD800..=0xDBFF).contains(&unit) {
        let p = *pos;
        if p + 1 < bytes.len() && bytes[p] == b'\\' && bytes[p + 1] == b'u' {
            if let Some(low) = hex4(bytes, p + 2) {
                if (0xDC00..=0xDFFF).contains(&low) {
                    *pos = p + 6;
                    let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER);
                }
            }
        }
        return char::REPLACEMENT_CHARACTER;
    }
    char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)
}
