//! Search primitives over the char buffer.
//!
//! Plain forward/backward char and substring finds, plus the escape- and
//! quotation-aware [`index_of_any_char`] that underlies
//! `lento_char_outside_quotes`, `scan_to_any_char` and quoted-literal
//! scanning. All ranges are half-open char-index ranges into the buffer;
//! none of these functions mutate state or allocate.

/// Does `pat` start at `buf[at]` (entirely below `to`)?
pub(crate) fn starts_with_at(buf: &[char], at: usize, to: usize, pat: &str) -> bool {
    let mut i = at;
    for pc in pat.chars() {
        if i >= to || buf[i] != pc {
            return false;
        }
        i += 1;
    }
    true
}

/// First occurrence of `c` in `buf[from..to]`.
pub(crate) fn find_char(buf: &[char], from: usize, to: usize, c: char) -> Option<usize> {
    buf[from..to].iter().position(|&b| b == c).map(|i| from + i)
}

/// Last occurrence of `c` in `buf[from..to]`.
pub(crate) fn rfind_char(buf: &[char], from: usize, to: usize, c: char) -> Option<usize> {
    buf[from..to]
        .iter()
        .rposition(|&b| b == c)
        .map(|i| from + i)
}

/// First occurrence of `pat` starting in `buf[from..to]`; the whole match
/// must fit below `to`. An empty pattern matches at `from`.
pub(crate) fn find_str(buf: &[char], from: usize, to: usize, pat: &str) -> Option<usize> {
    let n = pat.chars().count();
    if n > to.saturating_sub(from) {
        return None;
    }
    (from..=to - n).find(|&i| starts_with_at(buf, i, to, pat))
}

/// Last occurrence of `pat` fully inside `buf[from..to]`.
pub(crate) fn rfind_str(buf: &[char], from: usize, to: usize, pat: &str) -> Option<usize> {
    let n = pat.chars().count();
    if n > to.saturating_sub(from) {
        return None;
    }
    (from..=to - n).rev().find(|&i| starts_with_at(buf, i, to, pat))
}

/// First offset in `buf[from..to]` holding a char of `set`, ignoring
/// escaped chars and quoted groups.
///
/// - A char preceded by `escape` never matches; the escape consumes exactly
///   the next char.
/// - On `quote_open`, the scan jumps (escape-aware) past the matching
///   `quote_close` before resuming; set members inside the quotation do not
///   match. An unterminated quotation extends to `to`.
/// - `quote_open == quote_close` is allowed (plain string quotes).
///
/// Callers that want to distinguish "terminator found" from "ran off the
/// text" include their own sentinel in `set` and compare the returned
/// offset.
pub(crate) fn index_of_any_char(
    buf: &[char],
    from: usize,
    to: usize,
    set: &str,
    escape: Option<char>,
    quotes: Option<(char, char)>,
) -> Option<usize> {
    let mut i = from;
    while i < to {
        let c = buf[i];
        if escape == Some(c) {
            i += 2;
            continue;
        }
        if let Some((open, close)) = quotes {
            if c == open {
                i = skip_quoted(buf, i + 1, to, close, escape);
                continue;
            }
        }
        if set.contains(c) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Index just past the closing quote, or `to` when unterminated.
fn skip_quoted(buf: &[char], from: usize, to: usize, close: char, escape: Option<char>) -> usize {
    let mut i = from;
    while i < to {
        let c = buf[i];
        if escape == Some(c) {
            i += 2;
        } else if c == close {
            return i + 1;
        } else {
            i += 1;
        }
    }
    to
}
