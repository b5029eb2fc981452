//! Streaming buffer manager: refill, charset sniffing and compaction.
//!
//! In streaming mode the scanner's content buffer holds a fixed-capacity
//! excerpt of the source. Refilling appends decoded chars at the tail;
//! when `begin` has advanced past 1/8 of the capacity, the buffer is first
//! compacted by `begin / 2` chars — half the scanned prefix is retained so
//! recently created [`Part`](crate::Part) views stay resolvable — and every
//! index (window, line index, scan checkpoint) is rebased while `abs_pos0`
//! absorbs the shift. The thresholds are tuning constants; correctness is
//! covered by the compaction-transparency property tests, not by their
//! values.
//!
//! Decoding is `encoding_rs`: a BOM (UTF-8, UTF-16 LE/BE) wins, else an
//! in-text declaration in the first two lines (`<marker>=<charset>`), else
//! the caller-supplied default, else UTF-8. Decode errors are replaced,
//! not fatal; only an unknown *declared* charset is.

use std::{collections::VecDeque, io::Read};

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

use crate::{
    error::{ErrorKind, Result, ScanError},
    line_index::LineIndex,
    scanner::{ScanState, Scanner},
    window::Window,
};

/// Buffer capacity when the caller requests auto-sizing (capacity 0).
const DEFAULT_CAPACITY: usize = 1000;
/// Refill compacts once `begin` passed `capacity / COMPACT_TRIGGER_DIVISOR`.
const COMPACT_TRIGGER_DIVISOR: usize = 8;
/// Bytes per read call while refilling.
const READ_CHUNK: usize = 4096;

/// Reader, decoder and undecoded/unconsumed backlogs of a streaming
/// scanner.
pub(crate) struct StreamFeed {
    reader: Box<dyn Read>,
    source_name: String,
    pub(crate) capacity: usize,
    decoder: Decoder,
    /// Bytes read but not yet decoded (partial sequences at chunk ends).
    raw: Vec<u8>,
    /// Chars decoded but not yet appended (buffer was full).
    pending: VecDeque<char>,
    /// The reader returned a zero-length read. A short read is not EOF;
    /// only a zero-length one is.
    raw_eof: bool,
    /// Confirmed: the raw backlog is drained and the reader is done.
    eof: bool,
}

impl StreamFeed {
    /// No chars will ever come out of this feed again.
    fn exhausted(&self) -> bool {
        self.eof && self.pending.is_empty()
    }

    /// Yields up to `max` decoded chars, reading and decoding as needed.
    fn take_chars(&mut self, max: usize) -> std::io::Result<Vec<char>> {
        while self.pending.is_empty() && !self.eof {
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                self.raw_eof = true;
            } else {
                self.raw.extend_from_slice(&chunk[..n]);
            }
            self.decode_backlog();
            if self.raw_eof && self.raw.is_empty() {
                self.eof = true;
            }
        }
        let take = self.pending.len().min(max);
        Ok(self.pending.drain(..take).collect())
    }

    fn decode_backlog(&mut self) {
        let cap = self
            .decoder
            .max_utf8_buffer_length(self.raw.len())
            .unwrap_or(self.raw.len() * 3 + 4);
        let mut out = String::with_capacity(cap.max(4));
        let (result, read, _replaced) = self.decoder.decode_to_string(&self.raw, &mut out, self.raw_eof);
        debug_assert!(matches!(result, CoderResult::InputEmpty));
        self.raw.drain(..read);
        self.pending.extend(out.chars());
    }
}

impl Scanner {
    /// Opens a streaming scanner over `reader`.
    ///
    /// `source_name` labels I/O errors. `buffer_capacity` is the char
    /// capacity of the scan buffer; `0` requests auto-sizing
    /// (1000 chars). When `encoding_marker` is given, the first two
    /// decoded lines are searched for `<marker>=<charset>` (quoted or bare
    /// name) and the initial chunk is re-decoded with the declared
    /// charset. A BOM takes precedence for the initial decode; without
    /// either, `default_encoding` (or UTF-8) applies.
    ///
    /// # Errors
    ///
    /// I/O failure on the initial read, [`ErrorKind::UnknownCharset`] for a
    /// declared-but-unknown charset, [`ErrorKind::MalformedEncodingDecl`]
    /// when the marker is present but no charset name parses.
    pub fn from_reader(
        reader: impl Read + 'static,
        source_name: impl Into<String>,
        buffer_capacity: usize,
        encoding_marker: Option<&str>,
        default_encoding: Option<&'static Encoding>,
    ) -> Result<Self> {
        let source_name = source_name.into();
        let capacity = if buffer_capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            buffer_capacity
        };
        let mut reader: Box<dyn Read> = Box::new(reader);

        // Initial chunk: enough bytes to fill the buffer even for UTF-16
        // input and to cover the declaration lines.
        let mut initial = vec![0u8; capacity.saturating_mul(4).max(1024)];
        let mut filled = 0;
        let mut raw_eof = false;
        loop {
            let n = reader.read(&mut initial[filled..]).map_err(|source| ScanError {
                kind: ErrorKind::Io {
                    source_name: source_name.clone(),
                    source,
                },
                line: 1,
                column: 1,
            })?;
            if n == 0 {
                raw_eof = true;
                break;
            }
            filled += n;
            if filled == initial.len() {
                break;
            }
        }
        initial.truncate(filled);

        let (bom_enc, bom_len) = Encoding::for_bom(&initial).map_or((None, 0), |(e, l)| (Some(e), l));
        let mut enc = bom_enc.or(default_encoding).unwrap_or(UTF_8);
        let (mut decoder, mut text, mut consumed) = decode_prefix(enc, &initial[bom_len..], raw_eof);

        if let Some(marker) = encoding_marker {
            if let Some(label) = declared_charset(&text, marker).map_err(|kind| ScanError {
                kind,
                line: 1,
                column: 1,
            })? {
                let declared =
                    Encoding::for_label(label.as_bytes()).ok_or_else(|| ScanError {
                        kind: ErrorKind::UnknownCharset(label),
                        line: 1,
                        column: 1,
                    })?;
                if declared != enc {
                    enc = declared;
                    (decoder, text, consumed) = decode_prefix(enc, &initial[bom_len..], raw_eof);
                }
            }
        }

        let mut pending: VecDeque<char> = text.chars().collect();
        let raw = initial[bom_len + consumed..].to_vec();
        let mut content = Vec::with_capacity(capacity);
        while content.len() < capacity {
            match pending.pop_front() {
                Some(c) => content.push(c),
                None => break,
            }
        }
        let eof = raw_eof && raw.is_empty();
        let mut lines = LineIndex::new();
        lines.extend(&content);
        Ok(Scanner {
            win: Window::new(0, content.len()),
            content,
            opts: crate::options::ScanOptions::default(),
            lines,
            scan: ScanState::new(0),
            stream: Some(StreamFeed {
                reader,
                source_name,
                capacity,
                decoder,
                raw,
                pending,
                raw_eof,
                eof,
            }),
        })
    }

    /// Explicitly refills the stream buffer.
    ///
    /// No-op returning `true` while `begin < min_pos` (not enough consumed
    /// yet for a refill to pay off). Returns `false` once the source is
    /// exhausted (or for an in-memory scanner). Refilling may compact the
    /// buffer; see the module docs.
    ///
    /// # Errors
    ///
    /// I/O failure of the underlying reader.
    pub fn read_next_content(&mut self, min_pos: usize) -> Result<bool> {
        match &self.stream {
            None => Ok(false),
            Some(stream) if stream.exhausted() => Ok(false),
            Some(_) => {
                if self.win.begin < min_pos {
                    return Ok(true);
                }
                self.refill_more()
            }
        }
    }

    /// Compacts if due, then appends decoded chars at the buffer tail.
    /// Returns whether any char was appended.
    pub(crate) fn refill_more(&mut self) -> Result<bool> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };
        if stream.exhausted() {
            return Ok(false);
        }
        if self.win.begin >= stream.capacity / COMPACT_TRIGGER_DIVISOR {
            let shift = self.win.begin / 2;
            if shift > 0 {
                self.content.drain(..shift);
                self.win.shift_left(shift);
                self.lines.shift_left(shift);
                self.scan.shift_left(shift);
            }
        }
        let space = stream.capacity.saturating_sub(self.content.len());
        if space == 0 {
            return Ok(false);
        }
        let chars = match stream.take_chars(space) {
            Ok(chars) => chars,
            Err(source) => {
                let source_name = stream.source_name.clone();
                return Err(self.err(ErrorKind::Io {
                    source_name,
                    source,
                }));
            }
        };
        if chars.is_empty() {
            return Ok(false);
        }
        let appended = chars.len();
        self.content.extend(chars);
        self.win.grow(appended);
        self.lines.extend(&self.content);
        self.win.debug_check(self.content.len());
        Ok(true)
    }
}

/// Decodes a byte prefix with a fresh decoder for `enc`; returns the
/// decoder (carrying any partial-sequence state), the decoded text and the
/// bytes consumed.
fn decode_prefix(enc: &'static Encoding, bytes: &[u8], last: bool) -> (Decoder, String, usize) {
    let mut decoder = enc.new_decoder_without_bom_handling();
    let cap = decoder
        .max_utf8_buffer_length(bytes.len())
        .unwrap_or(bytes.len() * 3 + 4);
    let mut out = String::with_capacity(cap.max(4));
    let (result, read, _replaced) = decoder.decode_to_string(bytes, &mut out, last);
    debug_assert!(matches!(result, CoderResult::InputEmpty));
    (decoder, out, read)
}

/// Searches the first two lines for `<marker>=<charset>` and extracts the
/// charset name (quoted, or bare over `[A-Za-z0-9_-]`).
///
/// A marker without `=` is no declaration; a declaration whose name does
/// not parse is malformed.
fn declared_charset(text: &str, marker: &str) -> std::result::Result<Option<String>, ErrorKind> {
    let head = match text.match_indices('\n').nth(1) {
        Some((at, _)) => &text[..at],
        None => text,
    };
    let Some(at) = head.find(marker) else {
        return Ok(None);
    };
    let rest = head[at + marker.len()..].trim_start();
    let Some(rest) = rest.strip_prefix('=') else {
        return Ok(None);
    };
    let rest = rest.trim_start();
    let mut chars = rest.chars();
    match chars.next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = chars.as_str();
            match inner.find(quote) {
                Some(end) => Ok(Some(inner[..end].to_string())),
                None => Err(ErrorKind::MalformedEncodingDecl(marker.to_string())),
            }
        }
        Some(c) if c.is_ascii_alphanumeric() => {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                .unwrap_or(rest.len());
            Ok(Some(rest[..end].to_string()))
        }
        _ => Err(ErrorKind::MalformedEncodingDecl(marker.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_charset_bare_and_quoted() {
        assert_eq!(
            declared_charset("# encoding=windows-1252\nrest", "encoding").unwrap(),
            Some("windows-1252".to_string())
        );
        assert_eq!(
            declared_charset("# encoding = \"utf-16le\"\n", "encoding").unwrap(),
            Some("utf-16le".to_string())
        );
    }

    #[test]
    fn declared_charset_only_in_first_two_lines() {
        assert_eq!(
            declared_charset("a\nb\nencoding=latin1\n", "encoding").unwrap(),
            None
        );
    }

    #[test]
    fn marker_without_assignment_is_no_declaration() {
        assert_eq!(declared_charset("encoding used here\n", "encoding").unwrap(), None);
    }

    #[test]
    fn malformed_declaration_is_an_error() {
        assert!(matches!(
            declared_charset("encoding=\"unclosed\n", "encoding"),
            Err(ErrorKind::MalformedEncodingDecl(_))
        ));
        assert!(matches!(
            declared_charset("encoding= ???\n", "encoding"),
            Err(ErrorKind::MalformedEncodingDecl(_))
        ));
    }

    #[test]
    fn bom_utf16le_is_detected_and_decoded() {
        // "hi\n" as UTF-16 LE with BOM.
        let bytes: Vec<u8> = vec![0xFF, 0xFE, b'h', 0, b'i', 0, b'\n', 0];
        let s = Scanner::from_reader(std::io::Cursor::new(bytes), "bom", 64, None, None).unwrap();
        assert_eq!(s.current_str(), "hi\n");
    }

    #[test]
    fn declared_charset_redecodes_initial_chunk() {
        // 0xE4 is ä in windows-1252 but invalid alone in UTF-8.
        let mut bytes = b"# coding=windows-1252\nv=\xE4\n".to_vec();
        bytes.push(b'x');
        let s =
            Scanner::from_reader(std::io::Cursor::new(bytes), "decl", 64, Some("coding"), None)
                .unwrap();
        assert!(s.current_str().contains("v=\u{e4}"));
    }

    #[test]
    fn unknown_declared_charset_fails_loudly() {
        let bytes = b"coding=no-such-charset\n".to_vec();
        let err = Scanner::from_reader(
            std::io::Cursor::new(bytes),
            "bad",
            64,
            Some("coding"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownCharset(_)));
    }

    #[test]
    fn auto_capacity_applies_minimum() {
        let text = "x".repeat(3000);
        let s = Scanner::from_reader(std::io::Cursor::new(text), "auto", 0, None, None).unwrap();
        assert_eq!(s.length(), DEFAULT_CAPACITY);
    }

    #[test]
    fn refill_appends_past_initial_fill() {
        let text: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let mut s =
            Scanner::from_reader(std::io::Cursor::new(text.clone()), "refill", 64, None, None)
                .unwrap();
        assert_eq!(s.length(), 64);
        let mut seen = String::new();
        s.firstline_maxpart().unwrap();
        while s.found() {
            seen.push_str(&s.current_str());
            seen.push('\n');
            s.nextline_maxpart().unwrap();
        }
        assert_eq!(seen, text);
    }

    #[test]
    fn compaction_keeps_logical_positions() {
        let text: String = (0..50).map(|i| format!("{i:04}\n")).collect();
        let mut s =
            Scanner::from_reader(std::io::Cursor::new(text), "abs", 32, None, None).unwrap();
        s.firstline_maxpart().unwrap();
        let mut expected_abs = 0u64;
        while s.found() {
            assert_eq!(s.abs_pos(), expected_abs, "logical position drifted");
            expected_abs += s.length() as u64 + 1;
            s.nextline_maxpart().unwrap();
        }
    }
}
