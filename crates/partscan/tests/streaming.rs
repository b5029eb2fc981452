//! End-to-end checks of the streaming mode against the in-memory mode.
//!
//! The buffer manager (refill, compaction, index rebasing) must be
//! invisible to callers: the same operations over the same text yield the
//! same parts and positions whether the text is held whole or fed through a
//! small compacting buffer.

use std::io::Cursor;

use quickcheck_macros::quickcheck;

use partscan::{Encoding, ErrorKind, ScanOptions, Scanner};

/// Collects all lines via `firstline_maxpart`/`nextline_maxpart`.
fn lines_of(s: &mut Scanner) -> Vec<String> {
    let mut lines = Vec::new();
    s.firstline_maxpart().unwrap();
    while s.found() {
        lines.push(s.current_str());
        s.nextline_maxpart().unwrap();
    }
    lines
}

/// A buffer capacity that always leaves room for the longest break-free
/// run of `text` beside the retained scanned prefix.
fn roomy_capacity(text: &str) -> usize {
    let longest = text
        .split(['\n', '\r'])
        .map(|run| run.chars().count())
        .max()
        .unwrap_or(0);
    longest * 2 + 16
}

#[test]
fn ten_thousand_lines_through_a_small_buffer() {
    let text: String = (0..10_000)
        .map(|i| format!("line {i}: some payload\n"))
        .collect();

    let mut streamed =
        Scanner::from_reader(Cursor::new(text.clone()), "big", 256, None, None).unwrap();
    let got = lines_of(&mut streamed);

    assert_eq!(got.len(), 10_000);
    let expected: Vec<&str> = text.lines().collect();
    assert_eq!(got, expected);
}

#[test]
fn scan_protocol_works_across_refills() {
    let text: String = (0..500).map(|i| format!("key{i} = {i}\n")).collect();
    let mut s = Scanner::from_reader(Cursor::new(text), "kv", 128, None, None).unwrap();

    s.firstline_maxpart().unwrap();
    let mut i = 0i64;
    while s.found() {
        s.scan_start();
        let ok = s
            .scan_identifier()
            .unwrap()
            .scan_literal_str("=")
            .unwrap()
            .scan_integer()
            .unwrap()
            .scan_ok();
        assert!(ok, "line {i} did not parse");
        assert_eq!(s.last_integer().unwrap(), (i, false));
        assert_eq!(s.get_last_scanned_string().unwrap(), format!("key{i}"));
        i += 1;
        s.nextline_maxpart().unwrap();
    }
    assert_eq!(i, 500);
}

#[test]
fn part_from_a_discarded_region_goes_stale() {
    let text: String = (0..200).map(|i| format!("row {i}\n")).collect();
    let mut s = Scanner::from_reader(Cursor::new(text), "stale", 64, None, None).unwrap();

    s.firstline_maxpart().unwrap();
    let first = s.get_current_part();
    assert_eq!(s.part_str(&first).unwrap(), "row 0");

    // Scan far enough that compaction has discarded the first line.
    let mut n = 0;
    while s.found() {
        n += 1;
        s.nextline_maxpart().unwrap();
    }
    assert_eq!(n, 200);
    let err = s.part_str(&first).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::StalePart { .. }));
}

#[test]
fn explicit_refill_is_a_noop_until_enough_is_consumed() {
    let text = "abcdefgh".repeat(32);
    let mut s = Scanner::from_reader(Cursor::new(text), "explicit", 64, None, None).unwrap();

    // Nothing consumed yet: below min_pos the call reports "come back
    // later" without touching the buffer.
    assert!(s.read_next_content(16).unwrap());
    assert_eq!(s.length(), 64);

    s.seek_pos(32);
    assert!(s.read_next_content(16).unwrap());
    while s.read_next_content(0).unwrap() {
        s.seek_pos(isize::try_from(s.length()).unwrap());
    }
    assert!(!s.read_next_content(0).unwrap());

    // In-memory scanners never refill.
    let mut plain = Scanner::from_str("abc");
    assert!(!plain.read_next_content(0).unwrap());
}

#[test]
fn caller_supplied_default_encoding_applies() {
    // 0xE4 is ä in windows-1252; without BOM or declaration the supplied
    // default decides.
    let bytes = b"v=\xE4\n".to_vec();
    let enc = Encoding::for_label(b"windows-1252").unwrap();
    let s = Scanner::from_reader(Cursor::new(bytes), "default", 64, None, Some(enc)).unwrap();
    assert_eq!(s.current_str(), "v=\u{e4}\n");
}

#[test]
fn options_survive_refills() {
    let text: String = (0..300).map(|i| format!("n = 1'00{}\n", i % 10)).collect();
    let mut s = Scanner::from_reader(Cursor::new(text), "opts", 96, None, None).unwrap();
    let mut opts = ScanOptions::default();
    opts.digit_group_separator = Some('\'');
    s.set_options(opts);

    s.firstline_maxpart().unwrap();
    let mut count = 0;
    while s.found() {
        s.scan_start();
        let ok = s
            .scan_literal_str("n")
            .unwrap()
            .scan_literal_str("=")
            .unwrap()
            .scan_integer()
            .unwrap()
            .scan_ok();
        assert!(ok);
        assert_eq!(s.last_integer().unwrap().0, 1000 + i64::from(count % 10));
        count += 1;
        s.nextline_maxpart().unwrap();
    }
    assert_eq!(count, 300);
}

#[quickcheck]
fn compaction_is_transparent_for_line_scanning(text: String) -> bool {
    // A leading U+FEFF is consumed as a byte-order mark in streaming mode;
    // the in-memory constructor keeps it. Not the property under test.
    if text.starts_with('\u{feff}') {
        return true;
    }
    let mut reference = Scanner::from_str(&text);
    let expected = lines_of(&mut reference);

    let cap = roomy_capacity(&text);
    let mut streamed =
        Scanner::from_reader(Cursor::new(text.into_bytes()), "prop", cap, None, None).unwrap();
    lines_of(&mut streamed) == expected
}

#[quickcheck]
fn logical_positions_are_monotone_across_compaction(runs: Vec<u8>) -> bool {
    // Build a text of short lines whose lengths follow the generated runs.
    let text: String = runs
        .iter()
        .map(|&n| {
            let len = usize::from(n % 13);
            let mut line = "x".repeat(len);
            line.push('\n');
            line
        })
        .collect();

    let mut s = Scanner::from_reader(Cursor::new(text), "mono", 32, None, None).unwrap();
    s.firstline_maxpart().unwrap();
    let mut last = 0u64;
    let mut first = true;
    while s.found() {
        let pos = s.abs_pos();
        if !first && pos <= last {
            return false;
        }
        last = pos;
        first = false;
        s.nextline_maxpart().unwrap();
    }
    true
}
