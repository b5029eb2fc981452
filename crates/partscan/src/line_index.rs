//! Amortized line/column lookup for the scan position.
//!
//! A growable array of line-start offsets, appended to as content is read
//! and pruned when the streaming buffer is compacted. Lookup is a binary
//! search for the greatest line start at or before a position; line and
//! column are both 1-based.
//!
//! Offsets are kept as `i64`: after a compaction the start of the first
//! retained line may lie *before* buffer index 0, and keeping it as a
//! negative offset preserves exact columns for the retained prefix instead
//! of clamping them.

/// Line-start index over the content buffer.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    /// Buffer-relative start offset of each indexed line, ascending. The
    /// front entry may be negative after compaction; there is always at
    /// least one entry.
    starts: Vec<i64>,
    /// 1-based line number of `starts[0]`, rebased when front entries are
    /// dropped.
    first_line: usize,
    /// Chars of the buffer already indexed.
    scanned: usize,
    /// Newline char that ended the previously scanned char, if any; pairs
    /// `\r\n` and `\n\r` count as one line break across append boundaries.
    pair_first: Option<char>,
}

impl LineIndex {
    pub(crate) fn new() -> Self {
        Self {
            starts: vec![0],
            first_line: 1,
            scanned: 0,
            pair_first: None,
        }
    }

    /// Indexes the chars appended to `buf` since the previous call.
    pub(crate) fn extend(&mut self, buf: &[char]) {
        for pos in self.scanned..buf.len() {
            let c = buf[pos];
            if c == '\n' || c == '\r' {
                match self.pair_first.take() {
                    // Second half of a mixed 2-char line ending: the break
                    // consumed one more char, the line starts one later.
                    Some(first) if first != c => {
                        if let Some(last) = self.starts.last_mut() {
                            *last += 1;
                        }
                    }
                    _ => {
                        self.starts.push(pos as i64 + 1);
                        self.pair_first = Some(c);
                    }
                }
            } else {
                self.pair_first = None;
            }
        }
        self.scanned = buf.len();
    }

    /// 1-based `(line, column)` of the char index `pos`.
    pub(crate) fn line_and_column(&self, pos: usize) -> (usize, usize) {
        let pos = pos as i64;
        // Greatest start <= pos; starts[0] <= 0 <= pos always holds.
        let idx = self.starts.partition_point(|&s| s <= pos) - 1;
        let column = usize::try_from(pos - self.starts[idx] + 1).unwrap_or(0);
        (self.first_line + idx, column)
    }

    /// Rebases the index after the buffer lost its first `shift` chars.
    ///
    /// Entries before the retained window are dropped except the last one,
    /// which survives as a (possibly negative) offset so the partial first
    /// line keeps exact columns.
    pub(crate) fn shift_left(&mut self, shift: usize) {
        for s in &mut self.starts {
            *s -= shift as i64;
        }
        let dropped = self.starts.partition_point(|&s| s <= 0).saturating_sub(1);
        if dropped > 0 {
            self.starts.drain(..dropped);
            self.first_line += dropped;
        }
        self.scanned = self.scanned.saturating_sub(shift);
    }

    /// Forgets everything; used by `close()`.
    pub(crate) fn clear(&mut self) {
        self.starts.clear();
        self.starts.push(0);
        self.first_line = 1;
        self.scanned = 0;
        self.pair_first = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn index_of(text: &str) -> LineIndex {
        let buf: Vec<char> = text.chars().collect();
        let mut idx = LineIndex::new();
        idx.extend(&buf);
        idx
    }

    #[test]
    fn offset_resolves_to_line_and_column() {
        let idx = index_of("ab\ncde\nfg");
        assert_eq!(idx.line_and_column(0), (1, 1));
        assert_eq!(idx.line_and_column(4), (2, 2));
        assert_eq!(idx.line_and_column(7), (3, 1));
    }

    #[rstest]
    #[case("a\nb\nc", 2, (2, 1))]
    #[case("a\r\nb", 3, (2, 1))]
    #[case("a\n\rb", 3, (2, 1))]
    #[case("a\n\nb", 3, (3, 1))]
    #[case("a\r\rb", 3, (3, 1))]
    fn mixed_line_endings_count_once(
        #[case] text: &str,
        #[case] pos: usize,
        #[case] expected: (usize, usize),
    ) {
        assert_eq!(index_of(text).line_and_column(pos), expected);
    }

    #[test]
    fn pair_split_across_appends_still_counts_once() {
        let mut idx = LineIndex::new();
        let mut buf: Vec<char> = "a\r".chars().collect();
        idx.extend(&buf);
        buf.extend("\nb".chars());
        idx.extend(&buf);
        assert_eq!(idx.line_and_column(3), (2, 1));
    }

    #[test]
    fn shift_rebase_keeps_lines_and_columns() {
        let mut idx = index_of("ab\ncde\nfg");
        // Drop the first 4 chars; 'd' is now at offset 0.
        idx.shift_left(4);
        assert_eq!(idx.line_and_column(0), (2, 2));
        assert_eq!(idx.line_and_column(3), (3, 1));
    }

    #[test]
    fn shift_then_extend_continues_numbering() {
        let text = "ab\ncde\nfg";
        let mut buf: Vec<char> = text.chars().collect();
        let mut idx = LineIndex::new();
        idx.extend(&buf);
        buf.drain(..7);
        idx.shift_left(7);
        buf.extend("\nhi".chars());
        idx.extend(&buf);
        // "fg" is line 3; "hi" is line 4.
        assert_eq!(idx.line_and_column(0), (3, 1));
        assert_eq!(idx.line_and_column(3), (4, 1));
    }
}
