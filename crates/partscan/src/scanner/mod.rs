//! The cursor engine: a logical window shifted over the content buffer.
//!
//! Why this exists
//! - Substring-free scanning: callers move `begin`/`end` over the buffer and
//!   materialize text only at the very end (via [`Part`] views), instead of
//!   allocating on every step.
//! - The same cursor drives both modes: an in-memory sequence filled once,
//!   or a fixed-capacity buffer refilled from a reader and compacted while
//!   scanning (see `stream.rs`).
//!
//! Operation families
//! - seek: moves `begin`, inside `[begi_min, end_max]`; a forward match
//!   past a shortened `end` re-opens the current part to `end_max`.
//! - lento: moves only `end`, inside `[begin, end_max]`.
//! - composites (`trim`, `line`, `firstline_maxpart`, `nextline_maxpart`)
//!   are built from the two families; the line composites are the natural
//!   refill points in streaming mode.
//! - the scan protocol (`scan_start`/`scan_*`/`scan_ok`, see `scan.rs`)
//!   layers checkpoint/rollback on top.
//!
//! Soft vs hard outcomes
//! - "pattern not present" is never an error: the operation leaves the
//!   window unchanged (seek) or empties the current part (lento) and
//!   records `found = false`. [`Scanner::found`] reports the outcome of the
//!   last such operation and is stable until the next one.
//! - Hard [`ScanError`]s are reserved for contract violations, stale views,
//!   malformed encoding declarations and I/O failures.

mod registers;
mod scan;

pub(crate) use scan::ScanState;

use crate::{
    error::{ErrorKind, Result, ScanError},
    line_index::LineIndex,
    options::ScanOptions,
    part::Part,
    search,
    stream::StreamFeed,
    window::Window,
};

/// Direction of a [`Seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDir {
    /// Left to right, starting at `begin`, searching `[begin, end_max)`.
    Forward,
    /// Right to left, starting at `end`, searching `[begi_min, end)`.
    BackFromEnd,
    /// Right to left, starting at `begin`, searching `[begi_min, begin)`.
    BackFromBegin,
}

/// Where `begin` lands relative to a successful [`Seek`] match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekLand {
    /// On the first char of the match.
    AtMatch,
    /// Just past the last char of the match.
    PastMatch,
}

/// Mode of a `seek_char`/`seek_str` search.
///
/// A failed seek always preserves the window and records `found = false`;
/// there is no throwing variant. A forward seek searches the whole
/// remaining maximal part; landing past a shortened `end` re-opens the
/// current part to `end_max`.
///
/// ```rust
/// use partscan::{Scanner, Seek};
///
/// let mut s = Scanner::from_str("key=value");
/// s.seek_char('=', Seek::forward().past());
/// assert!(s.found());
/// assert_eq!(s.current_str(), "value");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seek {
    /// Search direction and range.
    pub dir: SeekDir,
    /// Landing position of `begin` on success.
    pub land: SeekLand,
}

impl Seek {
    /// Forward search, landing on the match.
    #[must_use]
    pub fn forward() -> Self {
        Self {
            dir: SeekDir::Forward,
            land: SeekLand::AtMatch,
        }
    }

    /// Backward search from `end`, landing on the match.
    #[must_use]
    pub fn back_from_end() -> Self {
        Self {
            dir: SeekDir::BackFromEnd,
            land: SeekLand::AtMatch,
        }
    }

    /// Backward search from `begin`, landing on the match.
    #[must_use]
    pub fn back_from_begin() -> Self {
        Self {
            dir: SeekDir::BackFromBegin,
            land: SeekLand::AtMatch,
        }
    }

    /// Lands `begin` just past the match instead of on it.
    #[must_use]
    pub fn past(mut self) -> Self {
        self.land = SeekLand::PastMatch;
        self
    }
}

/// A cursor-based text scanner over an in-memory sequence or a compacting
/// stream buffer.
///
/// See the [crate docs](crate) for the two working modes and the module
/// docs for the operation families.
pub struct Scanner {
    pub(crate) content: Vec<char>,
    pub(crate) win: Window,
    pub(crate) opts: ScanOptions,
    pub(crate) lines: LineIndex,
    pub(crate) scan: ScanState,
    pub(crate) stream: Option<StreamFeed>,
}

impl core::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scanner")
            .field("win", &self.win)
            .field("streaming", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Wraps an in-memory text; the whole text becomes the maximal part.
    #[must_use]
    pub fn from_str(text: &str) -> Self {
        Self::from_chars(text.chars().collect())
    }

    /// Wraps a sub-range of an in-memory text; `start..end` (char indices)
    /// become the maximal part.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::RangeOutOfBounds`] when `start > end` or `end` exceeds
    /// the char length of `text`.
    pub fn from_str_range(text: &str, start: usize, end: usize) -> Result<Self> {
        let content: Vec<char> = text.chars().collect();
        if start > end || end > content.len() {
            return Err(ScanError {
                kind: ErrorKind::RangeOutOfBounds {
                    start,
                    end,
                    len: content.len(),
                },
                line: 1,
                column: 1,
            });
        }
        let mut lines = LineIndex::new();
        lines.extend(&content);
        Ok(Self {
            win: Window::new(start, end),
            content,
            opts: ScanOptions::default(),
            lines,
            scan: ScanState::new(start),
            stream: None,
        })
    }

    pub(crate) fn from_chars(content: Vec<char>) -> Self {
        let mut lines = LineIndex::new();
        lines.extend(&content);
        Self {
            win: Window::new(0, content.len()),
            content,
            opts: ScanOptions::default(),
            lines,
            scan: ScanState::new(0),
            stream: None,
        }
    }

    /// Replaces the scan-protocol options.
    pub fn set_options(&mut self, opts: ScanOptions) {
        self.opts = opts;
    }

    /// Outcome of the last seek/lento/skip operation. Idempotent until the
    /// next one.
    #[must_use]
    pub fn found(&self) -> bool {
        self.win.found
    }

    /// Length of the current part in chars.
    #[must_use]
    pub fn length(&self) -> usize {
        self.win.len()
    }

    /// Whether the current part is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.win.len() == 0
    }

    /// First char of the current part, `None` when it is empty.
    #[must_use]
    pub fn current_char(&self) -> Option<char> {
        (self.win.begin < self.win.end).then(|| self.content[self.win.begin])
    }

    /// Logical (stream-absolute) position of `begin`; stable across
    /// compaction.
    #[must_use]
    pub fn abs_pos(&self) -> u64 {
        self.win.abs_pos0 + self.win.begin as u64
    }

    /// A [`Part`] view of the current part `[begin, end)`.
    ///
    /// Convert it to text promptly: any buffer-mutating operation (refill,
    /// compaction, `close`) may invalidate it.
    #[must_use]
    pub fn get_current_part(&self) -> Part {
        Part::new(self.win.begin, self.win.end, self.win.abs_pos0)
    }

    /// Resolves a [`Part`] to the chars it views.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::StalePart`] when compaction has discarded the viewed
    /// span.
    pub fn part_chars(&self, part: &Part) -> Result<&[char]> {
        let (start, end) = part
            .resolve(self.win.abs_pos0, self.content.len())
            .map_err(|kind| self.err(kind))?;
        Ok(&self.content[start..end])
    }

    /// Materializes a [`Part`] as an owned string.
    ///
    /// # Errors
    ///
    /// Same as [`Self::part_chars`].
    pub fn part_str(&self, part: &Part) -> Result<String> {
        Ok(self.part_chars(part)?.iter().collect())
    }

    /// Materializes the current part as an owned string.
    #[must_use]
    pub fn current_str(&self) -> String {
        self.content[self.win.begin..self.win.end].iter().collect()
    }

    /// 1-based line and column of `begin`.
    #[must_use]
    pub fn line_and_column(&self) -> (usize, usize) {
        self.lines.line_and_column(self.win.begin)
    }

    /// Releases the underlying stream (if any) and collapses the window.
    ///
    /// Further operations see an empty window; outstanding [`Part`]s become
    /// stale.
    pub fn close(&mut self) {
        self.stream = None;
        self.content.clear();
        self.win = Window::new(0, 0);
        self.lines.clear();
        self.scan = ScanState::new(0);
    }

    pub(crate) fn err(&self, kind: ErrorKind) -> ScanError {
        let (line, column) = self.lines.line_and_column(self.win.begin);
        ScanError { kind, line, column }
    }

    // ----- seek family: moves only `begin` ---------------------------------

    /// Shifts `begin` by `rel` chars, clamped-checked against
    /// `[begi_min, end]`; out of range (including arithmetic overflow)
    /// leaves the window unchanged and records `found = false`.
    pub fn seek_pos(&mut self, rel: isize) -> &mut Self {
        let target = isize::try_from(self.win.begin)
            .ok()
            .and_then(|begin| begin.checked_add(rel))
            .and_then(|target| usize::try_from(target).ok());
        match target {
            Some(target) if target >= self.win.begi_min && target <= self.win.end => {
                self.win.note_begin();
                self.win.begin = target;
                self.win.found = true;
            }
            _ => self.win.found = false,
        }
        self.checked()
    }

    /// Positions `begin` at `n` chars before `end`; out of range (below
    /// `begi_min`) records `found = false` without mutation.
    pub fn seek_pos_back(&mut self, n: usize) -> &mut Self {
        match self.win.end.checked_sub(n) {
            Some(target) if target >= self.win.begi_min => {
                self.win.note_begin();
                self.win.begin = target;
                self.win.found = true;
            }
            _ => self.win.found = false,
        }
        self.checked()
    }

    /// Seeks `begin` to an occurrence of `c` per `mode`.
    pub fn seek_char(&mut self, c: char, mode: Seek) -> &mut Self {
        let hit = match mode.dir {
            SeekDir::Forward => {
                search::find_char(&self.content, self.win.begin, self.win.end_max, c)
            }
            SeekDir::BackFromEnd => {
                search::rfind_char(&self.content, self.win.begi_min, self.win.end, c)
            }
            SeekDir::BackFromBegin => {
                search::rfind_char(&self.content, self.win.begi_min, self.win.begin, c)
            }
        };
        self.land_seek(hit, 1, mode.land)
    }

    /// Seeks `begin` to an occurrence of `pat` per `mode`.
    ///
    /// An empty pattern is found at the search start.
    pub fn seek_str(&mut self, pat: &str, mode: Seek) -> &mut Self {
        let n = pat.chars().count();
        let hit = match mode.dir {
            SeekDir::Forward => {
                search::find_str(&self.content, self.win.begin, self.win.end_max, pat)
            }
            SeekDir::BackFromEnd => {
                search::rfind_str(&self.content, self.win.begi_min, self.win.end, pat)
            }
            SeekDir::BackFromBegin => {
                search::rfind_str(&self.content, self.win.begi_min, self.win.begin, pat)
            }
        };
        self.land_seek(hit, n, mode.land)
    }

    fn land_seek(&mut self, hit: Option<usize>, match_len: usize, land: SeekLand) -> &mut Self {
        match hit {
            Some(at) => {
                self.win.note_begin();
                let target = match land {
                    SeekLand::AtMatch => at,
                    SeekLand::PastMatch => at + match_len,
                };
                if target > self.win.end {
                    // A forward match beyond a shortened current part
                    // re-opens it.
                    self.win.note_end();
                    self.win.end = self.win.end_max;
                }
                self.win.begin = target;
                self.win.found = true;
            }
            None => self.win.found = false,
        }
        self.checked()
    }

    /// Resets `begin` to the maximal part start.
    pub fn seek_begin_maxpart(&mut self) -> &mut Self {
        self.win.note_begin();
        self.win.begin = self.win.begi_min;
        self.win.found = true;
        self.checked()
    }

    /// Sets the current part to everything after it: `begin := end`,
    /// `end := end_max`.
    pub fn from_end(&mut self) -> &mut Self {
        self.win.note_begin();
        self.win.note_end();
        self.win.begin = self.win.end;
        self.win.end = self.win.end_max;
        self.win.found = true;
        self.checked()
    }

    // ----- lento family: moves only `end` ----------------------------------

    /// Shrinks the maximal part to the current part end: `end_max := end`.
    /// Text beyond it stays in the buffer but is out of the cursor's
    /// reach.
    pub fn set_length_max(&mut self) -> &mut Self {
        self.win.end_max = self.win.end;
        self.win.found = true;
        self.checked()
    }

    /// Resets `end` to the maximal part end (undoes a failed lento).
    pub fn len_to_end(&mut self) -> &mut Self {
        self.win.note_end();
        self.win.end = self.win.end_max;
        self.win.found = true;
        self.checked()
    }

    /// Shortens the current part to end just before `c`, searching
    /// `[begin, end_max)`. Not found: `end := begin`, `found = false`.
    pub fn lento_char(&mut self, c: char) -> &mut Self {
        let hit = search::find_char(&self.content, self.win.begin, self.win.end_max, c);
        self.land_lento(hit)
    }

    /// Shortens the current part to end just before `pat`.
    pub fn lento_str(&mut self, pat: &str) -> &mut Self {
        let hit = search::find_str(&self.content, self.win.begin, self.win.end_max, pat);
        self.land_lento(hit)
    }

    /// Shortens the current part to end just before the first char of
    /// `set`.
    pub fn lento_any_char(&mut self, set: &str) -> &mut Self {
        let hit = search::index_of_any_char(
            &self.content,
            self.win.begin,
            self.win.end_max,
            set,
            None,
            None,
        );
        self.land_lento(hit)
    }

    /// Shortens the current part to end just before the first char of
    /// `set` found outside quotations and escapes.
    ///
    /// `escape` makes the following char never terminate; a quoted group
    /// (open to matching non-escaped close) is skipped as a whole. An
    /// unterminated quotation extends to the end of the maximal part.
    pub fn lento_any_char_outside_quotes(
        &mut self,
        set: &str,
        escape: Option<char>,
        quotes: Option<(char, char)>,
    ) -> &mut Self {
        let hit = search::index_of_any_char(
            &self.content,
            self.win.begin,
            self.win.end_max,
            set,
            escape,
            quotes,
        );
        self.land_lento(hit)
    }

    /// Shortens the current part to the identifier starting at `begin`
    /// (letter or `_`, then letters, digits, `_`). No identifier: `end :=
    /// begin`, `found = false`.
    pub fn lento_identifier(&mut self) -> &mut Self {
        let b = self.win.begin;
        let mut i = b;
        if i < self.win.end_max && (self.content[i].is_alphabetic() || self.content[i] == '_') {
            i += 1;
            while i < self.win.end_max
                && (self.content[i].is_alphanumeric() || self.content[i] == '_')
            {
                i += 1;
            }
        }
        let hit = (i > b).then_some(i);
        self.land_lento(hit)
    }

    /// Shortens the current part to the digit run starting at `begin`
    /// (optional leading sign). No digits: `end := begin`, `found = false`.
    pub fn lento_number(&mut self) -> &mut Self {
        let b = self.win.begin;
        let mut i = b;
        if i < self.win.end_max && (self.content[i] == '-' || self.content[i] == '+') {
            i += 1;
        }
        let digits_from = i;
        while i < self.win.end_max && self.content[i].is_ascii_digit() {
            i += 1;
        }
        let hit = (i > digits_from).then_some(i);
        self.land_lento(hit)
    }

    fn land_lento(&mut self, hit: Option<usize>) -> &mut Self {
        self.win.note_end();
        match hit {
            Some(at) => {
                self.win.end = at;
                self.win.found = true;
            }
            None => {
                self.win.end = self.win.begin;
                self.win.found = false;
            }
        }
        self.checked()
    }

    // ----- composites ------------------------------------------------------

    /// Shrinks the current part by leading and trailing whitespace.
    pub fn trim(&mut self) -> &mut Self {
        self.win.note_begin();
        self.win.note_end();
        while self.win.begin < self.win.end && ScanOptions::is_whitespace(self.content[self.win.begin])
        {
            self.win.begin += 1;
        }
        while self.win.end > self.win.begin
            && ScanOptions::is_whitespace(self.content[self.win.end - 1])
        {
            self.win.end -= 1;
        }
        self.win.found = true;
        self.checked()
    }

    /// Extends the current part to the rest of the line: `end` moves to the
    /// next line break (or `end_max`). Never refills.
    pub fn line(&mut self) -> &mut Self {
        self.win.note_end();
        self.win.end = search::index_of_any_char(
            &self.content,
            self.win.begin,
            self.win.end_max,
            "\r\n",
            None,
            None,
        )
        .unwrap_or(self.win.end_max);
        self.win.found = true;
        self.checked()
    }

    /// Sets the current part to the first line of the maximal part.
    ///
    /// In streaming mode the buffer is refilled until the line break is in
    /// reach (or the source ends).
    ///
    /// # Errors
    ///
    /// I/O or decode failure during a refill.
    pub fn firstline_maxpart(&mut self) -> Result<&mut Self> {
        self.win.note_begin();
        self.win.begin = self.win.begi_min;
        self.line_to_break_refilling()?;
        self.win.found = true;
        Ok(self.checked())
    }

    /// Advances to the next line of the maximal part: `begin` moves past
    /// the line break terminating the current part, `end` to the following
    /// break.
    ///
    /// Exactly one break of one or two chars is consumed; `\n`, `\r`,
    /// `\r\n` and `\n\r` all count once, so mixed line endings are never
    /// double-skipped. At the end of the text the operation records
    /// `found = false` (a trailing line break does not open an empty last
    /// line).
    ///
    /// # Errors
    ///
    /// I/O or decode failure during a refill.
    pub fn nextline_maxpart(&mut self) -> Result<&mut Self> {
        self.win.note_begin();
        self.win.begin = self.win.end;
        // The break may be a 2-char pair; make both chars decidable.
        self.ensure_ahead(2)?;
        let b = self.win.begin;
        if b < self.win.end_max {
            let c = self.content[b];
            if c == '\n' || c == '\r' {
                self.win.begin += 1;
                let partner = if c == '\n' { '\r' } else { '\n' };
                if self.win.begin < self.win.end_max && self.content[self.win.begin] == partner {
                    self.win.begin += 1;
                }
            }
        }
        if self.win.begin >= self.win.end_max {
            // Nothing after the break (or no break at all): end of text.
            self.win.end = self.win.begin;
            self.win.found = false;
            return Ok(self.checked());
        }
        self.line_to_break_refilling()?;
        self.win.found = true;
        Ok(self.checked())
    }

    /// Moves `end` to the next line break, refilling the stream buffer as
    /// long as no break is in reach and the source has more data.
    fn line_to_break_refilling(&mut self) -> Result<()> {
        loop {
            self.win.note_end();
            if let Some(at) = search::index_of_any_char(
                &self.content,
                self.win.begin,
                self.win.end_max,
                "\r\n",
                None,
                None,
            ) {
                self.win.end = at;
                return Ok(());
            }
            self.win.end = self.win.end_max;
            if !self.refill_more()? {
                return Ok(());
            }
        }
    }

    /// Refills until at least `n` chars lie beyond `begin` or the source is
    /// exhausted.
    fn ensure_ahead(&mut self, n: usize) -> Result<()> {
        while self.win.end_max - self.win.begin < n && self.refill_more()? {}
        Ok(())
    }

    fn checked(&mut self) -> &mut Self {
        self.win.debug_check(self.content.len());
        self
    }
}
