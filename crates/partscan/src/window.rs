//! The four-index window over the content buffer.
//!
//! `begi_min..end_max` is the maximal part the cursor may ever reach;
//! `begin..end` is the current part. Seek operations move only `begin`,
//! lento operations move only `end`. `abs_pos0` is the absolute stream
//! offset of buffer index 0, so `abs_pos0 + i` is the logical position of
//! index `i`, stable across compaction.

/// Invariant: `begi_min <= begin <= end <= end_max <= buffer length`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window {
    pub begin: usize,
    pub end: usize,
    pub begi_min: usize,
    pub end_max: usize,
    /// `begin` before the previous begin-moving operation, for `from_end`
    /// style undo.
    pub begin_last: usize,
    /// `end` before the previous end-moving operation.
    pub end_last: usize,
    pub abs_pos0: u64,
    /// Outcome of the last seek/lento/skip; idempotent until the next one.
    pub found: bool,
}

impl Window {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            begin: start,
            end,
            begi_min: start,
            end_max: end,
            begin_last: start,
            end_last: end,
            abs_pos0: 0,
            found: true,
        }
    }

    /// Length of the current part.
    pub(crate) fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Remembers `begin` before a begin-moving operation.
    pub(crate) fn note_begin(&mut self) {
        self.begin_last = self.begin;
    }

    /// Remembers `end` before an end-moving operation.
    pub(crate) fn note_end(&mut self) {
        self.end_last = self.end;
    }

    /// Rebases every index after the buffer lost its first `shift` chars.
    ///
    /// `begin_last`/`end_last` may predate the retained window; they
    /// saturate to 0, which degrades undo but keeps the invariant.
    pub(crate) fn shift_left(&mut self, shift: usize) {
        debug_assert!(shift <= self.begin, "compaction never discards unscanned text");
        self.begin -= shift;
        self.end -= shift;
        self.begi_min = self.begi_min.saturating_sub(shift);
        self.end_max -= shift;
        self.begin_last = self.begin_last.saturating_sub(shift);
        self.end_last = self.end_last.saturating_sub(shift);
        self.abs_pos0 += shift as u64;
    }

    /// Appends `n` freshly read chars at the buffer tail.
    pub(crate) fn grow(&mut self, n: usize) {
        self.end_max += n;
        // The current part of a streaming scanner tracks the maximal part.
        if self.end == self.end_max - n {
            self.end = self.end_max;
        }
    }

    #[track_caller]
    pub(crate) fn debug_check(&self, buf_len: usize) {
        debug_assert!(self.begi_min <= self.begin, "begi_min <= begin");
        debug_assert!(self.begin <= self.end, "begin <= end");
        debug_assert!(self.end <= self.end_max, "end <= end_max");
        debug_assert!(self.end_max <= buf_len, "end_max <= buffer length");
        let _ = buf_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_left_rebases_and_bumps_abs_pos0() {
        let mut w = Window::new(0, 100);
        w.begin = 40;
        w.end = 60;
        w.shift_left(20);
        assert_eq!((w.begin, w.end, w.begi_min, w.end_max), (20, 40, 0, 80));
        assert_eq!(w.abs_pos0, 20);
        w.debug_check(80);
    }

    #[test]
    fn grow_extends_end_only_at_tail() {
        let mut w = Window::new(0, 10);
        w.grow(5);
        assert_eq!((w.end, w.end_max), (15, 15));
        // A shortened current part stays shortened.
        w.end = 12;
        w.grow(3);
        assert_eq!((w.end, w.end_max), (12, 18));
    }
}
