//! Non-owning views into the scanner's content buffer.
//!
//! A [`Part`] is the borrowed outcome of an accessor like
//! `get_current_part()` or a string register pop. It records char indices
//! captured at creation time plus a snapshot of the absolute offset of
//! buffer index 0 (`abs_pos0`). Because streaming compaction shifts the
//! buffer but bumps `abs_pos0` by the same amount, resolution can always
//! recompute current indices from the snapshot delta — and fail loudly when
//! the viewed span has been compacted away, instead of silently reading
//! shifted characters.

use crate::error::ErrorKind;

/// A lightweight view of a span of the scanner's content.
///
/// Valid until a compaction moves its start out of the retained window;
/// resolving it afterwards yields [`ErrorKind::StalePart`]. A `Part` holds
/// no reference to the scanner: materialize it with
/// [`Scanner::part_str`](crate::Scanner::part_str) (or `part_chars`) while
/// it is still fresh, or store the owned string instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    start: usize,
    end: usize,
    origin: u64,
}

impl Part {
    pub(crate) fn new(start: usize, end: usize, origin: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end, origin }
    }

    /// Length of the viewed span in chars. Stable across compaction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the viewed span is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Absolute stream offset of the first viewed char. Stable across
    /// compaction.
    #[must_use]
    pub fn abs_start(&self) -> u64 {
        self.origin + self.start as u64
    }

    /// Recomputes current buffer indices from the `abs_pos0` delta.
    ///
    /// Fails with [`ErrorKind::StalePart`] when compaction has discarded the
    /// start of the span, and with an index check when the end exceeds the
    /// buffer (possible only after `close()`).
    pub(crate) fn resolve(&self, abs_pos0: u64, buf_len: usize) -> Result<(usize, usize), ErrorKind> {
        debug_assert!(abs_pos0 >= self.origin, "abs_pos0 decreases never");
        let shift = usize::try_from(abs_pos0 - self.origin).unwrap_or(usize::MAX);
        let (Some(start), Some(end)) = (self.start.checked_sub(shift), self.end.checked_sub(shift))
        else {
            return Err(ErrorKind::StalePart {
                missing: shift - self.start,
            });
        };
        if end > buf_len {
            return Err(ErrorKind::RangeOutOfBounds {
                start,
                end,
                len: buf_len,
            });
        }
        Ok((start, end))
    }
}
