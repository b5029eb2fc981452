//! Typed result registers for the scan protocol.
//!
//! Each `scan_*` primitive that produces a value pushes it onto a small
//! fixed-depth stack; typed getters pop in LIFO order. The depth bounds how
//! deeply a single scan expression may nest — exceeding it is a hard error,
//! not a soft mismatch. After `scan_start` the stacks are cleared lazily:
//! the first push of the new bracket discards leftovers of the previous one,
//! so a failed bracket keeps its results inspectable.

use crate::{error::ErrorKind, part::Part};

/// How many results of one kind a single scan bracket may nest.
pub(crate) const MAX_DEPTH: usize = 5;

#[derive(Debug, Default)]
pub(crate) struct Registers {
    ints: Vec<(i64, bool)>,
    floats: Vec<f64>,
    strings: Vec<Part>,
    fresh: bool,
}

impl Registers {
    /// Marks the stacks stale; the next push clears them first.
    pub(crate) fn mark_fresh(&mut self) {
        self.fresh = true;
    }

    fn clear_if_fresh(&mut self) {
        if self.fresh {
            self.ints.clear();
            self.floats.clear();
            self.strings.clear();
            self.fresh = false;
        }
    }

    pub(crate) fn push_int(&mut self, value: i64, negative: bool) -> Result<(), ErrorKind> {
        self.clear_if_fresh();
        if self.ints.len() == MAX_DEPTH {
            return Err(ErrorKind::RegisterOverflow(MAX_DEPTH));
        }
        self.ints.push((value, negative));
        Ok(())
    }

    pub(crate) fn push_float(&mut self, value: f64) -> Result<(), ErrorKind> {
        self.clear_if_fresh();
        if self.floats.len() == MAX_DEPTH {
            return Err(ErrorKind::RegisterOverflow(MAX_DEPTH));
        }
        self.floats.push(value);
        Ok(())
    }

    pub(crate) fn push_string(&mut self, part: Part) -> Result<(), ErrorKind> {
        self.clear_if_fresh();
        if self.strings.len() == MAX_DEPTH {
            return Err(ErrorKind::RegisterOverflow(MAX_DEPTH));
        }
        self.strings.push(part);
        Ok(())
    }

    pub(crate) fn pop_int(&mut self) -> Result<(i64, bool), ErrorKind> {
        self.ints
            .pop()
            .ok_or(ErrorKind::EmptyRegister("integer"))
    }

    pub(crate) fn pop_float(&mut self) -> Result<f64, ErrorKind> {
        self.floats.pop().ok_or(ErrorKind::EmptyRegister("float"))
    }

    pub(crate) fn pop_string(&mut self) -> Result<Part, ErrorKind> {
        self.strings
            .pop()
            .ok_or(ErrorKind::EmptyRegister("string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_is_lifo() {
        let mut r = Registers::default();
        r.push_int(1, false).unwrap();
        r.push_int(2, true).unwrap();
        assert_eq!(r.pop_int().unwrap(), (2, true));
        assert_eq!(r.pop_int().unwrap(), (1, false));
        assert_eq!(r.pop_int().unwrap_err(), ErrorKind::EmptyRegister("integer"));
    }

    #[test]
    fn overflow_at_fixed_depth() {
        let mut r = Registers::default();
        for i in 0..MAX_DEPTH {
            r.push_float(i as f64).unwrap();
        }
        assert_eq!(
            r.push_float(9.0).unwrap_err(),
            ErrorKind::RegisterOverflow(MAX_DEPTH)
        );
    }

    #[test]
    fn first_push_after_mark_clears_leftovers() {
        let mut r = Registers::default();
        r.push_int(1, false).unwrap();
        r.push_float(0.5).unwrap();
        r.mark_fresh();
        r.push_int(2, false).unwrap();
        assert_eq!(r.pop_int().unwrap(), (2, false));
        assert!(r.pop_int().is_err());
        // Sibling stacks are cleared by the same first push.
        assert!(r.pop_float().is_err());
    }
}
