//! Checkpoint/rollback scan protocol over the window.
//!
//! `scan_start()` snapshots `begin`; each `scan_*` primitive tries a match
//! at the cursor (after optional whitespace/comment skipping) and either
//! advances `begin` and pushes a typed register, or sets a one-shot
//! no-match flag without mutating anything. Once the flag is set, every
//! further `scan_*` before the closing `scan_ok()` is a no-op, so
//! consecutive calls AND-compose:
//!
//! ```rust
//! use partscan::Scanner;
//!
//! let mut s = Scanner::from_str("width = 640;");
//! s.scan_start();
//! let ok = s
//!     .scan_literal_str("width")?
//!     .scan_literal_str("=")?
//!     .scan_integer()?
//!     .scan_ok();
//! assert!(ok);
//! assert_eq!(s.last_integer()?, (640, false));
//! # Ok::<(), partscan::ScanError>(())
//! ```
//!
//! `scan_ok()` commits on success (the snapshot moves up) and rolls `begin`
//! back to the snapshot on failure, making the whole bracket atomic.
//! Failure to match is always soft; the `Result`s carry only hard errors
//! (protocol misuse, register overflow/underflow).

use super::registers::Registers;
use crate::{
    error::{ErrorKind, Result},
    options::ScanOptions,
    part::Part,
    scanner::Scanner,
    search,
};

/// Protocol state: the rollback checkpoint, the one-shot no-match flag and
/// the typed result registers.
#[derive(Debug)]
pub(crate) struct ScanState {
    begin_scan: usize,
    scanning: bool,
    no_match: bool,
    registers: Registers,
}

impl ScanState {
    pub(crate) fn new(begin: usize) -> Self {
        Self {
            begin_scan: begin,
            scanning: false,
            no_match: false,
            registers: Registers::default(),
        }
    }

    /// Rebases the checkpoint after compaction. A checkpoint that fell off
    /// the retained window saturates; rolling back across a compaction is
    /// not supported.
    pub(crate) fn shift_left(&mut self, shift: usize) {
        self.begin_scan = self.begin_scan.saturating_sub(shift);
    }
}

impl Scanner {
    /// Opens (or re-opens) a scan bracket: snapshots `begin` as the
    /// rollback checkpoint and marks the registers for lazy clearing.
    pub fn scan_start(&mut self) -> &mut Self {
        self.scan.begin_scan = self.win.begin;
        self.scan.scanning = true;
        self.scan.no_match = false;
        self.scan.registers.mark_fresh();
        self
    }

    /// Closes the current chain: commits the advance when every `scan_*`
    /// since the checkpoint matched (and returns `true`), otherwise rolls
    /// `begin` back to the checkpoint. Either way the next chain starts
    /// clean at the new checkpoint.
    ///
    /// Without a preceding [`scan_start`](Self::scan_start) this returns
    /// `false` and does nothing.
    pub fn scan_ok(&mut self) -> bool {
        if !self.scan.scanning {
            return false;
        }
        let ok = !self.scan.no_match;
        if ok {
            self.scan.begin_scan = self.win.begin;
        } else {
            self.win.begin = self.scan.begin_scan.max(self.win.begi_min);
            self.scan.no_match = false;
        }
        self.win.debug_check(self.content.len());
        ok
    }

    /// Common entry of every `scan_*` primitive: enforces the bracket,
    /// short-circuits a failed chain, and yields the cursor after optional
    /// whitespace/comment skipping.
    fn scan_entry(&mut self) -> Result<Option<usize>> {
        if !self.scan.scanning {
            return Err(self.err(ErrorKind::NotScanning));
        }
        if self.scan.no_match {
            return Ok(None);
        }
        let cursor = if self.opts.skip_whitespace {
            self.skip_ws_and_comments(self.win.begin)
        } else {
            self.win.begin
        };
        Ok(Some(cursor))
    }

    fn commit(&mut self, cursor: usize) -> &mut Self {
        debug_assert!(cursor <= self.win.end);
        self.win.note_begin();
        self.win.begin = cursor;
        self.win.debug_check(self.content.len());
        self
    }

    fn mismatch(&mut self) -> &mut Self {
        self.scan.no_match = true;
        self
    }

    fn skip_ws_and_comments(&self, mut i: usize) -> usize {
        let end = self.win.end;
        loop {
            while i < end && ScanOptions::is_whitespace(self.content[i]) {
                i += 1;
            }
            if let Some(lc) = &self.opts.line_comment {
                if search::starts_with_at(&self.content, i, end, lc) {
                    i = search::index_of_any_char(&self.content, i, end, "\r\n", None, None)
                        .unwrap_or(end);
                    continue;
                }
            }
            if let Some((open, close)) = &self.opts.block_comment {
                if search::starts_with_at(&self.content, i, end, open) {
                    let from = i + open.chars().count();
                    i = search::find_str(&self.content, from, end, close)
                        .map_or(end, |at| at + close.chars().count());
                    continue;
                }
            }
            return i;
        }
    }

    // ----- primitives ------------------------------------------------------

    /// Matches `lit` verbatim at the cursor.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket.
    pub fn scan_literal_str(&mut self, lit: &str) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        if search::starts_with_at(&self.content, cursor, self.win.end, lit) {
            let after = cursor + lit.chars().count();
            Ok(self.commit(after))
        } else {
            Ok(self.mismatch())
        }
    }

    /// Matches an identifier (letter or `_`, then letters, digits, `_`) and
    /// pushes it onto the string register.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket,
    /// [`ErrorKind::RegisterOverflow`] on over-deep nesting.
    pub fn scan_identifier(&mut self) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        let end = self.win.end;
        let mut i = cursor;
        if i < end && (self.content[i].is_alphabetic() || self.content[i] == '_') {
            i += 1;
            while i < end && (self.content[i].is_alphanumeric() || self.content[i] == '_') {
                i += 1;
            }
        }
        if i == cursor {
            return Ok(self.mismatch());
        }
        let part = Part::new(cursor, i, self.win.abs_pos0);
        self.scan
            .registers
            .push_string(part)
            .map_err(|kind| self.err(kind))?;
        Ok(self.commit(i))
    }

    /// Matches a digit run in `radix` (no sign, no group separator) and
    /// pushes its value onto the integer register.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket,
    /// [`ErrorKind::RegisterOverflow`] on over-deep nesting.
    pub fn scan_digits(&mut self, radix: u32) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        match self.digit_run(cursor, radix, None) {
            Some((value, after)) => {
                self.scan
                    .registers
                    .push_int(value, false)
                    .map_err(|kind| self.err(kind))?;
                Ok(self.commit(after))
            }
            None => Ok(self.mismatch()),
        }
    }

    /// Matches a decimal integer with optional sign and optional group
    /// separators (see
    /// [`ScanOptions::digit_group_separator`](crate::ScanOptions)) and
    /// pushes `(value, negative)` onto the integer register.
    ///
    /// The accumulation stops before a digit that would overflow `i64`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket,
    /// [`ErrorKind::RegisterOverflow`] on over-deep nesting.
    pub fn scan_integer(&mut self) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        let end = self.win.end;
        let mut i = cursor;
        let mut negative = false;
        if i < end && (self.content[i] == '-' || self.content[i] == '+') {
            negative = self.content[i] == '-';
            i += 1;
        }
        match self.digit_run(i, 10, self.opts.digit_group_separator) {
            Some((value, after)) => {
                let value = if negative { -value } else { value };
                self.scan
                    .registers
                    .push_int(value, negative)
                    .map_err(|kind| self.err(kind))?;
                Ok(self.commit(after))
            }
            // A bare sign is not a number; nothing is consumed.
            None => Ok(self.mismatch()),
        }
    }

    /// Matches a float: sign, integer digits, optional fraction after the
    /// configured decimal separator, optional exponent. A plain integer is
    /// accepted too; the value lands on the float register.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket,
    /// [`ErrorKind::RegisterOverflow`] on over-deep nesting.
    pub fn scan_float(&mut self) -> Result<&mut Self> {
        self.scan_float_inner(false)
    }

    /// Like [`scan_float`](Self::scan_float), but a value with neither
    /// fraction nor exponent does not match.
    ///
    /// # Errors
    ///
    /// Same as [`scan_float`](Self::scan_float).
    pub fn scan_float_strict(&mut self) -> Result<&mut Self> {
        self.scan_float_inner(true)
    }

    fn scan_float_inner(&mut self, strict: bool) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        let end = self.win.end;
        let mut i = cursor;
        let mut num = String::new();
        if i < end && (self.content[i] == '-' || self.content[i] == '+') {
            if self.content[i] == '-' {
                num.push('-');
            }
            i += 1;
        }
        let int_from = i;
        let sep = self.opts.digit_group_separator;
        while i < end {
            let c = self.content[i];
            if c.is_ascii_digit() {
                num.push(c);
                i += 1;
            } else if sep == Some(c)
                && i > int_from
                && i + 1 < end
                && self.content[i + 1].is_ascii_digit()
            {
                i += 1;
            } else {
                break;
            }
        }
        if i == int_from {
            return Ok(self.mismatch());
        }
        let mut fractional = false;
        if i + 1 < end
            && self.content[i] == self.opts.decimal_separator
            && self.content[i + 1].is_ascii_digit()
        {
            num.push('.');
            i += 1;
            while i < end && self.content[i].is_ascii_digit() {
                num.push(self.content[i]);
                i += 1;
            }
            fractional = true;
        }
        let mut exponent = false;
        if i < end && (self.content[i] == 'e' || self.content[i] == 'E') {
            let mut j = i + 1;
            let mut exp = String::from("e");
            if j < end && (self.content[j] == '-' || self.content[j] == '+') {
                exp.push(self.content[j]);
                j += 1;
            }
            let digits_from = j;
            while j < end && self.content[j].is_ascii_digit() {
                exp.push(self.content[j]);
                j += 1;
            }
            // `e` without digits belongs to whatever follows the number.
            if j > digits_from {
                num.push_str(&exp);
                i = j;
                exponent = true;
            }
        }
        if strict && !fractional && !exponent {
            return Ok(self.mismatch());
        }
        match num.parse::<f64>() {
            Ok(value) => {
                self.scan
                    .registers
                    .push_float(value)
                    .map_err(|kind| self.err(kind))?;
                Ok(self.commit(i))
            }
            Err(_) => Ok(self.mismatch()),
        }
    }

    /// Matches a quoted literal: `open`, then the first non-escaped
    /// `close`. The inner span (delimiters excluded) is pushed onto the
    /// string register. An unterminated literal does not match.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket,
    /// [`ErrorKind::RegisterOverflow`] on over-deep nesting.
    pub fn scan_quoted(
        &mut self,
        open: char,
        close: char,
        escape: Option<char>,
    ) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        if cursor >= self.win.end || self.content[cursor] != open {
            return Ok(self.mismatch());
        }
        let mut tmp = [0u8; 4];
        let set: &str = close.encode_utf8(&mut tmp);
        match search::index_of_any_char(&self.content, cursor + 1, self.win.end, set, escape, None)
        {
            Some(at) => {
                let part = Part::new(cursor + 1, at, self.win.abs_pos0);
                self.scan
                    .registers
                    .push_string(part)
                    .map_err(|kind| self.err(kind))?;
                Ok(self.commit(at + 1))
            }
            None => Ok(self.mismatch()),
        }
    }

    /// Advances to the first char of `set` found outside escapes/quotes and
    /// pushes the span before it onto the string register; `begin` lands on
    /// the terminator. No terminator in the current part: no match.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket,
    /// [`ErrorKind::RegisterOverflow`] on over-deep nesting.
    pub fn scan_to_any_char(
        &mut self,
        set: &str,
        escape: Option<char>,
        quotes: Option<(char, char)>,
    ) -> Result<&mut Self> {
        let Some(cursor) = self.scan_entry()? else {
            return Ok(self);
        };
        match search::index_of_any_char(&self.content, cursor, self.win.end, set, escape, quotes) {
            Some(at) => {
                let part = Part::new(cursor, at, self.win.abs_pos0);
                self.scan
                    .registers
                    .push_string(part)
                    .map_err(|kind| self.err(kind))?;
                Ok(self.commit(at))
            }
            None => Ok(self.mismatch()),
        }
    }

    /// Skips whitespace and comments unconditionally (regardless of
    /// [`ScanOptions::skip_whitespace`](crate::ScanOptions)). Always
    /// matches.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotScanning`] outside a bracket.
    pub fn scan_skip_space(&mut self) -> Result<&mut Self> {
        if !self.scan.scanning {
            return Err(self.err(ErrorKind::NotScanning));
        }
        if self.scan.no_match {
            return Ok(self);
        }
        let cursor = self.skip_ws_and_comments(self.win.begin);
        Ok(self.commit(cursor))
    }

    fn digit_run(&self, from: usize, radix: u32, sep: Option<char>) -> Option<(i64, usize)> {
        let end = self.win.end;
        let mut i = from;
        let mut value: i64 = 0;
        while i < end {
            let c = self.content[i];
            if let Some(d) = c.to_digit(radix) {
                match value
                    .checked_mul(i64::from(radix))
                    .and_then(|v| v.checked_add(i64::from(d)))
                {
                    Some(v) => {
                        value = v;
                        i += 1;
                    }
                    None => break,
                }
            } else if sep == Some(c) && i > from && i + 1 < end && self.content[i + 1].is_digit(radix)
            {
                i += 1;
            } else {
                break;
            }
        }
        (i > from).then_some((value, i))
    }

    // ----- register getters ------------------------------------------------

    /// Pops the last scanned integer as `(signed value, negative flag)`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::EmptyRegister`] when no integer result is pending.
    pub fn last_integer(&mut self) -> Result<(i64, bool)> {
        match self.scan.registers.pop_int() {
            Ok(v) => Ok(v),
            Err(kind) => Err(self.err(kind)),
        }
    }

    /// Pops the last scanned float.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::EmptyRegister`] when no float result is pending.
    pub fn last_float(&mut self) -> Result<f64> {
        match self.scan.registers.pop_float() {
            Ok(v) => Ok(v),
            Err(kind) => Err(self.err(kind)),
        }
    }

    /// Pops the last scanned substring as a [`Part`] view.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::EmptyRegister`] when no string result is pending.
    pub fn last_string(&mut self) -> Result<Part> {
        match self.scan.registers.pop_string() {
            Ok(v) => Ok(v),
            Err(kind) => Err(self.err(kind)),
        }
    }

    /// Pops the last scanned substring and materializes it.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::EmptyRegister`] when no string result is pending;
    /// [`ErrorKind::StalePart`] when a compaction invalidated it.
    pub fn get_last_scanned_string(&mut self) -> Result<String> {
        let part = self.last_string()?;
        self.part_str(&part)
    }
}
