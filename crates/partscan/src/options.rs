/// Configuration for the scan-protocol layer of a [`Scanner`](crate::Scanner).
///
/// These options control what the `scan_*` primitives silently skip before
/// matching and how numbers are tokenized. The seek/lento window primitives
/// never consult them.
///
/// # Examples
///
/// ```rust
/// use partscan::ScanOptions;
///
/// let options = ScanOptions {
///     skip_whitespace: true,
///     line_comment: Some("//".into()),
///     ..ScanOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether every `scan_*` primitive skips whitespace (and comments, if
    /// configured) before attempting its match.
    ///
    /// Whitespace is space, tab, carriage return, line feed and form feed.
    ///
    /// # Default
    ///
    /// `true`
    pub skip_whitespace: bool,

    /// Start marker of a to-end-of-line comment, skipped like whitespace.
    ///
    /// Only honored while [`skip_whitespace`](Self::skip_whitespace) is
    /// enabled.
    ///
    /// # Default
    ///
    /// `None`
    pub line_comment: Option<String>,

    /// Start/end markers of a block comment, skipped like whitespace.
    ///
    /// An unterminated block comment extends to the end of the maximal part.
    /// Only honored while [`skip_whitespace`](Self::skip_whitespace) is
    /// enabled.
    ///
    /// # Default
    ///
    /// `None`
    pub block_comment: Option<(String, String)>,

    /// Group separator accepted between digits by `scan_integer` and the
    /// integer part of `scan_float`, e.g. `'` in `-12'345`.
    ///
    /// The separator never starts or ends the digit run and does not appear
    /// in the produced value.
    ///
    /// # Default
    ///
    /// `None`
    pub digit_group_separator: Option<char>,

    /// Separator between the integer and fractional part for `scan_float`.
    ///
    /// # Default
    ///
    /// `'.'`
    pub decimal_separator: char,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_whitespace: true,
            line_comment: None,
            block_comment: None,
            digit_group_separator: None,
            decimal_separator: '.',
        }
    }
}

impl ScanOptions {
    pub(crate) fn is_whitespace(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{c}')
    }
}
