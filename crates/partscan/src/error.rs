use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, ScanError>;

/// A hard scanning error, annotated with the line/column of `begin` at the
/// time it was raised.
///
/// "Not found" outcomes are never errors; they are reported through
/// [`Scanner::found`](crate::Scanner::found) or `scan_ok()`. `ScanError`
/// covers contract violations, malformed input and I/O failures only.
#[derive(Error, Debug)]
#[error("{kind} at {line}:{column}")]
pub struct ScanError {
    pub(crate) kind: ErrorKind,
    /// 1-based line of the scan position when the error was raised.
    pub line: usize,
    /// 1-based column of the scan position when the error was raised.
    pub column: usize,
}

impl ScanError {
    /// The classified cause.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl PartialEq for ScanError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.line == other.line && self.column == other.column
    }
}

/// Classified causes for [`ScanError`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A [`Part`](crate::Part) was resolved after the buffer had been
    /// compacted past its start.
    #[error("stale part: view starts {missing} chars before the retained window")]
    StalePart {
        /// Chars by which the view start precedes the retained window.
        missing: usize,
    },
    /// A typed register getter was called with no matching scan result
    /// pending.
    #[error("no scanned {0} result pending")]
    EmptyRegister(&'static str),
    /// More scan results were produced inside one bracket than the fixed
    /// register depth can hold.
    #[error("scan nesting deeper than {0} results")]
    RegisterOverflow(usize),
    /// `scan_*`/`scan_ok` called without an open `scan_start` bracket.
    #[error("scan operation outside a scan_start()..scan_ok() bracket")]
    NotScanning,
    /// An in-text encoding declaration named a charset the decoder does not
    /// know.
    #[error("unknown charset {0:?} in encoding declaration")]
    UnknownCharset(String),
    /// The encoding declaration marker was present but not followed by a
    /// parsable charset name.
    #[error("malformed encoding declaration after marker {0:?}")]
    MalformedEncodingDecl(String),
    /// Construction range outside the supplied sequence.
    #[error("range {start}..{end} outside sequence of length {len}")]
    RangeOutOfBounds {
        /// Requested start index.
        start: usize,
        /// Requested end index.
        end: usize,
        /// Sequence length.
        len: usize,
    },
    /// The underlying reader failed during a refill.
    #[error("read from {source_name:?} failed: {source}")]
    Io {
        /// Name of the stream source, as passed at construction.
        source_name: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        use ErrorKind::{
            EmptyRegister, Io, MalformedEncodingDecl, NotScanning, RangeOutOfBounds,
            RegisterOverflow, StalePart, UnknownCharset,
        };
        match (self, other) {
            (StalePart { missing: a }, StalePart { missing: b }) => a == b,
            (EmptyRegister(a), EmptyRegister(b)) => a == b,
            (RegisterOverflow(a), RegisterOverflow(b)) => a == b,
            (NotScanning, NotScanning) => true,
            (UnknownCharset(a), UnknownCharset(b))
            | (MalformedEncodingDecl(a), MalformedEncodingDecl(b)) => a == b,
            (
                RangeOutOfBounds {
                    start: a,
                    end: b,
                    len: c,
                },
                RangeOutOfBounds {
                    start: d,
                    end: e,
                    len: f,
                },
            ) => (a, b, c) == (d, e, f),
            (Io { source_name: a, .. }, Io { source_name: b, .. }) => a == b,
            _ => false,
        }
    }
}
