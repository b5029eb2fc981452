//! A cursor-based text scanning engine.
//!
//! Two working modes over one cursor contract:
//!
//! - **In-memory**: wrap a text and shift a logical window (`begin`/`end`)
//!   over it with the seek/lento operation families — no substring is
//!   copied until a [`Part`] view is materialized.
//! - **Streaming**: scan an effectively unbounded reader through a
//!   fixed-capacity buffer that is refilled and periodically compacted.
//!   Logical positions and [`Part`] views survive compaction as long as
//!   they stay inside the retained window; stale views fail loudly instead
//!   of reading shifted data.
//!
//! On top of the window sits a checkpoint/rollback scan protocol
//! (`scan_start()` … `scan_ok()`) with typed result registers, making a
//! chain of `scan_*` attempts all-or-nothing:
//!
//! ```rust
//! use partscan::Scanner;
//!
//! let mut s = Scanner::from_str("offset = -12'345 ;");
//! let mut opts = partscan::ScanOptions::default();
//! opts.digit_group_separator = Some('\'');
//! s.set_options(opts);
//!
//! s.scan_start();
//! let ok = s
//!     .scan_identifier()?
//!     .scan_literal_str("=")?
//!     .scan_integer()?
//!     .scan_literal_str(";")?
//!     .scan_ok();
//! assert!(ok);
//! assert_eq!(s.last_integer()?, (-12345, true));
//! assert_eq!(s.get_last_scanned_string()?, "offset");
//! # Ok::<(), partscan::ScanError>(())
//! ```
//!
//! "Not present" is a soft outcome ([`Scanner::found`] / `scan_ok()`), never
//! an error; [`ScanError`] is reserved for contract violations, stale
//! views, malformed encoding declarations and I/O failures.

#![allow(missing_docs)]

mod error;
mod line_index;
mod options;
mod part;
mod scanner;
mod search;
mod stream;
mod window;

pub use encoding_rs::Encoding;
pub use error::{ErrorKind, Result, ScanError};
pub use options::ScanOptions;
pub use part::Part;
pub use scanner::{Scanner, Seek, SeekDir, SeekLand};
