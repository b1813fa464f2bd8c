//! Filename portability guard.
//!
//! Non-ASCII or control bytes in staged paths break checkouts on
//! case-insensitive and non-UTF-8 filesystems, so the gate rejects them
//! before any checker touches those paths.

/// Outcome of the filename guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Every staged path is printable ASCII.
    Ok,
    /// At least one path carries a byte outside 0x20-0x7E.
    NonPortable {
        /// The offending path, lossily decoded for display.
        path: String,
    },
}

impl GuardVerdict {
    /// Returns true if the guard passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Checks every staged path for bytes outside the printable ASCII range.
///
/// Operates on the raw bytes git reports, not on decoded strings; a path
/// that is not valid UTF-8 must still be caught.
#[must_use]
pub fn check_portable_filenames(paths: &[Vec<u8>]) -> GuardVerdict {
    for path in paths {
        if !is_portable(path) {
            return GuardVerdict::NonPortable {
                path: String::from_utf8_lossy(path).into_owned(),
            };
        }
    }
    GuardVerdict::Ok
}

/// Returns true if every byte of the path is printable ASCII (0x20-0x7E).
#[must_use]
pub fn is_portable(path: &[u8]) -> bool {
    path.iter().all(|&b| (0x20..=0x7E).contains(&b))
}
