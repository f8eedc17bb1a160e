//! CLI Exit Code Registry
//!
//! Single source of truth for `colcheck` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success: every column is clear or was accepted           |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, missing file)                     |
//! | 3    | Unexpected values remain                                 |
//! | 4    | Session reverted by undo                                 |
//! | 5    | Wizard file invalid                                      |
//! | 6    | I/O error reading or writing a table                     |
//! | 10   | Host failure (unreachable, HTTP error, command rejected) |

use colcheck_core::HostError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Verification (3-9)
// =============================================================================

/// `--check` found a column needing attention, `classify` returned a failing
/// verdict, or input ended before the correction session finished.
pub const EXIT_UNEXPECTED_VALUES: u8 = 3;

/// The user chose undo; the host is back at the wizard's checkpoint.
pub const EXIT_REVERTED: u8 = 4;

/// Wizard file could not be read or is malformed.
pub const EXIT_WIZARD_FILE: u8 = 5;

/// Table could not be read or written.
pub const EXIT_IO: u8 = 6;

// =============================================================================
// Host (10-19)
// =============================================================================

/// Host unreachable, HTTP error, or a command the host rejected.
pub const EXIT_HOST: u8 = 10;

/// Hint printed under a host failure.
pub fn host_hint(err: &HostError, host_url: Option<&str>) -> Option<String> {
    match err {
        HostError::Network(_) => host_url.map(|url| format!("is the host running at {}?", url)),
        HostError::Http(404, _) => Some("check the project id".to_string()),
        HostError::UnknownColumn(_) => Some("check the column names in the wizard file".to_string()),
        HostError::Expression(_) => Some("check the column's expression".to_string()),
        _ => None,
    }
}
