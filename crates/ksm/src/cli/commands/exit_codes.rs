//! Exit code constants for CLI commands.

/// The operation succeeded.
pub const EXIT_SUCCESS: i32 = 0;

/// The service answered with `success = false`.
///
/// The structured failure is still printed on stdout.
pub const EXIT_FAILURE: i32 = 1;

/// Fatal error before a request could be served (configuration, logging,
/// storage initialization, unreadable input).
pub const EXIT_ERROR: i32 = 2;
