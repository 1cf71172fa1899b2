//! Exit code constants for CLI commands
//!
//! - 0: Success
//! - 1: The query matched nothing
//! - 2: Loading failed or the configuration is invalid

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Nothing found
pub const EXIT_WARNING: i32 = 1;

/// Load failure or invalid configuration
pub const EXIT_ERROR: i32 = 2;
