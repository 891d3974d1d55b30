//! Main application helpers.
//!
//! This module provides Ctrl-C handling and end-of-run statistics printing
//! used by the binary.

pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use shutdown::cancel_on_ctrl_c;
pub use statistics::print_run_summary;
