//! User interface module - console output for unattended runs.
//!
//! Diagnostics go through `tracing`; this module only prints what the person
//! reading a CI log needs: what was created, what moved, what was skipped.

pub mod formatter;

pub use formatter::{
    display_error, display_report, display_status, display_success, display_warning,
    format_alias_line,
};
