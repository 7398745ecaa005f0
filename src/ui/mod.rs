//! Terminal output

mod status_line;

pub use status_line::{format_status, StatusPrinter};
