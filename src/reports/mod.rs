//! Renderings of aggregated repository metadata
//!
//! Two generators are provided:
//! - **Console**: human-readable terminal output, one block per section, with truecolor
//!   language swatches and relative ages
//! - **JSON**: the aggregate serialized as pretty-printed JSON for programmatic use
//!
//! The console generator renders one section at a time, which lets callers print each section
//! as soon as it settles instead of waiting for the whole load.

mod console;
mod json;

pub use console::{generate_header as generate_console_header, generate_section as generate_console_section};
pub use json::generate as generate_json;
