//! Terminal front end for a panelsync control panel.
//!
//! Widgets are rendered as log lines; input comes from stdin, one command
//! per line:
//!
//! - `key=value` sets a variable (`btn1=true`, `speed=0.5`)
//! - `key` flips a toggle
//!
//! Everything else (the round trip, locking, rollback) is the controller's
//! job.

pub mod input;
pub mod terminal;

pub use input::{InputCommand, parse_line, read_inputs};
pub use terminal::TerminalUi;
