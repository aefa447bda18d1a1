//! Built-in plugins shipped with the core.

pub mod help;

pub use help::{HelpBook, HelpEntry, HelpPlugin};
