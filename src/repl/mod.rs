mod commands;
mod interactive;
mod render;

pub use commands::{ReplCommand, ReplResult, HELP_TEXT};
pub use interactive::InteractiveRepl;
pub use render::{render_schema, render_table, render_turn, write_turn, OutputFormat};
