pub const HELP_TEXT: &str = "\
Type a question about your database and press Enter.

Commands:
  :schema     Show the tables and columns the model sees
  :refresh    Re-read the schema from the database
  :help       Show this help
  :quit       Exit (also :exit, Ctrl-D)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Schema,
    Refresh,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplResult {
    Continue,
    Exit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }

        let Some(command) = line.strip_prefix(':') else {
            return ReplCommand::Ask(line.to_string());
        };

        match command.trim().to_lowercase().as_str() {
            "schema" => ReplCommand::Schema,
            "refresh" => ReplCommand::Refresh,
            "help" | "h" | "?" => ReplCommand::Help,
            "quit" | "q" | "exit" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}
