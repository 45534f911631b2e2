use super::commands::{ReplCommand, ReplResult, HELP_TEXT};
use super::render::{render_schema, write_turn, OutputFormat};
use crate::error::Result;
use crate::pipeline::ChatPipeline;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

const PROMPT: &str = "sqlchat> ";
const HISTORY_FILE: &str = ".sqlchat_history";

pub struct InteractiveRepl {
    pipeline: ChatPipeline,
    format: OutputFormat,
    history_path: Option<PathBuf>,
}

impl InteractiveRepl {
    pub fn new(pipeline: ChatPipeline) -> Self {
        Self {
            pipeline,
            format: OutputFormat::Text,
            history_path: dirs::home_dir().map(|h| h.join(HISTORY_FILE)),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    pub async fn execute(&self, command: ReplCommand, out: &mut impl Write) -> Result<ReplResult> {
        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => return Ok(ReplResult::Exit),
            ReplCommand::Help => writeln!(out, "{}", HELP_TEXT)?,
            ReplCommand::Unknown(name) => writeln!(
                out,
                "{}",
                format!("Unknown command ':{}'. Type :help for help.", name).yellow()
            )?,
            ReplCommand::Schema => {
                let load = self.pipeline.schema().await;
                if let Some(e) = &load.error {
                    writeln!(out, "{}", format!("ERROR reading schema: {}", e).red())?;
                }
                writeln!(out, "{}", render_schema(&load.schema))?;
            }
            ReplCommand::Refresh => {
                self.pipeline.refresh_schema().await;
                let load = self.pipeline.schema().await;
                match &load.error {
                    Some(e) => writeln!(out, "{}", format!("ERROR reading schema: {}", e).red())?,
                    None => writeln!(
                        out,
                        "Schema reloaded: {} tables, {} columns.",
                        load.schema.tables().len(),
                        load.schema.column_count()
                    )?,
                }
            }
            ReplCommand::Ask(question) => {
                let turn = self.pipeline.ask(&question).await;
                write_turn(out, &turn, self.format)?;
            }
        }
        Ok(ReplResult::Continue)
    }

    /// Line editor on a terminal, one question per line otherwise.
    pub async fn run(&self) -> Result<()> {
        if atty::is(atty::Stream::Stdin) {
            self.run_interactive().await
        } else {
            self.run_piped().await
        }
    }

    async fn run_interactive(&self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &self.history_path {
            if editor.load_history(path).is_err() {
                debug!("no history at {}", path.display());
            }
        }

        println!(
            "Connected to {}. Type :help for help, :quit to exit.",
            self.pipeline.database().describe()
        );

        let mut stdout = std::io::stdout();
        loop {
            let line = tokio::task::block_in_place(|| editor.readline(PROMPT));
            match line {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str())?;
                    }
                    let command = ReplCommand::parse(&line);
                    if self.execute(command, &mut stdout).await? == ReplResult::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(path) = &self.history_path {
            if let Err(e) = editor.save_history(path) {
                warn!("could not save history to {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    async fn run_piped(&self) -> Result<()> {
        let stdin = std::io::BufReader::new(std::io::stdin());
        self.run_lines(stdin, &mut std::io::stdout()).await
    }

    /// One command per input line, each answered before the next is read.
    pub async fn run_lines<R: BufRead>(&self, mut input: R, out: &mut impl Write) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            if self.execute(ReplCommand::parse(&line), out).await? == ReplResult::Exit {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CatalogColumn;
    use crate::testing::{FakeDatabase, ScriptedLlm};
    use std::sync::Arc;

    fn repl(llm: ScriptedLlm) -> (InteractiveRepl, Arc<FakeDatabase>) {
        colored::control::set_override(false);
        let db = Arc::new(FakeDatabase::new(vec![
            CatalogColumn::new("orders", "id"),
            CatalogColumn::new("orders", "amount"),
        ]));
        let pipeline = ChatPipeline::new(db.clone(), Arc::new(llm));
        (
            InteractiveRepl::new(pipeline).with_history_path(None),
            db,
        )
    }

    async fn run(repl: &InteractiveRepl, line: &str) -> (ReplResult, String) {
        let mut out = Vec::new();
        let result = repl.execute(ReplCommand::parse(line), &mut out).await.unwrap();
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_question_prints_sql_and_answer() {
        let (repl, _) = repl(ScriptedLlm::new(["SELECT 1", "There is one order."]));
        let (result, out) = run(&repl, "how many orders").await;

        assert_eq!(result, ReplResult::Continue);
        assert!(out.contains("Generated SQL\nSELECT 1"));
        assert!(out.contains("Query Result"));
        assert!(out.contains("Answer\nThere is one order."));
    }

    #[tokio::test]
    async fn test_rejected_question_prints_error_inline() {
        let (repl, _) = repl(ScriptedLlm::new(Vec::<String>::new()));
        let (result, out) = run(&repl, "what is the weather today").await;

        assert_eq!(result, ReplResult::Continue);
        assert!(out.contains("not relevant to your database"));
        assert!(!out.contains("Generated SQL"));
    }

    #[tokio::test]
    async fn test_schema_and_refresh() {
        let (repl, db) = repl(ScriptedLlm::new(Vec::<String>::new()));

        let (_, out) = run(&repl, ":schema").await;
        assert!(out.contains("Table: orders"));
        assert!(out.contains("Columns: id, amount"));

        let (_, out) = run(&repl, ":refresh").await;
        assert!(out.contains("Schema reloaded: 1 tables, 2 columns."));
        assert_eq!(db.catalog_calls(), 2);
    }

    #[tokio::test]
    async fn test_quit_and_unknown() {
        let (repl, _) = repl(ScriptedLlm::new(Vec::<String>::new()));
        assert_eq!(run(&repl, ":quit").await.0, ReplResult::Exit);

        let (result, out) = run(&repl, ":frobnicate").await;
        assert_eq!(result, ReplResult::Continue);
        assert!(out.contains("Unknown command ':frobnicate'"));
    }

    #[tokio::test]
    async fn test_run_lines_answers_each_line_and_stops_reading_at_quit() {
        let (repl, db) = repl(ScriptedLlm::new(["SELECT 1", "There is one order."]));
        let script = "how many orders\n\n:quit\nhow many orders\n";
        let mut input = std::io::Cursor::new(script);
        let mut out = Vec::new();

        repl.run_lines(&mut input, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Answer\nThere is one order."));
        assert_eq!(db.executed(), vec!["SELECT 1".to_string()]);
        assert_eq!(input.position() as usize, "how many orders\n\n:quit\n".len());
    }
}
