use crate::error::Result;
use crate::executor::ResultSet;
use crate::pipeline::ChatTurn;
use crate::schema::SchemaDescription;
use colored::Colorize;
use std::io::Write;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const NULL_DISPLAY: &str = "NULL";

pub fn render_table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "(no rows)".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().cloned());
    for row in &result.rows {
        builder.push_record(
            row.iter()
                .map(|cell| cell.clone().unwrap_or_else(|| NULL_DISPLAY.to_string())),
        );
    }
    let mut table = builder.build();
    table.with(Style::rounded());

    let noun = if result.row_count() == 1 { "row" } else { "rows" };
    format!("{}\n({} {})", table, result.row_count(), noun)
}

pub fn render_schema(schema: &SchemaDescription) -> String {
    if schema.is_empty() {
        return "No tables found in the public schema.".to_string();
    }
    let mut out = Vec::new();
    for table in schema.tables() {
        out.push(format!(
            "{} {}\n{} {}",
            "Table:".bold(),
            table.name,
            "Columns:".bold(),
            table.columns.join(", ")
        ));
    }
    out.join("\n\n")
}

/// Text view of a turn: SQL, result table, answer, then any errors,
/// each section only when the turn got that far.
pub fn render_turn(turn: &ChatTurn) -> String {
    let mut sections = Vec::new();

    for notice in &turn.notices {
        sections.push(notice.to_string().yellow().to_string());
    }

    if let Some(sql) = &turn.sql {
        sections.push(format!("{}\n{}", "Generated SQL".bold().cyan(), sql));
    }

    if let Some(result) = &turn.result {
        sections.push(format!("{}\n{}", "Query Result".bold().cyan(), render_table(result)));
    }

    if let Some(answer) = &turn.answer {
        sections.push(format!("{}\n{}", "Answer".bold().green(), answer));
    }

    if let Some(failure) = &turn.failure {
        sections.push(failure.to_string().red().to_string());
    }

    sections.join("\n\n")
}

pub fn write_turn(out: &mut impl Write, turn: &ChatTurn, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", render_turn(turn))?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(turn)?)?,
    }
    Ok(())
}
