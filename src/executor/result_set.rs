use serde::Serialize;

/// Literal handed to the answer prompt when a query returned no rows.
pub const EMPTY_RESULT_MARKER: &str = "EMPTY";

const NULL_DISPLAY: &str = "None";

/// A single value as text; `None` is SQL NULL.
pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `row` under column `name`. `None` for a missing row or
    /// column and for NULL.
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Flat text for prompts: a header line and one line per row, every
    /// column right-aligned to its widest value and separated by two spaces.
    /// Returns [`EMPTY_RESULT_MARKER`] when there are no rows.
    pub fn to_prompt_text(&self) -> String {
        if self.is_empty() {
            return EMPTY_RESULT_MARKER.to_string();
        }

        let display: Vec<Vec<&str>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_deref().unwrap_or(NULL_DISPLAY))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                display
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_line = |values: Vec<&str>| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:>width$}", v, width = w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut lines = Vec::with_capacity(display.len() + 1);
        lines.push(format_line(self.columns.iter().map(|c| c.as_str()).collect()));
        for row in display {
            lines.push(format_line(row));
        }
        lines.join("\n")
    }
}

/// Accumulates rows from a statement stream. Each new row description
/// starts a fresh set, so after a multi-statement batch the builder holds
/// the last row-producing statement.
#[derive(Debug, Default)]
pub struct ResultSetBuilder {
    current: ResultSet,
}

impl ResultSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, columns: Vec<String>) {
        self.current = ResultSet {
            columns,
            rows: Vec::new(),
        };
    }

    pub fn has_columns(&self) -> bool {
        !self.current.columns.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.current.rows.push(row);
    }

    pub fn finish(self) -> ResultSet {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(v: &str) -> Cell {
        Some(v.to_string())
    }

    fn orders() -> ResultSet {
        ResultSet {
            columns: vec!["id".to_string(), "customer".to_string()],
            rows: vec![
                vec![cell("1"), cell("alice")],
                vec![cell("12"), None],
            ],
        }
    }

    #[test]
    fn test_empty_renders_marker() {
        assert_eq!(ResultSet::empty().to_prompt_text(), EMPTY_RESULT_MARKER);

        let no_rows = ResultSet {
            columns: vec!["id".to_string()],
            rows: vec![],
        };
        assert_eq!(no_rows.to_prompt_text(), "EMPTY");
    }

    #[test]
    fn test_prompt_text_is_right_aligned() {
        assert_eq!(
            orders().to_prompt_text(),
            "id  customer\n 1     alice\n12      None"
        );
    }

    #[test]
    fn test_get_by_column_name() {
        let rs = orders();
        assert_eq!(rs.get(0, "customer"), Some("alice"));
        assert_eq!(rs.get(1, "customer"), None);
        assert_eq!(rs.get(1, "id"), Some("12"));
        assert_eq!(rs.get(5, "id"), None);
        assert_eq!(rs.get(0, "missing"), None);
    }

    #[test]
    fn test_builder_keeps_last_row_set() {
        let mut builder = ResultSetBuilder::new();
        builder.begin(vec!["a".to_string()]);
        builder.push_row(vec![cell("1")]);
        builder.begin(vec!["b".to_string(), "c".to_string()]);
        builder.push_row(vec![cell("2"), cell("3")]);

        let rs = builder.finish();
        assert_eq!(rs.columns, vec!["b", "c"]);
        assert_eq!(rs.rows, vec![vec![cell("2"), cell("3")]]);
    }

    #[test]
    fn test_builder_without_rows_is_empty() {
        let rs = ResultSetBuilder::new().finish();
        assert!(rs.is_empty());
        assert!(rs.columns.is_empty());
    }
}
