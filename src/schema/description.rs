use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the `information_schema.columns` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub table_name: String,
    pub column_name: String,
}

impl CatalogColumn {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumns {
    pub name: String,
    pub columns: Vec<String>,
}

/// How identifiers are written into the prompt text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierStyle {
    /// `"orders"`; tells the model the names are case-sensitive.
    #[default]
    Quoted,
    Plain,
}

impl IdentifierStyle {
    fn write(&self, ident: &str) -> String {
        match self {
            IdentifierStyle::Quoted => format!("\"{}\"", ident),
            IdentifierStyle::Plain => ident.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDescription {
    tables: Vec<TableColumns>,
    #[serde(skip)]
    style: IdentifierStyle,
}

impl SchemaDescription {
    /// Groups consecutive catalog rows by table name. Rows are expected in
    /// `ORDER BY table_name, ordinal_position` order; a table name that
    /// reappears after another table starts a new entry.
    pub fn from_catalog(rows: impl IntoIterator<Item = CatalogColumn>) -> Self {
        let mut tables: Vec<TableColumns> = Vec::new();
        for row in rows {
            match tables.last_mut() {
                Some(current) if current.name == row.table_name => {
                    current.columns.push(row.column_name)
                }
                _ => tables.push(TableColumns {
                    name: row.table_name,
                    columns: vec![row.column_name],
                }),
            }
        }
        Self {
            tables,
            style: IdentifierStyle::default(),
        }
    }

    pub fn with_style(mut self, style: IdentifierStyle) -> Self {
        self.style = style;
        self
    }

    pub fn tables(&self) -> &[TableColumns] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableColumns> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Every table and column name, in catalog order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().flat_map(|t| {
            std::iter::once(t.name.as_str()).chain(t.columns.iter().map(|c| c.as_str()))
        })
    }

    /// The prompt block: `\nTable: <t>\nColumns: <c1>, <c2>` per table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            let columns: Vec<String> = table.columns.iter().map(|c| self.style.write(c)).collect();
            out.push_str(&format!(
                "\nTable: {}\nColumns: {}",
                self.style.write(&table.name),
                columns.join(", ")
            ));
        }
        out
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
