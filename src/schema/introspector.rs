use super::description::{IdentifierStyle, SchemaDescription};
use crate::error::Result;
use crate::executor::Database;
use tracing::info;

pub const CATALOG_QUERY: &str = "SELECT table_name, column_name \
FROM information_schema.columns \
WHERE table_schema = 'public' \
ORDER BY table_name, ordinal_position;";

pub struct SchemaIntrospector {
    style: IdentifierStyle,
}

impl SchemaIntrospector {
    pub fn new(style: IdentifierStyle) -> Self {
        Self { style }
    }

    pub async fn introspect(&self, db: &dyn Database) -> Result<SchemaDescription> {
        let rows = db.fetch_catalog().await?;
        let schema = SchemaDescription::from_catalog(rows).with_style(self.style);
        info!(
            tables = schema.tables().len(),
            columns = schema.column_count(),
            "schema introspected"
        );
        Ok(schema)
    }
}

impl Default for SchemaIntrospector {
    fn default() -> Self {
        Self::new(IdentifierStyle::default())
    }
}
