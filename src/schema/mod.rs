mod cache;
mod description;
mod introspector;

pub use cache::{SchemaCache, SchemaLoad};
pub use description::{CatalogColumn, IdentifierStyle, SchemaDescription, TableColumns};
pub use introspector::{SchemaIntrospector, CATALOG_QUERY};
