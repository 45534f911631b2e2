use super::result_set::ResultSet;
use crate::error::Result;
use crate::schema::CatalogColumn;
use async_trait::async_trait;

/// The database seen by the pipeline.
///
/// Implementations acquire a connection per call and release it before
/// returning, on success and on error.
#[async_trait]
pub trait Database: Send + Sync {
    /// Runs the fixed catalog query for the `public` namespace.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogColumn>>;

    /// Runs caller-supplied SQL. Statements without a row set yield an
    /// empty `ResultSet`.
    async fn execute(&self, sql: &str) -> Result<ResultSet>;

    /// Connection target with credentials removed, for logs and banners.
    fn describe(&self) -> String;
}
