use super::database::Database;
use super::result_set::{Cell, ResultSet, ResultSetBuilder};
use crate::error::{Result, SqlChatError};
use crate::schema::{CatalogColumn, CATALOG_QUERY};
use async_trait::async_trait;
use std::str::FromStr;
use tokio_postgres::config::Host;
use tokio_postgres::{Client, Config, NoTls, SimpleQueryMessage};
use tracing::{debug, warn};

/// PostgreSQL behind a parsed connection config. Every call opens its own
/// connection; nothing is pooled.
pub struct PgDatabase {
    config: Config,
}

/// A connection with its driver task. Dropping the client ends the driver.
struct ScopedConnection {
    client: Client,
    driver: tokio::task::JoinHandle<()>,
}

impl ScopedConnection {
    async fn close(self) {
        drop(self.client);
        if let Err(e) = self.driver.await {
            warn!("postgres driver task did not shut down cleanly: {}", e);
        }
    }
}

impl PgDatabase {
    pub fn from_url(url: &str) -> Result<Self> {
        let config = Config::from_str(url)
            .map_err(|e| SqlChatError::Config(format!("invalid database url: {}", e)))?;
        Ok(Self { config })
    }

    async fn connect(&self) -> Result<ScopedConnection> {
        let (client, connection) = self
            .config
            .connect(NoTls)
            .await
            .map_err(|e| SqlChatError::Connection(e.to_string()))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection closed with error: {}", e);
            }
        });

        Ok(ScopedConnection { client, driver })
    }

    async fn simple_query(&self, sql: &str) -> Result<Vec<SimpleQueryMessage>> {
        let conn = self.connect().await?;
        let outcome = conn.client.simple_query(sql).await;
        conn.close().await;
        Ok(outcome?)
    }
}

/// What one simple-query message contributes to a result set.
#[derive(Debug)]
enum QueryEvent {
    Columns(Vec<String>),
    Row(Vec<Cell>),
    Complete(u64),
}

fn to_events(messages: Vec<SimpleQueryMessage>) -> Vec<QueryEvent> {
    let mut events = Vec::with_capacity(messages.len());
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                events.push(QueryEvent::Columns(
                    columns.iter().map(|c| c.name().to_string()).collect(),
                ));
            }
            SimpleQueryMessage::Row(row) => {
                if !matches!(events.last(), Some(QueryEvent::Columns(_) | QueryEvent::Row(_))) {
                    events.push(QueryEvent::Columns(
                        row.columns().iter().map(|c| c.name().to_string()).collect(),
                    ));
                }
                events.push(QueryEvent::Row(
                    (0..row.len()).map(|i| row.get(i).map(str::to_string)).collect(),
                ));
            }
            SimpleQueryMessage::CommandComplete(affected) => {
                events.push(QueryEvent::Complete(affected));
            }
            _ => {}
        }
    }
    events
}

/// Keeps the rows of the last statement that described a row set.
fn fold_events(events: impl IntoIterator<Item = QueryEvent>) -> ResultSet {
    let mut builder = ResultSetBuilder::new();
    for event in events {
        match event {
            QueryEvent::Columns(columns) => builder.begin(columns),
            QueryEvent::Row(row) => builder.push_row(row),
            QueryEvent::Complete(affected) => debug!(affected, "statement complete"),
        }
    }
    builder.finish()
}

fn collect_result_set(messages: Vec<SimpleQueryMessage>) -> ResultSet {
    fold_events(to_events(messages))
}

#[async_trait]
impl Database for PgDatabase {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogColumn>> {
        let messages = self
            .simple_query(CATALOG_QUERY)
            .await
            .map_err(|e| SqlChatError::Schema(e.to_string()))?;

        let columns = messages
            .into_iter()
            .filter_map(|m| match m {
                SimpleQueryMessage::Row(row) => match (row.get(0), row.get(1)) {
                    (Some(table), Some(column)) => Some(CatalogColumn::new(table, column)),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        Ok(columns)
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        let messages = self.simple_query(sql).await?;
        let result = collect_result_set(messages);
        debug!(
            rows = result.row_count(),
            columns = result.columns.len(),
            "query materialised"
        );
        Ok(result)
    }

    fn describe(&self) -> String {
        let host = self
            .config
            .get_hosts()
            .first()
            .map(|h| match h {
                Host::Tcp(name) => name.clone(),
                #[cfg(unix)]
                Host::Unix(path) => path.display().to_string(),
            })
            .unwrap_or_else(|| "localhost".to_string());
        let port = self.config.get_ports().first().copied().unwrap_or(5432);
        let user = self.config.get_user().unwrap_or("postgres");
        let db = self.config.get_dbname().unwrap_or(user);
        format!("postgresql://{}@{}:{}/{}", user, host, port, db)
    }
}
