use super::description::SchemaDescription;
use super::introspector::SchemaIntrospector;
use crate::error::SqlChatError;
use crate::executor::Database;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome of a cache lookup. `error` is set only on the lookup that
/// actually read the catalog and failed; the degraded (empty) description
/// is cached like a successful one.
#[derive(Debug)]
pub struct SchemaLoad {
    pub schema: Arc<SchemaDescription>,
    pub error: Option<SqlChatError>,
}

/// Single-entry schema cache. Lives as long as the pipeline; `refresh`
/// is the only invalidation.
pub struct SchemaCache {
    introspector: SchemaIntrospector,
    slot: Mutex<Option<Arc<SchemaDescription>>>,
}

impl SchemaCache {
    pub fn new(introspector: SchemaIntrospector) -> Self {
        Self {
            introspector,
            slot: Mutex::new(None),
        }
    }

    pub async fn get(&self, db: &dyn Database) -> SchemaLoad {
        let mut slot = self.slot.lock().await;
        if let Some(schema) = slot.as_ref() {
            return SchemaLoad {
                schema: Arc::clone(schema),
                error: None,
            };
        }

        let (schema, error) = match self.introspector.introspect(db).await {
            Ok(schema) => (Arc::new(schema), None),
            Err(e) => {
                warn!("reading schema failed, continuing with an empty schema: {}", e);
                (Arc::new(SchemaDescription::default()), Some(e))
            }
        };
        *slot = Some(Arc::clone(&schema));
        SchemaLoad { schema, error }
    }

    pub async fn refresh(&self) {
        self.slot.lock().await.take();
        info!("schema cache cleared");
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
