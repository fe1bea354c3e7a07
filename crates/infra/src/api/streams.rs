//! Stream and table management

use std::sync::Arc;

use ekuiper_domain::{standard, Result, StreamDefinition};
use serde_json::Value;
use tracing::instrument;

use super::dispatcher::Dispatcher;

/// Stream operations
#[derive(Debug, Clone)]
pub struct StreamsApi {
    dispatcher: Arc<Dispatcher>,
}

impl StreamsApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Create a stream from a `CREATE STREAM` statement.
    ///
    /// Returns the engine's confirmation message.
    #[instrument(skip(self, sql))]
    pub async fn create(&self, sql: &str) -> Result<String> {
        let body = StreamDefinition::new(sql);
        self.dispatcher.invoke(&standard::CREATE_STREAM, Some(&body), &[], &[]).await
    }

    /// Names of all streams.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.dispatcher.invoke(&standard::LIST_STREAMS, None, &[], &[]).await
    }

    pub async fn describe(&self, name: &str) -> Result<Value> {
        self.dispatcher.invoke(&standard::GET_STREAM_DETAILS, None, &[], &[name]).await
    }

    pub async fn schema(&self, name: &str) -> Result<Value> {
        self.dispatcher.invoke(&standard::GET_STREAM_SCHEMA, None, &[], &[name]).await
    }

    /// Replace the definition of `name` with `sql`.
    #[instrument(skip(self, sql))]
    pub async fn update(&self, name: &str, sql: &str) -> Result<String> {
        let body = StreamDefinition::new(sql);
        self.dispatcher.invoke(&standard::UPDATE_STREAM, Some(&body), &[], &[name]).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::DELETE_STREAM, None, &[], &[name]).await
    }
}
