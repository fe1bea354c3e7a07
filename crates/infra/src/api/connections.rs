//! Shared connections and connectivity checks

use std::sync::Arc;

use ekuiper_domain::standard::{self, JsonObject};
use ekuiper_domain::Result;
use serde_json::Value;
use tracing::instrument;

use super::dispatcher::Dispatcher;

/// Connection operations
#[derive(Debug, Clone)]
pub struct ConnectionsApi {
    dispatcher: Arc<Dispatcher>,
}

impl ConnectionsApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[instrument(skip(self, connection))]
    pub async fn create(&self, connection: &Value) -> Result<String> {
        self.dispatcher.invoke(&standard::CREATE_CONNECTION, Some(connection), &[], &[]).await
    }

    #[instrument(skip(self, connection))]
    pub async fn update(&self, id: &str, connection: &Value) -> Result<String> {
        self.dispatcher.invoke(&standard::UPDATE_CONNECTION, Some(connection), &[], &[id]).await
    }

    pub async fn list(&self) -> Result<Vec<JsonObject>> {
        self.dispatcher.invoke(&standard::LIST_CONNECTIONS, None, &[], &[]).await
    }

    pub async fn info(&self, id: &str) -> Result<JsonObject> {
        self.dispatcher.invoke(&standard::GET_CONNECTION_INFO, None, &[], &[id]).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::DELETE_CONNECTION, None, &[], &[id]).await
    }

    /// Test connectivity of a sink of type `sink_type` with `props`.
    pub async fn check_sink(&self, sink_type: &str, props: &JsonObject) -> Result<String> {
        self.dispatcher.invoke(&standard::SINK_CONNECTION_CHECK, Some(props), &[], &[sink_type]).await
    }

    /// Test connectivity of a source of type `source_type` with `props`.
    pub async fn check_source(&self, source_type: &str, props: &JsonObject) -> Result<String> {
        self.dispatcher
            .invoke(&standard::SOURCE_CONNECTION_CHECK, Some(props), &[], &[source_type])
            .await
    }

    pub async fn check_mqtt_source(&self, props: &JsonObject) -> Result<()> {
        self.dispatcher.invoke(&standard::MQTT_SOURCE_CONNECTION_CHECK, Some(props), &[], &[]).await
    }
}
