//! MQTT source configuration keys

use std::sync::Arc;

use ekuiper_domain::standard::{self, JsonObject};
use ekuiper_domain::Result;
use serde_json::{Map, Value};
use tracing::instrument;

use super::dispatcher::Dispatcher;

/// Configuration-key operations for the MQTT source
#[derive(Debug, Clone)]
pub struct ConfigKeysApi {
    dispatcher: Arc<Dispatcher>,
}

impl ConfigKeysApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// All MQTT broker configurations, keyed by configuration name.
    pub async fn list_mqtt(&self) -> Result<Map<String, Value>> {
        self.dispatcher.invoke(&standard::CONF_LIST_MQTT_SOURCES, None, &[], &[]).await
    }

    /// Create or replace the broker configuration `name`.
    ///
    /// The engine expects the properties wrapped under the key name.
    #[instrument(skip(self, props))]
    pub async fn put_mqtt(&self, name: &str, props: &JsonObject) -> Result<()> {
        let mut body = JsonObject::new();
        body.insert(name.to_string(), Value::Object(props.clone()));
        self.dispatcher.invoke(&standard::CONF_CREATE_MQTT_BROKER, Some(&body), &[], &[name]).await
    }

    #[instrument(skip(self))]
    pub async fn delete_mqtt(&self, name: &str) -> Result<()> {
        self.dispatcher.invoke(&standard::CONF_DELETE_MQTT_BROKER, None, &[], &[name]).await
    }
}
