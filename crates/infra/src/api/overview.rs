//! Server overview

use std::sync::Arc;

use ekuiper_domain::{standard, Result, ServerInfo};

use super::dispatcher::Dispatcher;

#[derive(Debug, Clone)]
pub struct OverviewApi {
    dispatcher: Arc<Dispatcher>,
}

impl OverviewApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Version, platform and uptime of the engine.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.dispatcher.invoke(&standard::GET_SERVER_INFO, None, &[], &[]).await
    }

    pub async fn ping(&self) -> Result<String> {
        self.dispatcher.invoke(&standard::PING, None, &[], &[]).await
    }
}
