//! Rule management
//!
//! Rule definitions are passed through as JSON; the engine owns their
//! schema (`id`, `sql`, `actions`, `options`, ...).

use std::sync::Arc;

use ekuiper_domain::{standard, Result, RuleSummary};
use serde_json::{Map, Value};
use tracing::instrument;

use super::dispatcher::Dispatcher;

/// Rule operations
#[derive(Debug, Clone)]
pub struct RulesApi {
    dispatcher: Arc<Dispatcher>,
}

impl RulesApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[instrument(skip(self, rule))]
    pub async fn create(&self, rule: &Value) -> Result<String> {
        self.dispatcher.invoke(&standard::CREATE_RULE, Some(rule), &[], &[]).await
    }

    pub async fn list(&self) -> Result<Vec<RuleSummary>> {
        self.dispatcher.invoke(&standard::LIST_RULES, None, &[], &[]).await
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        self.dispatcher.invoke(&standard::GET_RULE, None, &[], &[id]).await
    }

    #[instrument(skip(self, rule))]
    pub async fn update(&self, id: &str, rule: &Value) -> Result<String> {
        self.dispatcher.invoke(&standard::UPDATE_RULE, Some(rule), &[], &[id]).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::DELETE_RULE, None, &[], &[id]).await
    }

    #[instrument(skip(self))]
    pub async fn start(&self, id: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::START_RULE, None, &[], &[id]).await
    }

    #[instrument(skip(self))]
    pub async fn stop(&self, id: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::STOP_RULE, None, &[], &[id]).await
    }

    #[instrument(skip(self))]
    pub async fn restart(&self, id: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::RESTART_RULE, None, &[], &[id]).await
    }

    /// Runtime status and metrics of one rule.
    pub async fn status(&self, id: &str) -> Result<Value> {
        self.dispatcher.invoke(&standard::GET_RULE_STATUS, None, &[], &[id]).await
    }

    /// Status of every rule, keyed by rule id.
    pub async fn all_statuses(&self) -> Result<Map<String, Value>> {
        self.dispatcher.invoke(&standard::GET_ALL_RULES_STATUS, None, &[], &[]).await
    }

    /// Check a rule definition without creating it.
    pub async fn validate(&self, rule: &Value) -> Result<String> {
        self.dispatcher.invoke(&standard::VALIDATE_RULE, Some(rule), &[], &[]).await
    }

    /// Query plan of a rule, as rendered by the engine.
    pub async fn explain(&self, id: &str) -> Result<String> {
        self.dispatcher.invoke(&standard::EXPLAIN_RULE, None, &[], &[id]).await
    }

    pub async fn cpu_usage(&self) -> Result<String> {
        self.dispatcher.invoke(&standard::GET_RULES_CPU_USAGE, None, &[], &[]).await
    }
}
