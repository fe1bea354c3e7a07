//! Request dispatcher
//!
//! Turns an endpoint descriptor plus arguments into one HTTP exchange and
//! maps the outcome onto [`KuiperError`]. The dispatcher never retries.

use std::fmt;
use std::sync::Arc;

use ekuiper_domain::{
    ApplicationErrorBody, Endpoint, EndpointDescriptor, EndpointRegistry, KuiperError, Operation,
    RequestShape, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::AuthHeaderProvider;
use crate::http::{decode_response, HttpRequest, Transport};

/// Query parameters; entries with a `None` value are skipped.
pub type QueryParams<'a> = &'a [(&'a str, Option<&'a str>)];

/// Executes described operations against a [`Transport`].
pub struct Dispatcher {
    base_url: String,
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthHeaderProvider>,
    registry: Arc<EndpointRegistry>,
}

impl Dispatcher {
    /// # Errors
    /// Returns `KuiperError::Configuration` if `base_url` is not a valid
    /// absolute URL.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthHeaderProvider>,
        registry: Arc<EndpointRegistry>,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| KuiperError::Configuration(format!("Invalid base URL {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(KuiperError::Configuration(format!("Invalid base URL: {base_url}")));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            auth,
            registry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Invoke a typed endpoint.
    ///
    /// Path variables are substituted positionally, in the order their
    /// placeholders appear in the template.
    ///
    /// # Errors
    /// - `InvalidArgument` for a wrong path-variable count or an unexpected
    ///   body, before any network I/O
    /// - `Timeout`, `TransportFailure` or `Application` for remote failures
    /// - `Decode` when the response does not fit `Resp`
    pub async fn invoke<Req, Resp>(
        &self,
        endpoint: &Endpoint<Req, Resp>,
        body: Option<&Req>,
        query: QueryParams<'_>,
        path_vars: &[&str],
    ) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let descriptor = endpoint.descriptor();
        descriptor.check_arity(path_vars.len())?;
        let payload = encode_body(descriptor, body)?;
        let response = self.execute(descriptor, payload, query, path_vars).await?;
        decode_response(descriptor.response, &response)
    }

    /// Invoke a registered operation with an untyped JSON body and result.
    ///
    /// # Errors
    /// Same as [`Dispatcher::invoke`], plus `InvalidArgument` when
    /// `operation` is not registered.
    pub async fn invoke_operation(
        &self,
        operation: Operation,
        body: Option<&Value>,
        query: QueryParams<'_>,
        path_vars: &[&str],
    ) -> Result<Value> {
        let descriptor = *self.registry.get(operation).ok_or_else(|| {
            KuiperError::InvalidArgument(format!("Endpoint {operation} is not registered"))
        })?;
        descriptor.check_arity(path_vars.len())?;
        let payload = encode_body(&descriptor, body)?;
        let response = self.execute(&descriptor, payload, query, path_vars).await?;
        decode_response(descriptor.response, &response)
    }

    #[instrument(skip_all, fields(operation = %descriptor.operation, method = %descriptor.verb))]
    async fn execute(
        &self,
        descriptor: &EndpointDescriptor,
        body: Option<Vec<u8>>,
        query: QueryParams<'_>,
        path_vars: &[&str],
    ) -> Result<String> {
        let path = descriptor.expand_path(path_vars, |var| urlencoding::encode(var).into_owned())?;
        let url = self.resolve_url(&path, query)?;
        let headers = self.auth.headers()?;

        debug!(url = %url, "Dispatching request");

        let response = self
            .transport
            .execute(HttpRequest { verb: descriptor.verb, url: url.clone(), headers, body })
            .await
            .map_err(|err| {
                let mapped = KuiperError::from(err);
                warn!(url = %url, error = %mapped, "Request failed");
                mapped
            })?;

        // The engine can report failures with a 2xx status
        if let Some(app) = ApplicationErrorBody::parse(&response.body) {
            let err = KuiperError::application(app, Some(response.status));
            warn!(url = %url, error = %err, "Engine reported an error");
            return Err(err);
        }

        Ok(response.body)
    }

    fn resolve_url(&self, path: &str, query: QueryParams<'_>) -> Result<Url> {
        let joined = if path.is_empty() {
            self.base_url.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let mut url = Url::parse(&joined)
            .map_err(|e| KuiperError::InvalidArgument(format!("Invalid request URL {joined}: {e}")))?;

        let present: Vec<(&str, &str)> =
            query.iter().filter_map(|(key, value)| value.map(|v| (*key, v))).collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        Ok(url)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("endpoints", &self.registry.len())
            .finish_non_exhaustive()
    }
}

fn encode_body<Req: Serialize>(
    descriptor: &EndpointDescriptor,
    body: Option<&Req>,
) -> Result<Option<Vec<u8>>> {
    match (descriptor.request, body) {
        (RequestShape::Empty, Some(_)) => Err(KuiperError::InvalidArgument(format!(
            "Endpoint {} does not accept a request body",
            descriptor.operation
        ))),
        (_, None) => Ok(None),
        (RequestShape::Json, Some(body)) => serde_json::to_vec(body).map(Some).map_err(|e| {
            KuiperError::InvalidArgument(format!(
                "Failed to serialize request body for {}: {e}",
                descriptor.operation
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ekuiper_domain::{standard, ErrorCode, ErrorKind, HttpVerb, ResponseShape, StreamDefinition};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::NoAuth;
    use crate::errors::TransportError;
    use crate::http::{HttpResponse, ReqwestTransport};

    /// Transport stub that records calls and answers with a fixed body.
    #[derive(Default)]
    struct RecordingTransport {
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(request.url.to_string());
            Ok(HttpResponse { status: 200, body: r#"{"status":"running"}"#.into() })
        }
    }

    fn dispatcher_with(transport: Arc<dyn Transport>, base_url: &str) -> Dispatcher {
        Dispatcher::new(
            base_url,
            transport,
            Arc::new(NoAuth),
            Arc::new(EndpointRegistry::standard().unwrap()),
        )
        .unwrap()
    }

    fn live_dispatcher(server: &MockServer) -> Dispatcher {
        dispatcher_with(Arc::new(ReqwestTransport::new().unwrap()), &server.uri())
    }

    #[tokio::test]
    async fn arity_mismatch_never_reaches_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(transport.clone(), "http://localhost:9081");

        for vars in [&[] as &[&str], &["r1", "r2"]] {
            let err = dispatcher
                .invoke(&standard::GET_RULE_STATUS, None, &[], vars)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn path_variables_are_substituted_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(transport.clone(), "http://localhost:9081");

        let status = dispatcher.invoke(&standard::GET_RULE_STATUS, None, &[], &["r1"]).await.unwrap();

        assert_eq!(status, json!({"status": "running"}));
        assert_eq!(transport.urls.lock().unwrap()[0], "http://localhost:9081/rules/r1/status");
    }

    #[tokio::test]
    async fn path_variables_are_percent_encoded() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(transport.clone(), "http://localhost:9081");

        dispatcher.invoke(&standard::GET_RULE, None, &[], &["a b/c"]).await.unwrap();
        assert_eq!(transport.urls.lock().unwrap()[0], "http://localhost:9081/rules/a%20b%2Fc");
    }

    #[tokio::test]
    async fn absent_query_values_are_skipped() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(transport.clone(), "http://localhost:9081/");

        dispatcher
            .invoke(&standard::GET_RULE, None, &[("type", Some("table")), ("skip", None)], &["r1"])
            .await
            .unwrap();
        dispatcher.invoke(&standard::GET_RULE, None, &[("skip", None)], &["r2"]).await.unwrap();

        let urls = transport.urls.lock().unwrap();
        assert_eq!(urls[0], "http://localhost:9081/rules/r1?type=table");
        assert_eq!(urls[1], "http://localhost:9081/rules/r2");
    }

    #[tokio::test]
    async fn body_on_bodiless_endpoint_is_rejected() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(transport.clone(), "http://localhost:9081");

        let err = dispatcher
            .invoke_operation(Operation::StartRule, Some(&json!({})), &[], &["r1"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unregistered_operation_is_invalid_argument() {
        let registry = EndpointRegistry::new([*standard::PING.descriptor()]).unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(
            "http://localhost:9081",
            transport.clone(),
            Arc::new(NoAuth),
            Arc::new(registry),
        )
        .unwrap();

        let err = dispatcher.invoke_operation(Operation::ListRules, None, &[], &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_base_url_is_configuration_error() {
        let err = Dispatcher::new(
            "not a url",
            Arc::new(RecordingTransport::default()),
            Arc::new(NoAuth),
            Arc::new(EndpointRegistry::standard().unwrap()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn io_error_code_maps_regardless_of_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rules/r1/start"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": 1003, "message": "broker unreachable"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rules/r2/start"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": 1003, "message": "broker unreachable"})),
            )
            .mount(&server)
            .await;

        let dispatcher = live_dispatcher(&server);
        for (id, status) in [("r1", 400), ("r2", 200)] {
            let err = dispatcher.invoke(&standard::START_RULE, None, &[], &[id]).await.unwrap_err();
            assert_eq!(err.code(), Some(ErrorCode::IoError));
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.to_string(), "[1003 - IO error in Source/Sink] broker unreachable");
        }
    }

    #[tokio::test]
    async fn resource_not_found_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rules/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": 1002, "message": "rule missing is not found"})),
            )
            .mount(&server)
            .await;

        let err = live_dispatcher(&server)
            .invoke(&standard::GET_RULE, None, &[], &["missing"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.code(), Some(ErrorCode::ResourceNotFound));
    }

    #[tokio::test]
    async fn unstructured_error_keeps_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/streams"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})),
            )
            .mount(&server)
            .await;

        let err =
            live_dispatcher(&server).invoke(&standard::LIST_STREAMS, None, &[], &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "maintenance");
    }

    #[tokio::test]
    async fn unstructured_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = live_dispatcher(&server)
            .invoke(&standard::DELETE_STREAM, None, &[], &["s1"])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP request failed with status code: 500");
    }

    #[tokio::test]
    async fn timeout_is_distinct_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder()
            .read_timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let dispatcher = dispatcher_with(Arc::new(transport), &server.uri());

        let err = dispatcher.invoke(&standard::PING, None, &[], &[]).await.unwrap_err();
        assert!(err.is_timeout(), "got {err:?}");
    }

    #[tokio::test]
    async fn json_body_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/streams"))
            .and(body_json(json!({"sql": "CREATE STREAM demo () WITH (TYPE=\"mqtt\")"})))
            .respond_with(ResponseTemplate::new(201).set_body_string("Stream demo is created."))
            .expect(1)
            .mount(&server)
            .await;

        let body = StreamDefinition::new("CREATE STREAM demo () WITH (TYPE=\"mqtt\")");
        let reply =
            live_dispatcher(&server).invoke(&standard::CREATE_STREAM, Some(&body), &[], &[]).await.unwrap();
        assert_eq!(reply, "Stream demo is created.");
    }

    #[tokio::test]
    async fn root_and_relative_paths_resolve() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"version": "2.0.3", "os": "linux", "arch": "amd64", "upTimeSeconds": 42}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dispatcher = live_dispatcher(&server);
        let info = dispatcher.invoke(&standard::GET_SERVER_INFO, None, &[], &[]).await.unwrap();
        assert_eq!(info.version, "2.0.3");

        let pong = dispatcher.invoke(&standard::PING, None, &[], &[]).await.unwrap();
        assert!(pong.is_empty());
    }

    #[tokio::test]
    async fn untyped_operation_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rules"))
            .and(query_param("verbose", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "r1", "status": "running"}])),
            )
            .mount(&server)
            .await;

        let value = live_dispatcher(&server)
            .invoke_operation(Operation::ListRules, None, &[("verbose", Some("true"))], &[])
            .await
            .unwrap();
        assert_eq!(value[0]["id"], "r1");
    }

    #[tokio::test]
    async fn shape_mismatch_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
            .mount(&server)
            .await;

        let err = live_dispatcher(&server).invoke(&standard::LIST_RULES, None, &[], &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn custom_endpoint_outside_registry() {
        const HEALTH: Endpoint<(), Value> = Endpoint::new(
            Operation::Ping,
            HttpVerb::Get,
            "/health/{probe}",
            1,
            RequestShape::Empty,
            ResponseShape::Record,
        );
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = dispatcher_with(transport.clone(), "http://localhost:9081");

        dispatcher.invoke(&HEALTH, None, &[], &["live"]).await.unwrap();
        assert_eq!(transport.urls.lock().unwrap()[0], "http://localhost:9081/health/live");
    }
}
