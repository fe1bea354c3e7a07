//! End-to-end tests of the typed APIs against a mock management server.

use std::path::Path;

use ekuiper_domain::{
    standard::JsonObject, BasicAuthConfig, ClientConfig, ErrorCode, ErrorKind, JwtConfig,
};
use ekuiper_infra::{credentials::Claims, KuiperClient};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    let uri = url::Url::parse(&server.uri()).expect("mock server uri");
    ClientConfig {
        scheme: uri.scheme().to_string(),
        host: uri.host_str().expect("host").to_string(),
        port: uri.port().expect("port"),
        ..Default::default()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn client_for(server: &MockServer) -> KuiperClient {
    KuiperClient::connect(config_for(server)).await.expect("client")
}

#[tokio::test]
async fn test_server_info_and_ping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "1.14.0",
            "os": "linux",
            "arch": "arm64",
            "upTimeSeconds": 42
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let info = client.overview().server_info().await.unwrap();
    assert_eq!(info.version, "1.14.0");
    assert_eq!(info.arch.as_deref(), Some("arm64"));
    assert_eq!(info.up_time_seconds, Some(42));

    assert_eq!(client.overview().ping().await.unwrap(), "");
}

#[tokio::test]
async fn test_stream_lifecycle() {
    let server = MockServer::start().await;
    let sql = "CREATE STREAM demo (temp FLOAT) WITH (DATASOURCE=\"demo\", FORMAT=\"json\")";

    Mock::given(method("POST"))
        .and(path("/streams"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "sql": sql })))
        .respond_with(ResponseTemplate::new(201).set_body_string("Stream demo is created."))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["demo", "sensors"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/streams/demo/schema"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "temp": { "type": "float" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/streams/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Stream demo is dropped."))
        .mount(&server)
        .await;

    let streams = client_for(&server).await.streams();
    assert_eq!(streams.create(sql).await.unwrap(), "Stream demo is created.");
    assert_eq!(streams.list().await.unwrap(), vec!["demo", "sensors"]);
    assert_eq!(streams.schema("demo").await.unwrap()["temp"]["type"], "float");
    assert_eq!(streams.delete("demo").await.unwrap(), "Stream demo is dropped.");
}

#[tokio::test]
async fn test_rule_operations_and_not_found() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "rule1", "status": "Running" },
            { "id": "rule2", "status": "Stopped: canceled manually." }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rules/rule1/restart"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Rule rule1 was restarted"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rules/missing/status"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": 1002,
            "message": "rule missing not found"
        })))
        .mount(&server)
        .await;

    let rules = client_for(&server).await.rules();

    let listed = rules.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "rule1");
    assert_eq!(listed[0].status, "Running");

    assert_eq!(rules.restart("rule1").await.unwrap(), "Rule rule1 was restarted");

    let err = rules.status("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Application);
    assert_eq!(err.code(), Some(ErrorCode::ResourceNotFound));
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("rule missing not found"));
}

#[tokio::test]
async fn test_mqtt_conf_key_body_is_wrapped_in_key_name() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/metadata/sources/mqtt/confKeys/broker_a"))
        .and(body_json(json!({ "broker_a": { "server": "tcp://10.0.0.2:1883" } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata/sources/yaml/mqtt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "default": { "server": "tcp://127.0.0.1:1883", "qos": 1 },
            "broker_a": { "server": "tcp://10.0.0.2:1883" }
        })))
        .mount(&server)
        .await;

    let keys = client_for(&server).await.config_keys();

    let mut props = JsonObject::new();
    props.insert("server".into(), json!("tcp://10.0.0.2:1883"));
    keys.put_mqtt("broker_a", &props).await.unwrap();

    let listed = keys.list_mqtt().await.unwrap();
    assert_eq!(listed["default"]["qos"], 1);
    assert!(listed.contains_key("broker_a"));
}

#[tokio::test]
async fn test_connection_info_rejects_non_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/connections/conn1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
        .mount(&server)
        .await;

    let err = client_for(&server).await.connections().info("conn1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
}

#[tokio::test]
async fn test_basic_auth_is_sent_on_every_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules/status/all"))
        .and(header("authorization", "Basic YWRtaW46cHVibGlj"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let config = ClientConfig {
        basic: BasicAuthConfig {
            enabled: true,
            username: Some("admin".into()),
            password: Some("public".into()),
        },
        ..config_for(&server)
    };
    let client = KuiperClient::connect(config).await.unwrap();

    assert!(client.rules().all_statuses().await.unwrap().is_empty());
    assert!(client.rules().all_statuses().await.unwrap().is_empty());
}

fn jwt_config(dir: &Path) -> JwtConfig {
    let management_path = dir.join("mgmt");
    std::fs::create_dir_all(&management_path).unwrap();
    JwtConfig {
        enabled: true,
        private_key_path: Some(dir.join("certs/ekuiper_rsa.key")),
        public_key_path: Some(dir.join("certs/ekuiper-rs.pub")),
        management_path,
        ..JwtConfig::default()
    }
}

#[tokio::test]
async fn test_token_auth_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let config = ClientConfig { jwt: jwt_config(dir.path()), ..config_for(&server) };
    let mut client = KuiperClient::connect(config).await.unwrap();

    assert!(dir.path().join("certs/ekuiper_rsa.key").exists());
    let deployed = dir.path().join("mgmt/ekuiper-rs.pub");
    let public_pem = std::fs::read_to_string(&deployed).expect("public key deployed");

    assert!(client.streams().list().await.unwrap().is_empty());

    let requests = server.received_requests().await.expect("recording enabled");
    let authorization = requests[0]
        .headers
        .get("authorization")
        .expect("authorization header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(!authorization.starts_with("Bearer "));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["eKuiper"]);
    validation.set_issuer(&["ekuiper-rs.pub"]);
    let claims = decode::<Claims>(
        &authorization,
        &DecodingKey::from_rsa_pem(public_pem.as_bytes()).unwrap(),
        &validation,
    )
    .expect("token verifies with the deployed key")
    .claims;
    assert_eq!(claims.exp - claims.iat, 3600);

    let current = client.token_manager().unwrap().get_token().unwrap().unwrap();
    assert_eq!(current.as_str(), authorization);

    client.shutdown().await;
}

#[tokio::test]
async fn test_token_auth_reuses_existing_key_pair() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    let config = ClientConfig { jwt: jwt_config(dir.path()), ..config_for(&server) };
    let mut first = KuiperClient::connect(config.clone()).await.unwrap();
    first.shutdown().await;
    let key_before = std::fs::read(dir.path().join("certs/ekuiper_rsa.key")).unwrap();

    let mut second = KuiperClient::connect(config).await.unwrap();
    second.shutdown().await;
    let key_after = std::fs::read(dir.path().join("certs/ekuiper_rsa.key")).unwrap();

    assert_eq!(key_before, key_after);
}

#[tokio::test]
async fn test_error_kind_for_unreachable_server() {
    let config = ClientConfig { host: "127.0.0.1".into(), port: 1, ..Default::default() };
    let client = KuiperClient::connect(config).await.unwrap();

    let err = client.overview().ping().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(err.status(), None);
}
