//! RestClient behaviour against an in-process mock server

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use test_case::test_case;

use taskboard_common::{AttachmentKind, MemoryReporter};
use taskboard_rest::diagnostics::{
    COOKIES_ATTACHMENT, CURL_ATTACHMENT, CURL_ERROR_ATTACHMENT, DATA_ATTACHMENT, SUMMARY_ATTACHMENT,
};
use taskboard_rest::{RequestSpec, RestClient, RestClientConfig, RestError};

use support::MockServer;

fn client_with_reporter(base_url: &str) -> (RestClient, Arc<MemoryReporter>) {
    let reporter = Arc::new(MemoryReporter::new());
    let config = RestClientConfig::new(base_url).with_reporter(reporter.clone());
    (RestClient::with_config(config).unwrap(), reporter)
}

#[test_case("GET" ; "get")]
#[test_case("POST" ; "post")]
#[test_case("PUT" ; "put")]
#[test_case("DELETE" ; "delete")]
#[test_case("PATCH" ; "patch")]
#[tokio::test]
async fn base_url_is_prefixed_exactly_once(method: &str) {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();

    let response = client
        .request("/items/7", method, RequestSpec::new())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.url(), format!("{}/items/7", server.base_url));

    let seen = server.last_request();
    assert_eq!(seen.method, method);
    assert_eq!(seen.path, "/1/items/7");
    assert_eq!(response.json().unwrap()["path"], "/items/7");
}

#[tokio::test]
async fn unsupported_method_fails_before_any_io() {
    let server = MockServer::echo().await;
    let (client, reporter) = client_with_reporter(&server.base_url);

    for verb in ["TRACE", "get", "OPTIONS"] {
        let result = client.request("/x", verb, RequestSpec::new()).await;
        match result {
            Err(RestError::UnsupportedMethod(m)) => assert_eq!(m, verb),
            other => panic!("expected UnsupportedMethod for {}, got {:?}", verb, other),
        }
    }

    assert!(server.requests().is_empty());
    assert!(reporter.attachments().is_empty());
}

#[tokio::test]
async fn create_board_scenario_returns_created() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();

    let spec = RequestSpec::new()
        .header("Accept", "application/json")
        .json(json!({"name": "X"}));
    let response = client.request("/boards/", "POST", spec).await.unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.json(), Some(&json!({"id": "abc"})));

    let seen = server.last_request();
    assert_eq!(seen.header("accept"), Some("application/json"));
    assert_eq!(seen.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn posted_json_round_trips_through_echo() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();

    let payload = json!({
        "name": "測試用看板",
        "prefs": {"permissionLevel": "private", "labels": ["green", "red"]},
        "closed": false,
    });
    let response = client
        .post("/echo", RequestSpec::new().json(payload.clone()))
        .await
        .unwrap();

    assert_eq!(response.json(), Some(&payload));
}

#[tokio::test]
async fn unparseable_body_still_returns_response() {
    let server = MockServer::echo().await;
    let (client, reporter) = client_with_reporter(&server.base_url);

    let response = client.get("/not-json", RequestSpec::new()).await.unwrap();

    assert_eq!(response.status(), 502);
    assert!(response.json().is_none());
    assert!(response.text().contains("bad gateway"));

    let body = reporter
        .find(&format!("{}/not-json Response body", server.base_url))
        .unwrap();
    assert_eq!(body.kind, AttachmentKind::Text);
    assert_eq!(body.body, "<html>bad gateway</html>");
}

#[tokio::test]
async fn error_status_is_not_an_error() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();

    let response = client.delete("/missing", RequestSpec::new()).await.unwrap();

    assert_eq!(response.status(), 404);
    assert!(!response.is_success());
    assert_eq!(response.json().unwrap()["error"], "not found");
}

#[tokio::test]
async fn diagnostic_capture_failure_does_not_block_response() {
    let server = MockServer::echo().await;
    let (client, reporter) = client_with_reporter(&server.base_url);

    let response = client
        .post("/echo", RequestSpec::new().raw(vec![0xffu8, 0xfe, 0x00]))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().to_vec(), vec![0xffu8, 0xfe, 0x00]);
    assert!(reporter.find(CURL_ATTACHMENT).is_none());
    assert_eq!(reporter.find(CURL_ERROR_ATTACHMENT).unwrap().body, "None");
    assert_eq!(
        reporter.find(DATA_ATTACHMENT).unwrap().body,
        "<3 bytes of binary data>"
    );
}

#[tokio::test]
async fn put_and_patch_send_json_as_text() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();
    let fields = json!({"closed": true});

    for method in ["PUT", "PATCH"] {
        client
            .request("/boards/b1", method, RequestSpec::new().json(fields.clone()))
            .await
            .unwrap();

        let seen = server.last_request();
        assert_eq!(seen.body_text(), r#"{"closed":true}"#);
        assert_eq!(seen.header("content-type"), None);
    }
}

#[tokio::test]
async fn delete_sends_json_but_not_form() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();

    client
        .delete("/cards/c1", RequestSpec::new().json(json!({"reason": "cleanup"})))
        .await
        .unwrap();
    assert_eq!(server.last_request().body_text(), r#"{"reason":"cleanup"}"#);

    client
        .delete("/cards/c1", RequestSpec::new().form([("reason", "cleanup")]))
        .await
        .unwrap();
    assert!(server.last_request().body.is_empty());
}

#[tokio::test]
async fn get_never_transmits_a_body() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();

    client
        .get("/boards/b1", RequestSpec::new().text("ignored"))
        .await
        .unwrap();

    assert!(server.last_request().body.is_empty());
}

#[tokio::test]
async fn query_headers_and_cookies_reach_the_server() {
    let server = MockServer::echo().await;
    let (client, reporter) = client_with_reporter(&server.base_url);

    let spec = RequestSpec::new()
        .header("X-Request-Id", "r-1")
        .query("fields", "name,url")
        .query("key", "k")
        .cookie("dc", "eu")
        .cookie("session", "s1");
    client.get("/members/me", spec).await.unwrap();

    let seen = server.last_request();
    assert_eq!(seen.query["fields"], "name,url");
    assert_eq!(seen.query["key"], "k");
    assert_eq!(seen.header("x-request-id"), Some("r-1"));
    assert_eq!(seen.header("cookie"), Some("dc=eu; session=s1"));
    assert!(reporter.find(COOKIES_ATTACHMENT).unwrap().body.contains("\"session\": \"s1\""));
}

#[tokio::test]
async fn every_call_attaches_curl_and_summary() {
    let server = MockServer::echo().await;
    let (client, reporter) = client_with_reporter(&server.base_url);

    client
        .post("/boards/", RequestSpec::new().query("name", "X"))
        .await
        .unwrap();

    let url = format!("{}/boards/", server.base_url);
    let curl = reporter.find(CURL_ATTACHMENT).unwrap().body;
    assert!(curl.starts_with("curl -X POST"), "{}", curl);
    assert!(curl.ends_with(&format!("'{}?name=X'", url)), "{}", curl);

    let summary = reporter.find(SUMMARY_ATTACHMENT).unwrap().body;
    assert_eq!(summary, format!("POST {} \nStatus Code: 201 ", url));

    let body = reporter.find(&format!("{} Response body", url)).unwrap();
    assert_eq!(body.kind, AttachmentKind::Json);
}

#[tokio::test]
async fn timeout_propagates() {
    let server = MockServer::echo().await;
    let config = RestClientConfig::new(&server.base_url).with_timeout(Duration::from_millis(200));
    let client = RestClient::with_config(config).unwrap();

    let err = client.get("/slow", RequestSpec::new()).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    assert!(err.is_transport());
}

#[tokio::test]
async fn connection_failure_propagates() {
    // Bind then release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = RestClient::new(format!("http://127.0.0.1:{}/1", port)).unwrap();

    let err = client.get("/boards/", RequestSpec::new()).await.unwrap_err();

    assert!(matches!(err, RestError::Connection { .. }), "got {:?}", err);
}

#[tokio::test]
async fn close_releases_the_client() {
    let server = MockServer::echo().await;
    let client = RestClient::new(&server.base_url).unwrap();
    client.get("/ping", RequestSpec::new()).await.unwrap();
    client.close();
}
