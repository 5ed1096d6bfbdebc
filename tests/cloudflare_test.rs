//! Integration tests for CloudflareClient using wiremock

use repoint::dns::{CloudflareClient, CloudflareConfig, DnsError, DnsProvider, RecordUpdate};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECORDS_PATH: &str = "/zones/zone-1/dns_records";

fn client(server: &MockServer) -> CloudflareClient {
    let config =
        CloudflareConfig::new("ops@example.com", "global-key", "zone-1").with_api_base(server.uri());
    CloudflareClient::new(config).unwrap()
}

fn record(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "zone_id": "zone-1",
        "name": name,
        "type": "A",
        "content": "10.0.0.1",
        "proxied": false,
        "ttl": 1
    })
}

/// Test listing a single page with auth headers
#[tokio::test]
async fn test_list_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .and(header("X-Auth-Email", "ops@example.com"))
        .and(header("X-Auth-Key", "global-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": [
                record("r1", "nasi-campur-jp-1.example.com"),
                record("r2", "www.example.com")
            ],
            "result_info": { "page": 1, "per_page": 30, "total_pages": 1, "count": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client(&server).list_records().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "r1");
    assert_eq!(records[0].zone_id, "zone-1");
    assert_eq!(records[1].name, "www.example.com");
}

/// Test that every page is fetched
#[tokio::test]
async fn test_list_follows_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [record("r1", "nasi-campur-jp-1.example.com")],
            "result_info": { "total_pages": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [record("r2", "nasi-campur-sg-1.example.com")],
            "result_info": { "total_pages": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client(&server).list_records().await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

/// Test that an API-level failure on listing is an error
#[tokio::test]
async fn test_list_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 9103, "message": "Unknown X-Auth-Key or X-Auth-Email" }],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = client(&server).list_records().await.unwrap_err();

    match err {
        DnsError::Rejected(message) => assert!(message.contains("9103")),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

/// Test that a non-JSON error page is an HTTP error
#[tokio::test]
async fn test_list_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).list_records().await.unwrap_err();

    assert!(matches!(err, DnsError::Http { status: 502, .. }));
    assert!(err.is_transport());
}

/// Test the update payload and a successful acknowledgement
#[tokio::test]
async fn test_update_record() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{RECORDS_PATH}/r1")))
        .and(header("X-Auth-Email", "ops@example.com"))
        .and(body_json(json!({
            "type": "A",
            "name": "nasi-campur-jp-1.example.com",
            "content": "1.2.3.4",
            "ttl": 1,
            "proxied": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": record("r1", "nasi-campur-jp-1.example.com")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = RecordUpdate::a_record("nasi-campur-jp-1.example.com", "1.2.3.4");
    let ack = client(&server)
        .update_record("zone-1", "r1", &update)
        .await
        .unwrap();

    assert!(ack.success);
    assert!(ack.errors.is_empty());
}

/// Test that `success: false` is an acknowledgement, not an error
#[tokio::test]
async fn test_update_rejected_is_acknowledged() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{RECORDS_PATH}/r1")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 81057, "message": "Record already exists." }],
            "result": null
        })))
        .mount(&server)
        .await;

    let update = RecordUpdate::a_record("nasi-campur-jp-1.example.com", "1.2.3.4");
    let ack = client(&server)
        .update_record("zone-1", "r1", &update)
        .await
        .unwrap();

    assert!(!ack.success);
    assert_eq!(ack.errors, vec!["Record already exists. (81057)".to_string()]);
}
