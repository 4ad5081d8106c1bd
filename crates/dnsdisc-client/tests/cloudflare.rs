//! CloudFlare zone manager tests against a mocked v4 API.

use dnsdisc_client::CloudflareDns;
use dnsdisc_core::{DnsdiscError, Zone};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dns_for(server: &MockServer) -> CloudflareDns {
    CloudflareDns::builder("ops@example.org", "api-key")
        .base_url(server.uri())
        .build()
}

fn zone() -> Zone {
    Zone {
        id: "z1".to_string(),
        name: "example.org".to_string(),
    }
}

fn envelope(result: serde_json::Value, total_pages: u32, page: u32) -> serde_json::Value {
    json!({
        "success": true,
        "errors": [],
        "result": result,
        "result_info": {"page": page, "per_page": 1000, "total_pages": total_pages}
    })
}

#[tokio::test]
async fn resolve_zone_matches_exact_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.org"))
        .and(header("X-Auth-Email", "ops@example.org"))
        .and(header("X-Auth-Key", "api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([{"id": "z1", "name": "example.org", "status": "active"}]),
            1,
            1,
        )))
        .mount(&server)
        .await;

    let zone = dns_for(&server).resolve_zone("example.org").await.unwrap();
    assert_eq!(zone.id, "z1");
    assert_eq!(zone.name, "example.org");
}

#[tokio::test]
async fn resolve_zone_unknown_domain_is_zone_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]), 1, 1)))
        .mount(&server)
        .await;

    let err = dns_for(&server).resolve_zone("nope.org").await.unwrap_err();
    assert!(matches!(err, DnsdiscError::ZoneNotFound { domain } if domain == "nope.org"));
}

#[tokio::test]
async fn txt_records_returns_only_suffix_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("type", "TXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([
                {"id": "r1", "name": "nodes.example.org", "content": "enrtree-root:AAA"},
                {"id": "r2", "name": "tree1.nodes.example.org", "content": "enrtree-branch:BBB"},
                {"id": "r3", "name": "_dmarc.example.org", "content": "v=DMARC1"},
            ]),
            1,
            1,
        )))
        .mount(&server)
        .await;

    let records = dns_for(&server)
        .txt_records(&zone(), "nodes.example.org")
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[tokio::test]
async fn txt_records_drains_every_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([{"id": "r1", "name": "a.nodes.example.org", "content": "x"}]),
            2,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zones/z1/dns_records"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([{"id": "r2", "name": "b.nodes.example.org", "content": "y"}]),
            2,
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let records = dns_for(&server)
        .txt_records(&zone(), "nodes.example.org")
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn create_record_posts_txt_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/z1/dns_records"))
        .and(body_partial_json(json!({
            "type": "TXT",
            "name": "nodes.example.org",
            "content": "enrtree-root:AAA"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": {"id": "new1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    dns_for(&server)
        .create_record(&zone(), "nodes.example.org", "enrtree-root:AAA")
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_record_failure_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/zones/z1/dns_records/r1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": [{"code": 81044, "message": "Record does not exist."}],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = dns_for(&server)
        .delete_record(&zone(), "r1")
        .await
        .unwrap_err();
    match err {
        DnsdiscError::ProviderError { code, message } => {
            assert_eq!(code, Some(400));
            assert!(message.contains("Record does not exist."));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn api_level_failure_with_ok_status_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/zones/z1/dns_records/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = dns_for(&server)
        .delete_record(&zone(), "r1")
        .await
        .unwrap_err();
    assert!(matches!(err, DnsdiscError::ProviderError { .. }));
}
