// Integration tests for `BigIpClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bigip_api::{BigIpClient, Error, Module, RetryPolicy, TransportConfig};

const TOKEN: &str = "ABCD1234EFGH5678";

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        backoff: Duration::from_millis(5),
        ..RetryPolicy::default()
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .and(body_partial_json(json!({
            "username": "admin",
            "loginProviderName": "tmos",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": { "token": TOKEN },
        })))
        .mount(server)
        .await;
}

async fn setup() -> (MockServer, BigIpClient) {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = BigIpClient::connect(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        &SecretString::from("hunter2".to_owned()),
        &TransportConfig::default(),
        fast_retry(),
    )
    .await
    .unwrap();
    (server, client)
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn login_token_is_sent_on_every_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/pool"))
        .and(header("X-F5-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .get_object(Module::Ltm, "pool", false, &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_login_is_an_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/shared/authn/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("{\"message\":\"bad credentials\"}"),
        )
        .mount(&server)
        .await;

    let result = BigIpClient::connect(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        &SecretString::from("wrong".to_owned()),
        &TransportConfig::default(),
        fast_retry(),
    )
    .await;

    match result {
        Err(Error::Authentication { status, ref body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("bad credentials"));
        }
        other => panic!("expected Authentication error, got: {:?}", other.map(|_| ())),
    }
}

// ── Pre-flight validation ───────────────────────────────────────────

#[tokio::test]
async fn unknown_category_never_hits_the_network() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.get_object(Module::Ltm, "not-a-thing", false, &[]).await;

    assert!(
        matches!(result, Err(Error::UnknownCategory { .. })),
        "expected UnknownCategory, got: {result:?}"
    );
}

// ── Query construction ──────────────────────────────────────────────

#[tokio::test]
async fn expand_subcollections_adds_the_query_flag() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/virtual"))
        .and(query_param("expandSubcollections", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .get_object(Module::Ltm, "virtual", true, &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn extra_params_are_forwarded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/net/vlan"))
        .and(query_param("$select", "name,tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .get_object(Module::Net, "vlan", false, &[("$select", "name,tag")])
        .await
        .unwrap();
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn retryable_status_is_attempted_up_to_the_budget() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/pool"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = client.get_object(Module::Ltm, "pool", false, &[]).await;

    match result {
        Err(Error::Request { status, ref url, .. }) => {
            assert_eq!(status, 503);
            assert!(url.contains("/mgmt/tm/ltm/pool"));
        }
        other => panic!("expected Request error, got: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn retry_recovers_when_a_later_attempt_succeeds() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/node"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/node"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .get_object(Module::Ltm, "node", false, &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn non_retryable_status_surfaces_on_first_attempt() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/pool"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.get_object(Module::Ltm, "pool", false, &[]).await;

    match result {
        Err(Error::Request { status, ref body, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("expected Request error, got: {:?}", other.map(|_| ())),
    }
}

// ── Stats ───────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_are_normalized_with_partition_decoding() {
    let (server, client) = setup().await;

    let body = json!({
        "entries": {
            "https://localhost/mgmt/tm/cm/traffic-group/~Common~tg1:~Common~bigip1.local.net/stats": {
                "nestedStats": { "entries": { "failoverState": { "description": "active" } } }
            },
            "https://localhost/mgmt/tm/cm/traffic-group/~Prod~tg2:~Prod~bigip2.local.net/stats": {
                "nestedStats": { "entries": { "failoverState": { "description": "standby" } } }
            },
        }
    });

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/cm/traffic-group/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let records = client
        .get_object_stats(Module::Cm, "traffic-group", &[])
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "tg1");
    assert_eq!(records[0].partition.as_deref(), Some("Common"));
    assert_eq!(records[1].name, "tg2");
    assert_eq!(records[1].partition.as_deref(), Some("Prod"));
    assert_eq!(
        records[0].stats["entries"]["failoverState"]["description"],
        "active"
    );
}

// ── Typed listings ──────────────────────────────────────────────────

#[tokio::test]
async fn data_group_listing_is_decoded() {
    let (server, client) = setup().await;

    let body = json!({
        "items": [
            {
                "name": "proxypass_web",
                "partition": "Prod",
                "type": "string",
                "records": [
                    { "name": "www.example.com/app", "data": "web_vs/app web_pool" },
                    { "name": "www.example.com/static" },
                ]
            },
            { "name": "empty_group" },
        ]
    });

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/data-group/internal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let groups = client.get_data_group_internal().await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "proxypass_web");
    assert_eq!(groups[0].partition, "Prod");
    assert_eq!(groups[0].records.len(), 2);
    assert_eq!(
        groups[0].records[0].data.as_deref(),
        Some("web_vs/app web_pool")
    );
    assert_eq!(groups[0].records[1].data, None);
    // Partition defaults to Common when the API omits it.
    assert_eq!(groups[1].partition, "Common");
    assert!(groups[1].records.is_empty());
}

#[tokio::test]
async fn rule_listing_exposes_bodies() {
    let (server, client) = setup().await;

    let body = json!({
        "items": [
            {
                "name": "proxy_pass_router",
                "partition": "Common",
                "apiAnonymous": "when HTTP_REQUEST {\n  pool web_pool\n}",
            },
            { "name": "_sys_auth_ldap", "partition": "Common" },
        ]
    });

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/rule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let rules = client.get_rules().await.unwrap();

    assert_eq!(rules.len(), 2);
    assert!(
        rules[0]
            .api_anonymous
            .as_deref()
            .unwrap()
            .contains("pool web_pool")
    );
    assert_eq!(rules[1].api_anonymous, None);
}
