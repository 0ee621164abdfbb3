//! Tool layer integration tests using wiremock
//!
//! Drives the registry returned by `build_registry` against a fake Sensr
//! API and checks the upstream calls each tool makes.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sensorbio_mcp::auth::Credentials;
use sensorbio_mcp::client::SensrClient;
use sensorbio_mcp::config::ApiConfig;
use sensorbio_mcp::error::SensrError;
use sensorbio_mcp::tools::{build_registry, ToolRegistry};

fn registry(server: &MockServer) -> ToolRegistry {
    let config = ApiConfig {
        base_url: server.uri(),
        token_url: format!("{}/token", server.uri()),
        timeout_seconds: 5,
    };
    let client = SensrClient::new(
        &config,
        Credentials::OrgToken {
            value: "abc123".to_string(),
        },
    )
    .expect("client");
    build_registry(Arc::new(client), chrono_tz::America::Chicago)
}

fn page(users: Value, current: u64, total: u64) -> Value {
    json!({
        "data": users,
        "meta": {"current_page": current, "total_pages": total}
    })
}

#[tokio::test]
async fn test_list_users_maps_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users"))
        .and(query_param("page", "2"))
        .and(query_param("items_per_page", "25"))
        .and(query_param("q", "jane"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call("list_users", json!({"page": 2, "limit": 25, "search": "jane"}))
        .await
        .expect("list");
    assert_eq!(out, json!({"data": []}));
}

#[tokio::test]
async fn test_list_users_defaults_without_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users"))
        .and(query_param("page", "1"))
        .and(query_param("items_per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    registry(&server)
        .call("list_users", json!({"search": ""}))
        .await
        .expect("list");

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests[0].url.query_pairs().all(|(k, _)| k != "q"));
}

#[tokio::test]
async fn test_get_user_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users/ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ids": ["u1", "u2"]})))
        .expect(1)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call("get_user_ids", Value::Null)
        .await
        .expect("ids");
    assert_eq!(out, json!({"ids": ["u1", "u2"]}));
}

#[tokio::test]
async fn test_get_user_by_email_scans_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users"))
        .and(query_param("page", "1"))
        .and(query_param("items_per_page", "200"))
        .and(query_param("q", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"id": "u1", "email": "janet@example.com"}]),
            1,
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"id": "u2", "email": "JANE@example.com"}]),
            2,
            2,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call("get_user_by_email", json!({"email": "jane@example.com"}))
        .await
        .expect("lookup");
    assert_eq!(out["data"]["id"], "u2");
}

#[tokio::test]
async fn test_get_user_by_email_stops_at_last_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"id": "u1", "email": "other@example.com"}]),
            1,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call("get_user_by_email", json!({"email": "jane@example.com"}))
        .await
        .expect("lookup");
    assert_eq!(out, json!({"data": null}));
}

#[tokio::test]
async fn test_get_sleep_with_explicit_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sleep"))
        .and(query_param("user_id", "u1"))
        .and(query_param("date", "2024-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"score": 88}})))
        .expect(1)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call("get_sleep", json!({"user_id": "u1", "date": "2024-03-01"}))
        .await
        .expect("sleep");
    assert_eq!(out["data"]["score"], 88);
}

#[tokio::test]
async fn test_get_scores_defaults_to_today() {
    let server = MockServer::start().await;
    let today = chrono::Utc::now()
        .with_timezone(&chrono_tz::America::Chicago)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string();
    Mock::given(method("GET"))
        .and(path("/v1/scores"))
        .and(query_param("user_id", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    registry(&server)
        .call("get_scores", json!({"user_id": "u1"}))
        .await
        .expect("scores");

    let requests = server.received_requests().await.expect("recording enabled");
    let date = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "date")
        .map(|(_, v)| v.into_owned())
        .expect("date param");
    // Allow for a midnight rollover between computing `today` and the call.
    assert!(date >= today, "{date} < {today}");
}

#[tokio::test]
async fn test_get_calories_defaults_granularity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/calorie/details"))
        .and(query_param("user_id", "u1"))
        .and(query_param("date", "2024-03-01"))
        .and(query_param("granularity", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 2100})))
        .expect(1)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call("get_calories", json!({"user_id": "u1", "date": "2024-03-01"}))
        .await
        .expect("calories");
    assert_eq!(out["total"], 2100);
}

#[tokio::test]
async fn test_invalid_granularity_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = registry(&server)
        .call("get_calories", json!({"user_id": "u1", "granularity": "hourly"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SensrError>(),
        Some(SensrError::InvalidArguments(_))
    ));
}

#[tokio::test]
async fn test_get_activities_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/activities"))
        .and(query_param("user_id", "u1"))
        .and(query_param("last-timestamp", "0"))
        .and(query_param("limit", "50"))
        .and(query_param("cursor", "next-page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "links": {}})))
        .expect(1)
        .mount(&server)
        .await;

    registry(&server)
        .call("get_activities", json!({"user_id": "u1", "cursor": "next-page"}))
        .await
        .expect("activities");
}

#[tokio::test]
async fn test_get_biometrics_upstream_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/biometrics"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad last-timestamp"))
        .mount(&server)
        .await;

    let err = registry(&server)
        .call("get_biometrics", json!({"user_id": "u1", "last_timestamp": -1}))
        .await
        .unwrap_err();
    match err.downcast_ref::<SensrError>() {
        Some(SensrError::Upstream { status, body }) => {
            assert_eq!(*status, Some(400));
            assert_eq!(body, "bad last-timestamp");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_debug_request_tool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users/ids"))
        .and(query_param("trace", "1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let out = registry(&server)
        .call(
            "debug_request",
            json!({"path": "/v1/organizations/users/ids", "query": {"trace": "1"}}),
        )
        .await
        .expect("report");
    assert_eq!(out["status"], 401);
    assert_eq!(out["body_preview"], "unauthorized");
}

#[tokio::test]
async fn test_get_sleep_range_calls_each_day_in_order() {
    let server = MockServer::start().await;
    for (date, score) in [("2024-02-28", 70), ("2024-02-29", 75), ("2024-03-01", 80)] {
        Mock::given(method("GET"))
            .and(path("/v1/sleep"))
            .and(query_param("user_id", "u1"))
            .and(query_param("date", date))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"score": score}})),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let out = registry(&server)
        .call(
            "get_sleep",
            json!({"user_id": "u1", "start_date": "2024-02-28", "end_date": "2024-03-01"}),
        )
        .await
        .expect("sleep range");

    assert_eq!(out["range"]["days"], 3);
    assert_eq!(out["range"]["start_date"], "2024-02-28");
    assert_eq!(out["range"]["end_date"], "2024-03-01");
    let results = out["results"].as_array().expect("results");
    assert_eq!(results.len(), 3);
    assert_eq!(results[1]["date"], "2024-02-29");
    assert_eq!(results[1]["data"], json!({"data": {"score": 75}}));
}

#[tokio::test]
async fn test_get_scores_days_window_fails_on_first_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/scores"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = registry(&server)
        .call("get_scores", json!({"user_id": "u1", "days": 3}))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SensrError>(),
        Some(SensrError::Upstream {
            status: Some(503),
            ..
        })
    ));
}

#[tokio::test]
async fn test_reversed_range_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for (tool, args) in [
        (
            "get_scores",
            json!({"user_id": "u1", "start_date": "2024-03-02", "end_date": "2024-03-01"}),
        ),
        ("get_sleep", json!({"user_id": "u1", "days": 0})),
        ("get_org_sleep_summary", json!({"days": -1})),
    ] {
        let err = registry(&server).call(tool, args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SensrError>(),
            Some(SensrError::InvalidArguments(_))
        ));
    }
}

#[tokio::test]
async fn test_get_biometrics_forwards_window_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/biometrics"))
        .and(query_param("user_id", "u1"))
        .and(query_param("last-timestamp", "1700000000000"))
        .and(query_param("end-timestamp", "1700086400000"))
        .and(query_param("start-date", "2023-11-14"))
        .and(query_param("end-date", "2023-11-15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    registry(&server)
        .call(
            "get_biometrics",
            json!({
                "user_id": "u1",
                "start_timestamp_ms": 1700000000000i64,
                "end_timestamp_ms": 1700086400000i64,
                "start_date": "2023-11-14",
                "end_date": "2023-11-15"
            }),
        )
        .await
        .expect("biometrics");
}

#[tokio::test]
async fn test_org_sleep_summary_collects_per_day_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users/ids"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"user_ids": ["u1", "u2", "u3"]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sleep"))
        .and(query_param("user_id", "u2"))
        .and(query_param("date", "2024-03-02"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sleep"))
        .and(query_param("user_id", "u3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sleep"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"hours": 7}})))
        .expect(3)
        .mount(&server)
        .await;

    let out = registry(&server)
        .call(
            "get_org_sleep_summary",
            json!({
                "start_date": "2024-03-01",
                "end_date": "2024-03-02",
                "max_users": 2,
                "concurrency": 2
            }),
        )
        .await
        .expect("summary");

    assert_eq!(out["range"]["dates"], json!(["2024-03-01", "2024-03-02"]));

    let users = out["users"].as_array().expect("users");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["user_id"], "u1");
    assert_eq!(users[0]["summary"]["days"], 2);
    assert_eq!(users[1]["user_id"], "u2");
    assert_eq!(users[1]["days"].as_array().map(Vec::len), Some(1));
    assert_eq!(users[1]["summary"]["end_date"], "2024-03-01");

    let errors = out["errors"].as_array().expect("errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["user_id"], "u2");
    assert_eq!(errors[0]["date"], "2024-03-02");
    assert_eq!(errors[0]["status"], 500);
    assert_eq!(errors[0]["body"], "boom");
}

#[tokio::test]
async fn test_org_scores_summary_rejects_unexpected_id_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/users/ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "nope"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/scores"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = registry(&server)
        .call("get_org_scores_summary", json!({"date": "2024-03-01"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SensrError>(),
        Some(SensrError::Upstream { .. })
    ));
}
