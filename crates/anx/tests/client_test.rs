//! Request preparation, verbs, classification and paging through the client.


use anx::{
    AnxApi, AnxConfig, AnxErrorKind, ApiErrorKind, Method, RateClass, RequestErrorKind,
    RequestOptions, Response, status_ok,
};
use client_test_helpers::{RecordingTransport, test_config};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_missing_target_rejected_before_sending() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::with_transport(AnxConfig::default(), transport.shared())
        .expect("valid config");

    let err = api.get("/user").await.unwrap_err();

    match err.kind() {
        AnxErrorKind::Request(request) => assert_eq!(request.kind, RequestErrorKind::TargetNotSet),
        other => panic!("expected request error, got {other}"),
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_get_prepares_headers_and_uri() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    api.get("/user").await.expect("get");

    let sent = transport.last();
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.uri, "https://api.test/user");
    assert_eq!(sent.header("authorization"), Some("hbapi:1:secret"));
    assert_eq!(sent.header("accept"), Some("application/json"));
    assert_eq!(sent.header("content-type"), None);
    assert_eq!(sent.header("user-agent"), Some(anx::DEFAULT_USER_AGENT));
    assert_eq!(sent.timeout, Some(Duration::from_secs(60)));
}

#[tokio::test]
async fn test_post_and_put_send_json_body() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    api.post("/creative", json!({ "creative": { "name": "a" } }))
        .await
        .expect("post");
    let sent = transport.last();
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.header("content-type"), Some("application/json"));
    assert_eq!(sent.body, Some(json!({ "creative": { "name": "a" } })));

    api.put("/creative?id=1", json!({})).await.expect("put");
    assert_eq!(transport.last().method, Method::Put);

    api.delete("/creative?id=1").await.expect("delete");
    let sent = transport.last();
    assert_eq!(sent.method, Method::Delete);
    assert_eq!(sent.body, None);
}

#[tokio::test]
async fn test_no_auth_and_mime_type() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let options = RequestOptions::builder()
        .method(Method::Post)
        .uri("/upload")
        .mime_type("text/csv".to_string())
        .no_auth(true)
        .body(json!("a,b\n1,2"))
        .build()
        .expect("options");
    api.request(options).await.expect("request");

    let sent = transport.last();
    assert_eq!(sent.header("authorization"), None);
    assert_eq!(sent.header("accept"), Some("text/csv"));
    assert_eq!(sent.header("content-type"), Some("text/csv"));
}

#[tokio::test]
async fn test_caller_headers_override_defaults() {
    let transport = RecordingTransport::ok();
    let mut config = test_config();
    config.headers.insert("X-Team".to_string(), "ads".to_string());
    let api = AnxApi::with_transport(config, transport.shared()).expect("valid config");

    let mut options = RequestOptions::from("/report");
    options.headers.insert("accept".to_string(), "text/plain".to_string());
    options.timeout = Some(Duration::from_secs(5));
    api.request(options).await.expect("request");

    let sent = transport.last();
    assert_eq!(sent.header("accept"), Some("text/plain"));
    assert_eq!(sent.header("x-team"), Some("ads"));
    assert_eq!(
        sent.headers.keys().filter(|k| k.eq_ignore_ascii_case("accept")).count(),
        1
    );
    assert_eq!(sent.timeout, Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_paging_params_appended() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let mut options = RequestOptions::from("/creative");
    options.num_elements = Some(25);
    api.request(options).await.expect("request");
    assert_eq!(
        transport.last().uri,
        "https://api.test/creative?num_elements=25&start_element=0"
    );

    let mut options = RequestOptions::from("/creative?advertiser_id=7");
    options.start_element = Some(50);
    api.request(options).await.expect("request");
    assert_eq!(
        transport.last().uri,
        "https://api.test/creative?advertiser_id=7&start_element=50"
    );
}

#[tokio::test]
async fn test_encoded_params() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let mut options = RequestOptions::from("/search");
    options.params.insert("q".to_string(), "a&b".to_string());
    options.encode_params = true;
    api.request(options).await.expect("request");

    assert_eq!(transport.last().uri, "https://api.test/search?q=a%26b");
}

#[tokio::test]
async fn test_before_request_hook_applied() {
    let transport = RecordingTransport::ok();
    let api = AnxApi::builder(test_config())
        .transport(transport.shared())
        .before_request(|options| {
            options
                .headers
                .insert("X-Request-Id".to_string(), "42".to_string());
        })
        .build()
        .expect("valid config");

    api.get("/user").await.expect("get");

    assert_eq!(transport.last().header("x-request-id"), Some("42"));
}

#[tokio::test]
async fn test_error_status_classified() {
    let transport = RecordingTransport::new(|_| {
        Response::new(
            401,
            json!({ "response": { "error_id": "NOAUTH", "error": "Authentication failed" } }),
        )
    });
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let err = api.get("/user").await.unwrap_err();

    let api_err = err.as_api().expect("api error");
    assert_eq!(api_err.kind, ApiErrorKind::NotAuthenticated);
    assert_eq!(api_err.message, "Authentication failed");
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn test_system_error_on_success_status() {
    let transport = RecordingTransport::new(|_| {
        Response::new(
            200,
            json!({ "response": { "error_id": "SYSTEM", "error_code": "SERVICE_UNAVAILABLE" } }),
        )
    });
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let err = api.get("/user").await.unwrap_err();

    assert_eq!(
        err.as_api().map(|e| e.kind.clone()),
        Some(ApiErrorKind::ServiceUnavailable)
    );
}

#[tokio::test]
async fn test_after_request_can_rewrite_response() {
    let transport = RecordingTransport::new(|_| Response::new(404, json!({})));
    let api = AnxApi::builder(test_config())
        .transport(transport.shared())
        .after_request(|response| {
            if response.status_code == 404 {
                response.status_code = 200;
                response.body = json!({ "response": { "status": "OK", "missing": true } });
            }
        })
        .build()
        .expect("valid config");

    let response = api.get("/maybe").await.expect("rewritten response");

    assert!(status_ok(&response.body));
    assert_eq!(response.body["response"]["missing"], true);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_rejection_without_hint_surfaces() {
    let transport = RecordingTransport::new(|_| Response::new(429, json!({})));
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let err = api.post("/creative", json!({})).await.unwrap_err();

    assert!(err.is_rate_limit());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_limit_header_reaches_limiter() {
    let transport = RecordingTransport::new(|_| {
        Response::new(200, json!({ "response": { "status": "OK" } }))
            .with_header("X-RateLimit-Read", "40")
    });
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    api.get("/user").await.expect("get");

    let limiter = api.limiter().expect("rate limiting on by default");
    assert_eq!(limiter.queue(RateClass::Read).limit(), 40);
    assert_eq!(limiter.queue(RateClass::Write).limit(), 60);
}

#[tokio::test]
async fn test_rate_limiting_can_be_disabled() {
    let transport = RecordingTransport::ok();
    let mut config = test_config();
    config.rate_limiting = false;
    let api = AnxApi::with_transport(config, transport.shared()).expect("valid config");

    assert!(api.limiter().is_none());
    api.get("/user").await.expect("get");
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_from_config() {
    let transport = RecordingTransport::with_delay(Duration::from_millis(100), |_| {
        Response::new(200, json!({ "response": { "status": "OK" } }))
    });
    let mut config = test_config();
    config.concurrency_limit = Some(1);
    let api = AnxApi::with_transport(config, transport.shared()).expect("valid config");

    let (a, b, c) = tokio::join!(api.get("/a"), api.get("/b"), api.get("/c"));

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(transport.max_running(), 1);
}

fn creatives_page(options: &RequestOptions) -> Response {
    let start: u64 = options.params["start_element"].parse().expect("start");
    let num: u64 = options.params["num_elements"].parse().expect("num");
    let items: Vec<_> = (start..(start + num).min(5))
        .map(|id| json!({ "id": id }))
        .collect();
    Response::new(
        200,
        json!({
            "response": {
                "status": "OK",
                "count": 5,
                "start_element": start,
                "num_elements": num,
                "creatives": items,
                "dbg_info": { "output_term": "creatives", "time": 1.5 }
            }
        }),
    )
}

#[tokio::test]
async fn test_get_all_concatenates_pages() {
    let transport = RecordingTransport::new(creatives_page);
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let mut options = RequestOptions::from("/creative");
    options.num_elements = Some(2);
    let response = api.get_all(options).await.expect("get_all");

    let merged = &response.body["response"];
    assert_eq!(merged["count"], 5);
    assert_eq!(merged["start_element"], 0);
    assert_eq!(merged["num_elements"], 5);
    assert_eq!(merged["dbg_info"]["output_term"], "creatives");
    assert_eq!(merged["dbg_info"]["time"], 4.5);
    let ids: Vec<u64> = merged["creatives"]
        .as_array()
        .expect("array")
        .iter()
        .map(|c| c["id"].as_u64().expect("id"))
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    let starts: Vec<String> = transport
        .requests()
        .iter()
        .map(|r| r.params["start_element"].clone())
        .collect();
    assert_eq!(starts, vec!["0", "2", "4"]);
}

#[tokio::test]
async fn test_get_all_default_page_size() {
    let transport = RecordingTransport::new(creatives_page);
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let response = api.get_all("/creative").await.expect("get_all");

    assert_eq!(response.body["response"]["count"], 5);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.last().params["num_elements"], "100");
}

#[tokio::test]
async fn test_get_all_rejects_page_without_ok_status() {
    let transport = RecordingTransport::new(|_| {
        Response::new(200, json!({ "response": { "status": "error" } }))
    });
    let api = AnxApi::with_transport(test_config(), transport.shared()).expect("valid config");

    let err = api.get_all("/creative").await.unwrap_err();

    assert_eq!(err.as_api().map(|e| e.kind.clone()), Some(ApiErrorKind::Api));
}

#[tokio::test]
async fn test_stability_warnings_fire_once() {
    let api = AnxApi::with_transport(test_config(), RecordingTransport::ok().shared())
        .expect("valid config");
    let warnings = api.stability();

    assert!(warnings.experimental("search", "Creative"));
    assert!(!warnings.experimental("search", "Creative"));
    assert!(warnings.deprecated("list", "Creative", "search"));
    assert!(!warnings.deprecated("list", "Creative", "search"));
    assert!(warnings.deprecated("list", "Creative", "query"));
}
