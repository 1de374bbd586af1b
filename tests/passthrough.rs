//! Title lookup, news and chat: routes that relay the upstream answer.

use serde_json::{json, Value};

mod common;

use common::{closed_port, config_for, credentials, spawn_gateway, start_fixed_stub, StubResponse};

const ALL_KEYS: &[(&str, &str)] = &[
    ("OMDB_API_KEY", "omdb-key"),
    ("NEWSDATA_API_KEY", "news-key"),
    ("OPENAI_API_KEY", "sk-test"),
];

#[tokio::test]
async fn test_rate_limit_body_is_relayed_verbatim() {
    let stub = start_fixed_stub(StubResponse::raw(503, "application/json", r#"{"msg":"rate limited"}"#)).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway.get("/title-lookup/search?q=alien").await;

    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), r#"{"msg":"rate limited"}"#);
}

#[tokio::test]
async fn test_upstream_status_is_preserved() {
    for status in [404u16, 429, 500] {
        let stub = start_fixed_stub(StubResponse::json(status, json!({ "Error": "nope" }))).await;
        let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

        let res = gateway.get("/title-lookup/title?t=Alien").await;
        assert_eq!(res.status().as_u16(), status);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({ "Error": "nope" }));
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_relayed() {
    let stub = start_fixed_stub(StubResponse::raw(502, "text/html", "<html>bad gateway</html>")).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway.get("/news/entertainment").await;

    assert_eq!(res.status(), 502);
    assert_eq!(res.headers()["content-type"], "text/html");
    assert_eq!(res.text().await.unwrap(), "<html>bad gateway</html>");
}

#[tokio::test]
async fn test_title_search_query() {
    let stub = start_fixed_stub(StubResponse::json(200, json!({ "Search": [] }))).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway.get("/title-lookup/search?q=alien&type=movie").await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "Search": [] }));
    assert_eq!(stub.last_request().target(), "/?s=alien&type=movie&page=1&apikey=omdb-key");
}

#[tokio::test]
async fn test_title_id_wins_over_title() {
    let stub = start_fixed_stub(StubResponse::json(200, json!({ "Title": "Alien" }))).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    gateway.get("/title-lookup/title?i=tt0078748&t=Alien").await;
    assert_eq!(stub.last_request().target(), "/?i=tt0078748&plot=short&apikey=omdb-key");
}

#[tokio::test]
async fn test_title_lookup_validation() {
    let stub = start_fixed_stub(StubResponse::json(200, json!({}))).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway.get("/title-lookup/search").await;
    assert_eq!(res.status(), 400);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "q required" }));

    let res = gateway.get("/title-lookup/title?y=1979").await;
    assert_eq!(res.status(), 400);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "i or t required" }));

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_news_defaults() {
    let stub = start_fixed_stub(StubResponse::json(200, json!({ "status": "success", "results": [] }))).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway.get("/news/entertainment").await;
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "success", "results": [] }));
    assert_eq!(
        stub.last_request().target(),
        "/api/1/latest?language=en&q=movie+OR+tv+OR+netflix+OR+trailer+OR+film+OR+streaming&apikey=news-key"
    );

    gateway.get("/news/entertainment?q=oscars&page=abc123&language=fr").await;
    assert_eq!(
        stub.last_request().target(),
        "/api/1/latest?language=fr&page=abc123&q=oscars&apikey=news-key"
    );
}

#[tokio::test]
async fn test_news_missing_key() {
    let stub = start_fixed_stub(StubResponse::json(200, json!({}))).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(&[])).await;

    let res = gateway.get("/news/entertainment").await;
    assert_eq!(res.status(), 500);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "missing NEWSDATA_API_KEY" }));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_chat_forwards_only_allowed_fields() {
    let completion = json!({ "id": "chatcmpl-1", "choices": [] });
    let stub = start_fixed_stub(StubResponse::json(200, completion.clone())).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway
        .post_json(
            "/chat/completions",
            json!({
                "messages": [{ "role": "user", "content": "hello" }],
                "max_tokens": 64,
                "stream": true,
                "user": "someone"
            }),
        )
        .await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), completion);

    let request = stub.last_request();
    assert_eq!(request.request_line, "POST /v1/chat/completions HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
    assert_eq!(
        request.body_json(),
        json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "hello" }],
            "max_tokens": 64
        })
    );
}

#[tokio::test]
async fn test_chat_body_validation() {
    let stub = start_fixed_stub(StubResponse::json(200, json!({}))).await;
    let gateway = spawn_gateway(config_for(&stub.url()), credentials(ALL_KEYS)).await;

    let res = gateway.post_json("/chat/completions", json!({ "messages": [] })).await;
    assert_eq!(res.status(), 400);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "messages required" }));

    let res = gateway.post_raw("/chat/completions", "").await;
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "messages required" }));

    let res = gateway.post_raw("/chat/completions", "{not json").await;
    assert_eq!(res.status(), 400);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "invalid JSON body" }));

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_unreachable_upstream_is_operation_error() {
    let base = format!("http://{}", closed_port());
    let gateway = spawn_gateway(config_for(&base), credentials(ALL_KEYS)).await;

    let res = gateway
        .post_json("/chat/completions", json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .await;
    assert_eq!(res.status(), 500);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "openai-proxy-failed" }));

    let res = gateway.get("/title-lookup/search?q=alien").await;
    assert_eq!(res.status(), 500);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "omdb-search" }));
}

#[tokio::test]
async fn test_health() {
    let gateway = spawn_gateway(config_for("http://127.0.0.1:9"), credentials(&[])).await;

    let res = gateway.get("/health").await;
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "ok": true }));
}
