mod common;

use std::sync::Arc;
use std::time::Duration;

use common::test_retry_policy;
use farmguide::tools::{
    SearchOutcome, SearchProvider, SearchTool, TavilySearchProvider, ToolArguments,
    ToolExecutionContext, Tool,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tavily(server: &MockServer) -> TavilySearchProvider {
    TavilySearchProvider::new("tvly-test")
        .with_base_url(server.uri())
        .with_retry_policy(test_retry_policy(1))
}

#[tokio::test]
async fn tavily_request_shape_and_formatting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tvly-test"))
        .and(body_partial_json(json!({
            "query": "DAP fertilizer cotton",
            "search_depth": "basic",
            "max_results": 3,
            "include_raw_content": false,
            "include_images": false,
            "include_answer": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "DAP fertilizer cotton",
            "results": [
                {"url": "https://a.pk", "title": "DAP", "content": "18-46-0", "score": 0.91},
                {"url": "https://b.pk", "title": "Cotton", "content": "Apply at sowing", "score": 0.8}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tool = SearchTool::new(Arc::new(tavily(&server)));
    let out = tool.search("DAP fertilizer cotton").await;

    assert_eq!(
        out,
        "URL: https://a.pk\nTitle: DAP\nContent: 18-46-0\n---\n\n\
         URL: https://b.pk\nTitle: Cotton\nContent: Apply at sowing\n---\n"
    );
}

#[tokio::test]
async fn empty_results_return_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let out = SearchTool::new(Arc::new(tavily(&server))).search("zzz").await;
    assert_eq!(out, "No relevant results found.");
}

#[tokio::test]
async fn bare_string_response_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("Urea is 46% nitrogen.")))
        .mount(&server)
        .await;

    let outcome = tavily(&server).search("urea", 3).await.unwrap();
    assert_eq!(outcome, SearchOutcome::Text("Urea is 46% nitrogen.".into()));
}

#[tokio::test]
async fn http_errors_become_search_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": {"error": "Unauthorized: missing or invalid API key."}})),
        )
        .mount(&server)
        .await;

    let tool = SearchTool::new(Arc::new(tavily(&server)));
    let out = tool
        .execute(
            &ToolArguments::new(json!({"query": "urea"})),
            &ToolExecutionContext::default(),
        )
        .await
        .unwrap();
    let text = out.as_str().unwrap();
    assert!(text.starts_with("[Search Error]: "), "{text}");
    assert!(text.contains("missing or invalid API key"));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let provider = tavily(&server).with_retry_policy(test_retry_policy(2));
    let outcome = provider.search("urea", 3).await.unwrap();
    assert_eq!(outcome, SearchOutcome::Results(vec![]));
}

#[tokio::test]
async fn slow_backend_times_out_into_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = tavily(&server).with_timeout(Duration::from_millis(50));
    let out = SearchTool::new(Arc::new(provider)).search("urea").await;
    assert!(out.starts_with("[Search Error]: Timeout"), "{out}");
}

#[test]
fn tool_metadata_matches_prompt() {
    let tool = SearchTool::new(Arc::new(TavilySearchProvider::new("k")));
    assert_eq!(tool.name(), "web_search_tool");
    assert_eq!(
        tool.description(),
        "Searches for agricultural information using Tavily Search API."
    );
    assert_eq!(tool.parameters().schema["required"], json!(["query"]));
}
