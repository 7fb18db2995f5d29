use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use server::config::ServerConfig;
use server::state::AppState;

const API_KEY: &str = "test-api-key";

fn test_config(llm_base_url: &str) -> ServerConfig {
    ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_key: API_KEY.to_string(),
        llm_base_url: llm_base_url.to_string(),
        llm_api_key: "sk-test".to_string(),
        llm_model: "gpt-4o".to_string(),
        search_endpoint: "https://google.serper.dev/search".to_string(),
        search_api_key: None,
        tool_deadline: Duration::from_secs(5),
        tool_max_in_flight: 4,
    }
}

fn setup_server(llm_base_url: &str) -> TestServer {
    let state = AppState::new(test_config(llm_base_url));
    TestServer::new(server::app(state)).expect("failed to build test server")
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod company {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_401() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server
            .post("/api/company")
            .json(&json!({"company_name": "Anthropic"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_api_key_is_403() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server
            .post("/api/company")
            .add_header("x-api-key", "wrong")
            .json(&json!({"company_name": "Anthropic"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_known_company_record() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server
            .post("/api/company")
            .add_header("x-api-key", API_KEY)
            .json(&json!({"company_name": "anthropic"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["name"], "Anthropic");
        assert_eq!(body["founded_year"], 2021);
        assert!(body["funding_rounds"].as_array().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn test_unknown_company_gets_mock_record() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server
            .post("/api/company")
            .add_header("x-api-key", API_KEY)
            .json(&json!({"company_name": "Globex"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["name"], "Globex");
        assert_eq!(body["website"], "https://www.globex.com");
    }

    #[tokio::test]
    async fn test_empty_company_name_is_400() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server
            .post("/api/company")
            .add_header("x-api-key", API_KEY)
            .json(&json!({"company_name": "  "}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod chat {
    use super::*;

    #[tokio::test]
    async fn test_chat_round_trip_with_visualization() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "content": "{\"response\": \"Acme raised $5M over one round.\", \
                                    \"visualization\": {\"type\": \"bar_chart\", \"data\": {\"labels\": [\"Seed\"]}}}"
                    }
                }]
            })))
            .mount(&llm)
            .await;

        let server = setup_server(&llm.uri());
        let response = server
            .post("/api/chat")
            .add_header("x-api-key", API_KEY)
            .json(&json!({
                "query": "How much funding has Acme received?",
                "data": {"name": "Acme", "total_funding": 5000000}
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["response"], "Acme raised $5M over one round.");
        assert_eq!(body["visualization"]["type"], "bar_chart");
    }

    #[tokio::test]
    async fn test_chat_plain_text_reply() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Acme was founded in 2020."}}]
            })))
            .mount(&llm)
            .await;

        let server = setup_server(&llm.uri());
        let response = server
            .post("/api/chat")
            .add_header("x-api-key", API_KEY)
            .json(&json!({"query": "When was Acme founded?", "data": {}}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["response"], "Acme was founded in 2020.");
        assert!(body.get("visualization").is_none());
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_500() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&llm)
            .await;

        let server = setup_server(&llm.uri());
        let response = server
            .post("/api/chat")
            .add_header("x-api-key", API_KEY)
            .json(&json!({"query": "anything", "data": {}}))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_chat_requires_api_key() {
        let server = setup_server("http://127.0.0.1:1");

        let response = server
            .post("/api/chat")
            .json(&json!({"query": "anything", "data": {}}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
