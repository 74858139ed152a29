mod common;

use common::{
    http_response, json_response, refused_url, spawn_fixed, spawn_server, spawn_silent,
    venue_ok, PKCS8_PEM, TEST_API_KEY, TEST_TIMESTAMP,
};
use flowradar::core::clock::ManualClock;
use flowradar::core::config::ExchangeConfig;
use flowradar::core::errors::{ErrorKind, ExchangeError};
use flowradar::core::kernel::{
    PublicTransport, RequestParams, ReqwestRest, RestClient, MAX_ERROR_BODY_CHARS,
};
use flowradar::exchanges::bybit::build_rest_client;
use flowradar::RequestOutcome;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

fn client_for(base_url: &str) -> ReqwestRest {
    let config = ExchangeConfig::new(TEST_API_KEY.to_string(), PKCS8_PEM.to_string())
        .base_url(base_url.to_string())
        .timeout_seconds(1);
    build_rest_client(&config, Arc::new(ManualClock::from_millis(TEST_TIMESTAMP))).unwrap()
}

#[cfg(test)]
mod response_classification {
    use super::*;

    #[tokio::test]
    async fn test_success_returns_payload() {
        let server = spawn_fixed(venue_ok(json!({"list": []}))).await;
        let rest = client_for(&server.base_url);

        let params = RequestParams::new().with("category", "linear");
        let outcome = rest.request(Method::GET, "/v5/order/realtime", params).await;

        let payload = outcome.into_success().unwrap();
        assert_eq!(payload["result"]["list"], json!([]));

        let captured = server.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].target(), "/v5/order/realtime?category=linear");
        assert_eq!(captured[0].header("x-bapi-api-key").as_deref(), Some(TEST_API_KEY));
        assert!(captured[0].header("x-bapi-sign").is_some());
    }

    #[tokio::test]
    async fn test_non_json_is_protocol_error_with_truncated_body() {
        let html = format!("<html>{}</html>", "x".repeat(1000));
        let server = spawn_fixed(http_response(200, "OK", "text/html", &html)).await;
        let rest = client_for(&server.base_url);

        let err = rest
            .signed_request(Method::GET, "/v5/position/list", RequestParams::new())
            .await
            .unwrap_err();

        match err {
            ExchangeError::ProtocolError { status, message } => {
                assert_eq!(status, None);
                assert!(message.contains("<html>"));
                assert!(message.len() < MAX_ERROR_BODY_CHARS + 64);
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_429_is_rate_limited() {
        let server = spawn_fixed(json_response(429, &json!({"message": "slow down"}))).await;
        let rest = client_for(&server.base_url);

        let err = rest.get_json("/v5/market/tickers").await.unwrap_err();
        assert!(matches!(err, ExchangeError::RateLimited(_)));
        assert!(err.is_retryable());
        assert_eq!(err.code(), 429);
    }

    #[tokio::test]
    async fn test_server_error_is_protocol_error_with_status() {
        let server = spawn_fixed(json_response(500, &json!({"error": "boom"}))).await;
        let rest = client_for(&server.base_url);

        let outcome = rest.public_request("/v5/market/tickers").await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::Protocol);
        assert_eq!(failure.code, 500);
        assert!(!failure.is_retryable());
    }

    #[tokio::test]
    async fn test_embedded_ret_code_is_venue_error() {
        let body = json!({
            "retCode": 110_007,
            "retMsg": "ab not enough for new order",
            "result": {}
        });
        let server = spawn_fixed(json_response(200, &body)).await;
        let rest = client_for(&server.base_url);

        let params = RequestParams::new().with("symbol", "BTCUSDT");
        let outcome = rest.request(Method::POST, "/v5/order/create", params).await;

        match outcome {
            RequestOutcome::Failure(failure) => {
                assert_eq!(failure.kind, ErrorKind::Venue);
                assert_eq!(failure.code, 110_007);
                assert!(failure.message.contains("ab not enough"));
            }
            other => panic!("expected venue failure, got {:?}", other),
        }

        let captured = server.captured();
        assert_eq!(captured[0].body, r#"{"symbol":"BTCUSDT"}"#);
    }

    #[tokio::test]
    async fn test_venue_throttle_code_is_rate_limited() {
        let body = json!({"retCode": 10006, "retMsg": "Too many visits!", "result": {}});
        let server = spawn_fixed(json_response(200, &body)).await;
        let rest = client_for(&server.base_url);

        let err = rest
            .signed_request(Method::GET, "/v5/account/wallet-balance", RequestParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::RateLimited(_)));
    }
}

#[cfg(test)]
mod transport_failures {
    use super::*;

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let rest = client_for(&refused_url().await);

        let outcome = rest
            .request(Method::GET, "/v5/position/list", RequestParams::new())
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::Transport);
        assert_eq!(failure.code, -1);
        assert!(failure.is_retryable());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let rest = client_for(&spawn_silent().await);

        let started = std::time::Instant::now();
        let err = rest.get_json("/v5/market/tickers").await.unwrap_err();
        assert!(matches!(err, ExchangeError::TransportError(_)));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}

#[cfg(test)]
mod proxy_routing {
    use super::*;

    #[tokio::test]
    async fn test_signed_and_public_requests_go_through_proxy() {
        let proxy = spawn_server(|_| venue_ok(json!({"list": []}))).await;

        let config = ExchangeConfig::new(TEST_API_KEY.to_string(), PKCS8_PEM.to_string())
            .base_url("http://venue.invalid".to_string())
            .proxy_url(proxy.base_url.clone())
            .timeout_seconds(2);
        let rest =
            build_rest_client(&config, Arc::new(ManualClock::from_millis(TEST_TIMESTAMP))).unwrap();

        rest.signed_request(
            Method::GET,
            "/v5/position/list",
            RequestParams::new().with("category", "linear"),
        )
        .await
        .unwrap();
        rest.signed_request(
            Method::POST,
            "/v5/order/cancel",
            RequestParams::new().with("orderId", "1"),
        )
        .await
        .unwrap();
        rest.get_json("http://provider.invalid/api/v3/ticker/24hr?symbol=BTCUSDT")
            .await
            .unwrap();

        let captured = proxy.captured();
        let mut targets: Vec<String> = captured.iter().map(|r| r.request_line.clone()).collect();
        targets.sort();
        assert_eq!(
            targets,
            vec![
                "GET http://provider.invalid/api/v3/ticker/24hr?symbol=BTCUSDT HTTP/1.1",
                "GET http://venue.invalid/v5/position/list?category=linear HTTP/1.1",
                "POST http://venue.invalid/v5/order/cancel HTTP/1.1",
            ]
        );
    }

    #[test]
    fn test_invalid_proxy_fails_at_build() {
        let config = ExchangeConfig::read_only().proxy_url("not a proxy url".to_string());
        let err = build_rest_client(&config, Arc::new(ManualClock::from_millis(0))).unwrap_err();
        assert!(matches!(err, ExchangeError::ConfigurationError(_)));
    }
}
