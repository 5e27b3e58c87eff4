//! # Rate Limiting
//!
//! Quotas on `POST /submit`: 5 per minute per client address and 100 per
//! hour across all clients. Rejected requests never reach the provider.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn approving_server(expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({
                    "summary": {"outcome": "Approved"},
                    "evaluation_token": "S-1"
                })),
            )
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_per_address_quota() {
        let server = approving_server(6).await;
        let app = gateway(config_for(&server)).router();

        for _ in 0..5 {
            let (status, _) = send(&app, submit(&valid_submission(), [192, 168, 1, 10])).await;
            assert_eq!(status, StatusCode::OK);
        }

        let resp = app
            .clone()
            .oneshot(submit(&valid_submission(), [192, 168, 1, 10]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = resp.headers()["retry-after"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));

        let (_, body) = send(&app, submit(&valid_submission(), [192, 168, 1, 10])).await;
        assert_eq!(body["error"], "Rate limit exceeded: 5 per 1 minute");
        assert!(body["retry_after_ms"].as_u64().unwrap() > 0);

        // A different client still gets through
        let (status, _) = send(&app, submit(&valid_submission(), [192, 168, 1, 11])).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_global_quota_spans_clients() {
        let server = approving_server(3).await;
        let mut config = config_for(&server);
        config.rate_limit.global_per_hour = 3;
        let app = gateway(config).router();

        for i in 0..3u8 {
            let (status, _) = send(&app, submit(&valid_submission(), [172, 16, 0, i])).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, submit(&valid_submission(), [172, 16, 0, 99])).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limit exceeded: 3 per 1 hour");
    }

    #[tokio::test]
    async fn test_health_is_not_rate_limited() {
        let server = approving_server(0).await;
        let app = gateway(config_for(&server)).router();

        for _ in 0..20 {
            let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
            let (status, _) = send(&app, req).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_forwarded_header_ignored_by_default() {
        let server = approving_server(5).await;
        let app = gateway(config_for(&server)).router();

        // Rotating X-Forwarded-For does not escape the peer's quota
        for i in 0..6u8 {
            let mut req = submit(&valid_submission(), [10, 9, 9, 9]);
            req.headers_mut()
                .insert("x-forwarded-for", format!("203.0.113.{}", i).parse().unwrap());
            let (status, _) = send(&app, req).await;
            let expected = if i < 5 {
                StatusCode::OK
            } else {
                StatusCode::TOO_MANY_REQUESTS
            };
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_forwarded_header_trusted_when_enabled() {
        let server = approving_server(6).await;
        let mut config = config_for(&server);
        config.rate_limit.trust_forwarded_headers = true;
        let app = gateway(config).router();

        // Same peer, six different forwarded clients
        for i in 0..6u8 {
            let mut req = submit(&valid_submission(), [10, 9, 9, 9]);
            req.headers_mut()
                .insert("x-forwarded-for", format!("203.0.113.{}, 10.0.0.1", i).parse().unwrap());
            let (status, _) = send(&app, req).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_exempt_address_skips_per_address_quota() {
        let server = approving_server(7).await;
        let mut config = config_for(&server);
        config.rate_limit.exempt = vec!["10.10.10.10".parse().unwrap()];
        let app = gateway(config).router();

        for _ in 0..7 {
            let (status, _) = send(&app, submit(&valid_submission(), [10, 10, 10, 10])).await;
            assert_eq!(status, StatusCode::OK);
        }
    }
}
