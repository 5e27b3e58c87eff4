//! # Submission Flows
//!
//! `POST /submit` end to end: parse, validate, forward to the mocked Alloy
//! endpoint, relay or map the result.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use axum::http::StatusCode;
    use intake_gateway::ErrorBody;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUTHORIZATION: &str = "Basic d29ya2Zsb3ctdG9rZW46d29ya2Zsb3ctc2VjcmV0";

    // =============================================================================
    // SUCCESS PATH
    // =============================================================================

    #[tokio::test]
    async fn test_approved_application_is_relayed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EVALUATIONS_PATH))
            .and(header("authorization", AUTHORIZATION))
            .and(body_json(valid_submission()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status_code": 201,
                "summary": {"outcome": "Approved", "result": "success"},
                "evaluation_token": "S-abc123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();
        let (status, body) = send(&app, submit(&valid_submission(), [10, 1, 0, 1])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"outcome": "Approved", "evaluation_token": "S-abc123"}));
    }

    #[tokio::test]
    async fn test_unknown_fields_forwarded_verbatim() {
        let server = MockServer::start().await;
        let mut submission = valid_submission();
        submission["referral_code"] = json!("SPRING24");
        submission["meta"] = json!({"source": "web"});

        Mock::given(method("POST"))
            .and(path(EVALUATIONS_PATH))
            .and(body_json(submission.clone()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "summary": {"outcome": "Manual Review"},
                "evaluation_token": "S-def456"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();
        let (status, body) = send(&app, submit(&submission, [10, 1, 0, 2])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "Manual Review");
    }

    #[tokio::test]
    async fn test_missing_token_relayed_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"summary": {"outcome": "Denied"}})),
            )
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();
        let (status, body) = send(&app, submit(&valid_submission(), [10, 1, 0, 3])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"outcome": "Denied", "evaluation_token": null}));
    }

    // =============================================================================
    // VALIDATION NEVER REACHES THE PROVIDER
    // =============================================================================

    #[tokio::test]
    async fn test_invalid_submissions_not_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();

        let cases = [
            ("email_address", json!("not-an-email"), "Invalid email format"),
            ("phone_number", json!("12345"), "Phone number must be 10 digits"),
            ("birth_date", json!("05/20/1990"), "Invalid data format"),
            ("birth_date", json!("1990-02-30"), "Invalid data format"),
            ("birth_date", json!("1990-5-20"), "Date of Birth must be in YYYY-MM-DD format"),
            ("birth_date", json!("2010-01-01"), "Must be at least 18 years old"),
            ("address_postal_code", json!("1220"), "Postal code must be 5 digits"),
            ("document_ssn", json!("123-45-6789"), "SSN must be exactly 9 digits with no dashes"),
            ("address_state", json!("New York"), "State must be a 2-letter code (e.g., NY, CA)"),
            ("address_country_code", json!("MX"), "Country must be 'US'"),
            ("name_first", json!(""), "Missing required field: First Name"),
        ];

        for (i, (key, value, message)) in cases.into_iter().enumerate() {
            let mut submission = valid_submission();
            submission[key] = value;
            // Distinct peers keep the per-address quota out of the way
            let (status, body) = send_error(&app, submit(&submission, [10, 2, 0, i as u8])).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{key}");
            assert_eq!(body.error, message, "{key}");
        }
    }

    #[tokio::test]
    async fn test_optional_address_line_may_be_omitted() {
        let server = MockServer::start().await;
        let mut submission = valid_submission();
        submission.as_object_mut().unwrap().remove("address_line_2");

        Mock::given(method("POST"))
            .and(body_json(submission.clone()))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"summary": {"outcome": "Approved"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();
        let (status, _) = send(&app, submit(&submission, [10, 1, 0, 4])).await;
        assert_eq!(status, StatusCode::OK);
    }

    // =============================================================================
    // PROVIDER FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_provider_status_relayed() {
        for code in [400u16, 401, 422, 500, 200] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(code).set_body_json(json!({"error": "detail"})))
                .mount(&server)
                .await;

            let app = gateway(config_for(&server)).router();
            let (status, body) = send_error(&app, submit(&valid_submission(), [10, 3, 0, 1])).await;

            assert_eq!(status.as_u16(), code);
            assert_eq!(
                body,
                ErrorBody {
                    error: "Alloy API error".into()
                }
            );
        }
    }

    #[tokio::test]
    async fn test_provider_timeout_maps_to_504() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"summary": {"outcome": "Approved"}}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.provider.timeout = Duration::from_millis(200);
        let app = gateway(config).router();

        let (status, body) = send(&app, submit(&valid_submission(), [10, 3, 0, 2])).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body, json!({"error": "Request timed out. Please try again."}));
    }

    #[tokio::test]
    async fn test_unreachable_provider_maps_to_503() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);

        // Grab a free port and release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        config.provider.evaluations_url = format!("http://127.0.0.1:{}{}", port, EVALUATIONS_PATH);
        let app = gateway(config).router();

        let (status, body) = send(&app, submit(&valid_submission(), [10, 3, 0, 3])).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "Unable to connect to verification service"}));
    }

    #[tokio::test]
    async fn test_undecodable_success_maps_to_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();
        let (status, body) = send(&app, submit(&valid_submission(), [10, 3, 0, 4])).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "An unexpected error occurred"}));
        assert!(!body.to_string().contains("oops"));
    }

    #[tokio::test]
    async fn test_provider_outcome_counted_in_health() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let app = gateway(config_for(&server)).router();
        send(&app, submit(&valid_submission(), [10, 3, 0, 5])).await;

        let req = axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metrics"]["provider"]["errors"], 1);
        assert_eq!(body["metrics"]["provider"]["calls"], 1);
    }
}
