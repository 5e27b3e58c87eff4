//! Shared fixtures: a wiremock Alloy endpoint and a gateway wired to it.

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use intake_gateway::{
    AlloyClient, ErrorBody, FixedClock, GatewayConfig, IntakeService, ProviderCredentials,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;

pub const TOKEN: &str = "workflow-token";
pub const SECRET: &str = "workflow-secret";
pub const EVALUATIONS_PATH: &str = "/v1/evaluations/";

/// Date every test runs "on"
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// A submission that passes every rule as of [`today`]
pub fn valid_submission() -> Value {
    json!({
        "name_first": "Jane",
        "name_last": "Doe",
        "email_address": "jane.doe@example.com",
        "phone_number": "555-123-4567",
        "address_line_1": "1 Main St",
        "address_line_2": "Apt 4",
        "address_city": "Albany",
        "address_state": "NY",
        "address_postal_code": "12207",
        "address_country_code": "US",
        "document_ssn": "123456789",
        "birth_date": "1990-05-20"
    })
}

/// Configuration pointing at `server`
pub fn config_for(server: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.provider.evaluations_url = format!("{}{}", server.uri(), EVALUATIONS_PATH);
    config.provider.credentials = ProviderCredentials::new(TOKEN, SECRET);
    config.provider.timeout = Duration::from_secs(2);
    config
}

/// Gateway using the real Alloy client against `config`
pub fn gateway(config: GatewayConfig) -> IntakeService {
    let client = AlloyClient::new(&config.provider).unwrap();
    IntakeService::with_provider(config, Arc::new(client), Arc::new(FixedClock(today()))).unwrap()
}

/// `POST /submit` as if sent from `peer`
pub fn submit(body: &Value, peer: [u8; 4]) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 51000))));
    req
}

/// Drive one request through the router and decode the JSON body
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Drive one request that is expected to fail and decode its error body
pub async fn send_error(app: &Router, req: Request<Body>) -> (StatusCode, ErrorBody) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_value(body).unwrap())
}
