#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use mcq_admin::{router, store::MemorySheet, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub fn memory_state() -> AppState<MemorySheet> {
    AppState::new(MemorySheet::default(), None)
}

pub fn app(state: &AppState<MemorySheet>) -> Router {
    router(state.clone())
}

pub fn sample_body(subject: &str) -> Value {
    json!({
        "subject": subject,
        "topic": "Kinematics",
        "subtopic": "",
        "type": "Numerical",
        "question": "A ball falls for $2\\,s$. How far does it fall? ($g = 10\\,m/s^2$)",
        "optionA": "10 m",
        "optionB": "20 m",
        "optionC": "40 m",
        "optionD": "5 m",
        "correctOption": "B",
        "explanation": "",
        "difficulty": "Medium"
    })
}

/// Sends one request and returns the status with the body parsed as JSON
/// (`Value::Null` when the body is not JSON).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
    let resp = app
        .clone()
        .oneshot(builder.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond");

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn create(app: &Router, subject: &str) -> Value {
    let (status, record) = send(app, Method::POST, "/records", Some(sample_body(subject))).await;
    assert_eq!(status, StatusCode::CREATED);
    record
}
