#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use events::config::EventsConfig;
use events::contract::model::{Attendee, EventView, NewEvent};
use events::domain::ports::PasswordHasher;
use events::Services;
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "Admin_123";

/// Stores passwords as-is so tests do not pay for argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        Ok(format!("plain:{plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool> {
        Ok(hash.strip_prefix("plain:") == Some(plaintext))
    }
}

pub fn config() -> EventsConfig {
    EventsConfig {
        token_secret: Some("test-secret".into()),
        admin_password: Some(ADMIN_PASSWORD.into()),
        ..Default::default()
    }
}

pub async fn services_with(cfg: EventsConfig) -> Arc<Services> {
    Arc::new(
        Services::build(&cfg, Arc::new(PlainHasher))
            .await
            .expect("services build"),
    )
}

/// Services with no demo events.
pub async fn empty_services() -> Arc<Services> {
    services_with(EventsConfig {
        seed_demo_events: false,
        ..config()
    })
    .await
}

pub fn router(services: Arc<Services>) -> Router {
    events::api::rest::routes::register_routes(Router::new(), services).expect("routes")
}

pub async fn app() -> (Router, Arc<Services>) {
    let services = services_with(config()).await;
    (router(services.clone()), services)
}

pub fn attendee(name: &str, email: &str) -> Attendee {
    Attendee {
        name: name.into(),
        email: email.into(),
        phone: "987654321".into(),
    }
}

pub async fn event_with_capacity(services: &Services, capacity: i64) -> EventView {
    services
        .catalog
        .create_event(NewEvent {
            name: "Taller de prueba".into(),
            description: None,
            location: "Lima".into(),
            date: "2025-03-01".into(),
            time: "10:00".into(),
            capacity: Some(capacity),
            price: Some(0.0),
            category: "Educación".into(),
            image: None,
        })
        .await
        .expect("create event")
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, token, None).await
}

pub async fn login(app: &Router, identifier: &str, password: &str) -> String {
    let (status, body) = post(
        app,
        "/api/auth/login",
        None,
        serde_json::json!({ "identifier": identifier, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

pub async fn admin_token(app: &Router) -> String {
    login(app, "admin", ADMIN_PASSWORD).await
}

/// Registers a user and returns `(id, token)`.
pub async fn register(app: &Router, username: &str, email: &str) -> (u64, String) {
    let (status, body) = post(
        app,
        "/api/auth/register",
        None,
        serde_json::json!({ "username": username, "email": email, "password": "clave_123" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["data"]["user"]["id"].as_u64().unwrap(),
        body["data"]["token"].as_str().unwrap().to_string(),
    )
}
