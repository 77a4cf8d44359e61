use axum::{http::Uri, response::Json};
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn not_found(uri: Uri) -> modkit::Failure {
    tracing::debug!(path = %uri.path(), "no route matched");
    modkit::not_found(format!("Ruta no encontrada: {}", uri.path()))
}
