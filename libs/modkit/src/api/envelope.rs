use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Uniform body for every API response: `{success, message?, data?, errors?}`.
///
/// List endpoints additionally fill `total` or `pagination`; failures carry a
/// machine-readable `code` and the request id when one is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(
        default,
        rename = "requestId",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<String>,
}

/// One invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: usize,
    pub limit: u32,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
            total: None,
            pagination: None,
            code: None,
            request_id: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl Envelope<()> {
    /// Success without a payload, e.g. logout or password change.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            data: None,
            ..Self::success(())
        }
        .with_message(message)
    }

    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors: None,
            total: None,
            pagination: None,
            code: Some(code.into()),
            request_id: None,
        }
    }
}

/// Axum response wrapper that renders a failed [`Envelope`] with its status.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: StatusCode,
    pub body: Envelope<()>,
}

impl Failure {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Envelope::failure(code, message),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        if !errors.is_empty() {
            self.body.errors = Some(errors);
        }
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.body.request_id = Some(id.into());
        self
    }

    pub fn message(&self) -> &str {
        self.body.message.as_deref().unwrap_or_default()
    }

    pub fn code(&self) -> &str {
        self.body.code.as_deref().unwrap_or_default()
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self.body)).into_response()
    }
}

pub fn bad_request(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::BAD_REQUEST, "bad_request", message)
}

pub fn unauthorized(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn forbidden(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn not_found(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn conflict(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::CONFLICT, "conflict", message)
}

pub fn too_many_requests(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::TOO_MANY_REQUESTS, "rate_limited", message)
}

pub fn internal_error(message: impl Into<String>) -> Failure {
    Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_into_response_sets_status() {
        let resp = not_found("Evento no encontrado").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(ct, "application/json");
    }

    #[test]
    fn failure_body_shape() {
        let f = bad_request("Datos inválidos")
            .with_errors(vec![FieldError::new("email", "Debe ser un email válido")])
            .with_request_id("req-1");

        let json = serde_json::to_value(&f.body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Datos inválidos");
        assert_eq!(json["code"], "bad_request");
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["errors"][0]["field"], "email");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn empty_error_list_is_omitted() {
        let f = bad_request("x").with_errors(vec![]);
        assert!(f.body.errors.is_none());
    }

    #[test]
    fn success_body_shape() {
        let e = Envelope::success(vec![1, 2, 3]).with_total(3).with_message("ok");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 3);
        assert_eq!(json["data"][2], 3);
        assert!(json.get("errors").is_none());

        let bare = serde_json::to_value(Envelope::message_only("bye")).unwrap();
        assert_eq!(bare["success"], true);
        assert!(bare.get("data").is_none());
    }

    #[test]
    fn convenience_constructors() {
        assert_eq!(bad_request("a").status, StatusCode::BAD_REQUEST);
        assert_eq!(unauthorized("a").status, StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden("a").status, StatusCode::FORBIDDEN);
        assert_eq!(not_found("a").status, StatusCode::NOT_FOUND);
        assert_eq!(conflict("a").code(), "conflict");
        assert_eq!(too_many_requests("a").status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(internal_error("a").message(), "a");
    }
}
