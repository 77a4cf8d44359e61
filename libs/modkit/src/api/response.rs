use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::envelope::Envelope;

/// Successful response: a status code plus an [`Envelope`] body.
#[derive(Debug, Clone)]
pub struct ApiOk<T> {
    pub status: StatusCode,
    pub body: Envelope<T>,
}

impl<T> ApiOk<T> {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body = self.body.with_message(message);
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.body = self.body.with_total(total);
        self
    }

    pub fn with_pagination(mut self, pagination: super::envelope::Pagination) -> Self {
        self.body = self.body.with_pagination(pagination);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiOk<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// 200 OK + envelope
pub fn ok<T>(data: T) -> ApiOk<T> {
    ApiOk {
        status: StatusCode::OK,
        body: Envelope::success(data),
    }
}

/// 201 Created + envelope
pub fn created<T>(data: T) -> ApiOk<T> {
    ApiOk {
        status: StatusCode::CREATED,
        body: Envelope::success(data),
    }
}
