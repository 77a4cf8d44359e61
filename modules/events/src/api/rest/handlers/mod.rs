pub mod auth;
pub mod events;
pub mod users;

use std::sync::Arc;

use modkit::Failure;
use tracing::info;

use crate::api::rest::error::map_domain_error;
use crate::domain::error::DomainError;
use crate::module::Services;

pub(crate) type Svc = axum::Extension<Arc<Services>>;

/// Map and log a domain error for operation `op`.
pub(crate) fn reject(op: &'static str, e: &DomainError, invalid_message: &str) -> Failure {
    let failure = map_domain_error(e, invalid_message);
    if !failure.status.is_server_error() {
        info!(op, status = failure.status.as_u16(), error = %e, "Request rejected");
    }
    failure
}
