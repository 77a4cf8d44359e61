//! Bearer-token extractors. Handlers receive validated claims as a value.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use modkit::Failure;

use crate::api::rest::error::INTERNAL_ERROR_MESSAGE;
use crate::domain::session::{Claims, SessionIssuer};

pub const TOKEN_REQUIRED: &str = "Token de acceso requerido";
pub const TOKEN_INVALID: &str = "Token inválido o expirado";
pub const ADMIN_REQUIRED: &str = "Permisos de administrador requeridos";

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut it = value.split_whitespace();
    match (it.next(), it.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(modkit::unauthorized(TOKEN_REQUIRED));
        };
        let Some(issuer) = parts.extensions.get::<Arc<SessionIssuer>>() else {
            tracing::error!("SessionIssuer extension missing from router");
            return Err(modkit::internal_error(INTERNAL_ERROR_MESSAGE));
        };
        match issuer.validate(token) {
            Ok(claims) => Ok(Self(claims)),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                Err(modkit::forbidden(TOKEN_INVALID))
            }
        }
    }
}

/// Authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.actor().is_admin() {
            return Err(modkit::forbidden(ADMIN_REQUIRED));
        }
        Ok(Self(claims))
    }
}

/// Rate-limit key for the calling client: its IP, or `unknown` when the
/// server was not started with connect info.
#[derive(Debug, Clone)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Self(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut b = Request::get("/");
        if let Some(a) = auth {
            b = b.header(AUTHORIZATION, a);
        }
        b.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[tokio::test]
    async fn client_key_falls_back_to_unknown() {
        let mut p = parts(None);
        let ClientKey(k) = ClientKey::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(k, "unknown");

        p.extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 5555))));
        let ClientKey(k) = ClientKey::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(k, "10.1.2.3");
    }
}
