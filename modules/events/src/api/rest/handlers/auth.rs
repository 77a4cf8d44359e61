use axum::{Extension, Json};
use modkit::{created, ok, ApiOk, Envelope, Failure, JsonBody};
use tracing::{info, warn};

use crate::api::rest::auth::{AuthUser, ClientKey};
use crate::api::rest::dto::{AuthDto, LoginReq, MeDto, RegisterReq, SessionUserDto};
use crate::api::rest::error::INTERNAL_ERROR_MESSAGE;
use crate::api::rest::handlers::{reject, Svc};
use crate::contract::model::User;
use crate::domain::error::DomainError;
use crate::domain::session::Claims;
use crate::module::Services;

fn session_for(svc: &Services, user: &User) -> Result<AuthDto, Failure> {
    let token = svc.sessions.issue(user).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue session token");
        modkit::internal_error(INTERNAL_ERROR_MESSAGE)
    })?;
    Ok(AuthDto {
        user: SessionUserDto::from(user),
        token,
    })
}

/// POST /auth/register
pub async fn register(
    Extension(svc): Svc,
    JsonBody(req): JsonBody<RegisterReq>,
) -> Result<ApiOk<AuthDto>, Failure> {
    let user = svc
        .accounts
        .register(req.into())
        .await
        .map_err(|e| match e {
            DomainError::UsernameTaken { .. } | DomainError::EmailTaken { .. } => {
                modkit::conflict("El usuario o email ya está registrado")
            }
            e => reject("register", &e, "Datos de registro inválidos"),
        })?;
    info!(user_id = user.id, "User registered via API");
    Ok(created(session_for(&svc, &user)?).with_message("Usuario registrado exitosamente"))
}

/// POST /auth/login
///
/// Every attempt counts against the client's window, successful or not.
pub async fn login(
    Extension(svc): Svc,
    ClientKey(client): ClientKey,
    JsonBody(req): JsonBody<LoginReq>,
) -> Result<ApiOk<AuthDto>, Failure> {
    if let Err(limited) = svc.limiter.check_and_record(&client) {
        warn!(%client, retry_after = ?limited.retry_after, "Login rate limit hit");
        return Err(modkit::too_many_requests(
            "Demasiados intentos de inicio de sesión. Intenta de nuevo en 15 minutos.",
        ));
    }

    let user = svc
        .accounts
        .authenticate(&req.identifier, &req.password)
        .await
        .map_err(|e| reject("login", &e, "Datos de inicio de sesión inválidos"))?;
    Ok(ok(session_for(&svc, &user)?).with_message("Inicio de sesión exitoso"))
}

/// GET /auth/me
pub async fn me(AuthUser(claims): AuthUser) -> ApiOk<MeDto<Claims>> {
    ok(MeDto { user: claims })
}

/// POST /auth/logout
///
/// Tokens are stateless; the client discards its copy and it stays valid
/// until it expires.
pub async fn logout() -> Json<Envelope<()>> {
    Json(Envelope::message_only("Sesión cerrada exitosamente"))
}
