use axum::{Extension, Json};
use modkit::{ok, ApiOk, Envelope, Failure, JsonBody, PathParam, QueryParams};
use tracing::info;

use crate::api::rest::auth::{AdminUser, AuthUser};
use crate::api::rest::dto::{
    user_page_parts, ChangePasswordReq, ListUsersQuery, ToggleStatusDto, UpdateUserReq, UserDto,
    UserStatsDto,
};
use crate::api::rest::handlers::{reject, Svc};
use crate::contract::model::{UserPatch, UserQuery};

const INVALID_UPDATE: &str = "Datos de actualización inválidos";

/// GET /users (admin)
pub async fn list_users(
    Extension(svc): Svc,
    AdminUser(_admin): AdminUser,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> Result<ApiOk<Vec<UserDto>>, Failure> {
    let query =
        UserQuery::try_from(query).map_err(|e| reject("list_users", &e, "Filtros inválidos"))?;
    let page = svc
        .accounts
        .list_users(&query)
        .await
        .map_err(|e| reject("list_users", &e, "Filtros inválidos"))?;
    let (items, pagination) = user_page_parts(page);
    Ok(ok(items).with_pagination(pagination))
}

/// GET /users/profile
pub async fn get_profile(
    Extension(svc): Svc,
    AuthUser(claims): AuthUser,
) -> Result<ApiOk<UserDto>, Failure> {
    let user = svc
        .accounts
        .get_user(claims.actor(), claims.id)
        .await
        .map_err(|e| reject("get_profile", &e, "Solicitud inválida"))?;
    Ok(ok(user.into()))
}

/// PUT /users/profile
pub async fn update_profile(
    Extension(svc): Svc,
    AuthUser(claims): AuthUser,
    JsonBody(req): JsonBody<UpdateUserReq>,
) -> Result<ApiOk<UserDto>, Failure> {
    let patch = UserPatch::try_from(req).map_err(|e| reject("update_profile", &e, INVALID_UPDATE))?;
    let user = svc
        .accounts
        .update_profile(claims.id, patch)
        .await
        .map_err(|e| reject("update_profile", &e, INVALID_UPDATE))?;
    Ok(ok(user.into()).with_message("Perfil actualizado exitosamente"))
}

/// PUT /users/password
pub async fn change_password(
    Extension(svc): Svc,
    AuthUser(claims): AuthUser,
    JsonBody(req): JsonBody<ChangePasswordReq>,
) -> Result<Json<Envelope<()>>, Failure> {
    svc.accounts
        .change_password(claims.id, &req.current_password, &req.new_password)
        .await
        .map_err(|e| reject("change_password", &e, "Datos de cambio de contraseña inválidos"))?;
    Ok(Json(Envelope::message_only(
        "Contraseña actualizada exitosamente",
    )))
}

/// GET /users/stats/overview (admin)
pub async fn stats(
    Extension(svc): Svc,
    AdminUser(_admin): AdminUser,
) -> Result<ApiOk<UserStatsDto>, Failure> {
    let stats = svc
        .accounts
        .stats()
        .await
        .map_err(|e| reject("stats", &e, "Solicitud inválida"))?;
    Ok(ok(stats.into()))
}

/// GET /users/{id} (admin or self)
pub async fn get_user(
    Extension(svc): Svc,
    AuthUser(claims): AuthUser,
    PathParam(id): PathParam<u64>,
) -> Result<ApiOk<UserDto>, Failure> {
    let user = svc
        .accounts
        .get_user(claims.actor(), id)
        .await
        .map_err(|e| reject("get_user", &e, "Solicitud inválida"))?;
    Ok(ok(user.into()))
}

/// PUT /users/{id} (admin)
pub async fn update_user(
    Extension(svc): Svc,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<u64>,
    JsonBody(req): JsonBody<UpdateUserReq>,
) -> Result<ApiOk<UserDto>, Failure> {
    info!(admin = admin.id, user_id = id, "Admin updating user");
    let patch = UserPatch::try_from(req).map_err(|e| reject("update_user", &e, INVALID_UPDATE))?;
    let user = svc
        .accounts
        .admin_update(id, patch)
        .await
        .map_err(|e| reject("update_user", &e, INVALID_UPDATE))?;
    Ok(ok(user.into()).with_message("Usuario actualizado exitosamente"))
}

/// DELETE /users/{id} (admin)
pub async fn delete_user(
    Extension(svc): Svc,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<u64>,
) -> Result<Json<Envelope<()>>, Failure> {
    info!(admin = admin.id, user_id = id, "Admin deleting user");
    svc.accounts
        .delete_user(id)
        .await
        .map_err(|e| reject("delete_user", &e, "Solicitud inválida"))?;
    Ok(Json(Envelope::message_only("Usuario eliminado exitosamente")))
}

/// POST /users/{id}/toggle-status (admin)
pub async fn toggle_status(
    Extension(svc): Svc,
    AdminUser(_admin): AdminUser,
    PathParam(id): PathParam<u64>,
) -> Result<ApiOk<ToggleStatusDto>, Failure> {
    let user = svc
        .accounts
        .toggle_status(id)
        .await
        .map_err(|e| reject("toggle_status", &e, "Solicitud inválida"))?;
    let verb = if user.active { "activado" } else { "desactivado" };
    Ok(ok(ToggleStatusDto::from(user)).with_message(format!("Usuario {verb} exitosamente")))
}
