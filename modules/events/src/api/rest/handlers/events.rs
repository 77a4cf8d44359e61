use axum::Extension;
use modkit::{created, ok, ApiOk, Failure, JsonBody, PathParam, QueryParams};
use tracing::info;

use crate::api::rest::auth::AdminUser;
use crate::api::rest::dto::{
    CreateEventReq, EnrollReq, EventDetailDto, EventViewDto, ListEventsQuery, MyRegistrationDto,
    MyRegistrationsQuery, RegistrationDto, UpdateEventReq, UpdateRegistrationReq,
};
use crate::api::rest::handlers::{reject, Svc};
use crate::contract::model::{EventFilter, EventPatch};
use crate::domain::error::DomainError;

/// GET /events
pub async fn list_events(
    Extension(svc): Svc,
    QueryParams(query): QueryParams<ListEventsQuery>,
) -> Result<ApiOk<Vec<EventViewDto>>, Failure> {
    let filter = EventFilter::try_from(query)
        .map_err(|e| reject("list_events", &e, "Filtros inválidos"))?;
    let events = svc
        .catalog
        .list(&filter)
        .await
        .map_err(|e| reject("list_events", &e, "Filtros inválidos"))?;

    let total = events.len();
    let data: Vec<EventViewDto> = events.into_iter().map(Into::into).collect();
    Ok(ok(data).with_total(total))
}

/// GET /events/{id}
pub async fn get_event(
    Extension(svc): Svc,
    PathParam(id): PathParam<u64>,
) -> Result<ApiOk<EventDetailDto>, Failure> {
    let detail = svc
        .catalog
        .get_detail(id)
        .await
        .map_err(|e| reject("get_event", &e, "Solicitud inválida"))?;
    Ok(ok(detail.into()))
}

/// POST /events (admin)
pub async fn create_event(
    Extension(svc): Svc,
    AdminUser(admin): AdminUser,
    JsonBody(req): JsonBody<CreateEventReq>,
) -> Result<ApiOk<EventViewDto>, Failure> {
    info!(admin = admin.id, "Creating event");
    let view = svc
        .catalog
        .create_event(req.into())
        .await
        .map_err(|e| reject("create_event", &e, "Datos de evento inválidos"))?;
    Ok(created(view.into()).with_message("Evento creado exitosamente"))
}

/// PUT /events/{id} (admin)
pub async fn update_event(
    Extension(svc): Svc,
    AdminUser(admin): AdminUser,
    PathParam(id): PathParam<u64>,
    JsonBody(req): JsonBody<UpdateEventReq>,
) -> Result<ApiOk<EventViewDto>, Failure> {
    info!(admin = admin.id, event_id = id, "Updating event");
    const INVALID: &str = "Datos de evento inválidos";
    let patch = EventPatch::try_from(req).map_err(|e| reject("update_event", &e, INVALID))?;
    let view = svc
        .catalog
        .update_event(id, patch)
        .await
        .map_err(|e| reject("update_event", &e, INVALID))?;
    Ok(ok(view.into()).with_message("Evento actualizado exitosamente"))
}

/// POST /events/{id}/inscribirse
pub async fn enroll(
    Extension(svc): Svc,
    PathParam(id): PathParam<u64>,
    JsonBody(req): JsonBody<EnrollReq>,
) -> Result<ApiOk<RegistrationDto>, Failure> {
    let registration = svc
        .ledger
        .enroll(id, req.into())
        .await
        .map_err(|e| reject("enroll", &e, "Datos de inscripción inválidos"))?;
    Ok(created(registration.into()).with_message("¡Inscripción exitosa!"))
}

/// GET /events/inscripciones/mis-inscripciones?email=
pub async fn my_registrations(
    Extension(svc): Svc,
    QueryParams(query): QueryParams<MyRegistrationsQuery>,
) -> Result<ApiOk<Vec<MyRegistrationDto>>, Failure> {
    let email = query.email.unwrap_or_default();
    let found = svc
        .ledger
        .list_by_attendee(&email)
        .await
        .map_err(|e| reject("my_registrations", &e, "Email requerido"))?;

    let total = found.len();
    let data: Vec<MyRegistrationDto> = found.into_iter().map(Into::into).collect();
    Ok(ok(data).with_total(total))
}

/// PUT /events/inscripciones/{id}
pub async fn update_registration(
    Extension(svc): Svc,
    PathParam(id): PathParam<u64>,
    JsonBody(req): JsonBody<UpdateRegistrationReq>,
) -> Result<ApiOk<RegistrationDto>, Failure> {
    let (attendee, event_id) = req.into_parts();
    let updated = svc
        .ledger
        .update(id, attendee, event_id)
        .await
        .map_err(|e| match e {
            DomainError::DuplicateRegistration { .. } => modkit::conflict(
                "Ya existe una inscripción con este email para el evento seleccionado",
            ),
            e => reject("update_registration", &e, "Datos de actualización inválidos"),
        })?;
    Ok(ok(updated.into()).with_message("Inscripción actualizada exitosamente"))
}

/// DELETE /events/inscripciones/{id}
pub async fn delete_registration(
    Extension(svc): Svc,
    PathParam(id): PathParam<u64>,
) -> Result<ApiOk<RegistrationDto>, Failure> {
    let removed = svc
        .ledger
        .delete(id)
        .await
        .map_err(|e| reject("delete_registration", &e, "Solicitud inválida"))?;
    Ok(ok(removed.into()).with_message("Inscripción eliminada exitosamente"))
}
