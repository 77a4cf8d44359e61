use axum::http::StatusCode;
use modkit::{Failure, FieldError};

use crate::domain::error::DomainError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor";

fn internal_failure(detail: &str) -> Failure {
    let message = if cfg!(feature = "debug-errors") {
        format!("{INTERNAL_ERROR_MESSAGE}: {detail}")
    } else {
        INTERNAL_ERROR_MESSAGE.to_string()
    };
    Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
}

/// Map a domain error to the response envelope.
///
/// `invalid_message` is the top-level message for validation failures and
/// differs per operation ("Datos de inscripción inválidos", ...).
pub fn map_domain_error(e: &DomainError, invalid_message: &str) -> Failure {
    match e {
        DomainError::EventNotFound { .. } => modkit::not_found("Evento no encontrado"),
        DomainError::EventUnavailable { .. } => {
            modkit::not_found("Evento no encontrado o no está activo")
        }
        DomainError::RegistrationNotFound { .. } => modkit::not_found("Inscripción no encontrada"),
        DomainError::UserNotFound { .. } => modkit::not_found("Usuario no encontrado"),
        DomainError::CapacityExceeded { .. } => {
            modkit::conflict("El evento ha alcanzado su capacidad máxima")
        }
        DomainError::DuplicateRegistration { .. } => {
            modkit::conflict("Ya estás inscrito en este evento con este email")
        }
        DomainError::CapacityBelowOccupancy { occupancy, .. } => modkit::conflict(format!(
            "La capacidad no puede ser menor que los inscritos actuales ({occupancy})"
        )),
        DomainError::UsernameTaken { .. } => modkit::conflict("El nombre de usuario ya está en uso"),
        DomainError::EmailTaken { .. } => modkit::conflict("El email ya está en uso"),
        DomainError::Validation { violations } => modkit::bad_request(invalid_message)
            .with_errors(
                violations
                    .iter()
                    .map(|v| FieldError::new(v.field.clone(), v.message.clone()))
                    .collect(),
            ),
        DomainError::InvalidCredentials | DomainError::AccountDisabled { .. } => {
            modkit::unauthorized("Credenciales incorrectas")
        }
        DomainError::WrongPassword => modkit::unauthorized("Contraseña actual incorrecta"),
        DomainError::Forbidden { reason } => modkit::forbidden(reason.clone()),
        DomainError::PrimaryAdminProtected { action } => modkit::forbidden(match *action {
            "deleted" => "No se puede eliminar al administrador principal",
            "demoted" => "No se puede cambiar el rol del administrador principal",
            _ => "No se puede cambiar el estado del administrador principal",
        }),
        DomainError::Internal { message } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = %message, "Internal error");
            internal_failure(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::FieldViolation;

    #[test]
    fn validation_carries_field_errors() {
        let e = DomainError::validation(vec![FieldViolation::new("email", "Debe ser un email válido")]);
        let f = map_domain_error(&e, "Datos de inscripción inválidos");
        assert_eq!(f.status, StatusCode::BAD_REQUEST);
        assert_eq!(f.message(), "Datos de inscripción inválidos");
        let errors = f.body.errors.unwrap();
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::event_unavailable(1), StatusCode::NOT_FOUND),
            (DomainError::capacity_exceeded(1, 2), StatusCode::CONFLICT),
            (DomainError::duplicate_registration(1, "a@x.com"), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::AccountDisabled { id: 3 }, StatusCode::UNAUTHORIZED),
            (
                DomainError::PrimaryAdminProtected { action: "deleted" },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (e, status) in cases {
            assert_eq!(map_domain_error(&e, "x").status, status, "{e}");
        }
    }

    #[cfg(not(feature = "debug-errors"))]
    #[test]
    fn internal_detail_is_hidden() {
        let f = map_domain_error(&DomainError::internal("db exploded"), "x");
        assert_eq!(f.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(f.message(), INTERNAL_ERROR_MESSAGE);
    }

    #[cfg(feature = "debug-errors")]
    #[test]
    fn internal_detail_is_exposed_in_debug_builds() {
        let f = map_domain_error(&DomainError::internal("db exploded"), "x");
        assert!(f.message().contains("db exploded"));
    }
}
