//! Wire shapes. Event and registration fields keep their Spanish names,
//! user and auth payloads use camelCase English.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::model::{
    Attendee, Event, EventDetail, EventFilter, EventPatch, EventStatus, EventView, NewEvent,
    NewUser, Profile, ProfilePatch, Registration, RegistrationWithEvent, Role, User, UserPage,
    UserPatch, UserQuery, UserStats,
};
use crate::domain::error::DomainError;

// ---- events ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: u64,
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub ubicacion: String,
    pub fecha: NaiveDate,
    pub hora: String,
    pub capacidad_maxima: u32,
    pub precio: f64,
    pub categoria: String,
    pub estado: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Event> for EventDto {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            nombre: e.name,
            descripcion: e.description,
            ubicacion: e.location,
            fecha: e.date,
            hora: e.time,
            capacidad_maxima: e.capacity,
            precio: e.price,
            categoria: e.category,
            estado: e.status.as_str().to_string(),
            imagen: e.image,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// Event with its live occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventViewDto {
    #[serde(flatten)]
    pub event: EventDto,
    pub inscritos_actuales: usize,
    pub disponible: bool,
}

impl From<EventView> for EventViewDto {
    fn from(v: EventView) -> Self {
        Self {
            event: v.event.into(),
            inscritos_actuales: v.current_enrollment,
            disponible: v.is_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetailDto {
    #[serde(flatten)]
    pub view: EventViewDto,
    pub inscripciones: Vec<RegistrationDto>,
}

impl From<EventDetail> for EventDetailDto {
    fn from(d: EventDetail) -> Self {
        Self {
            view: d.view.into(),
            inscripciones: d.registrations.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEventsQuery {
    pub categoria: Option<String>,
    pub ubicacion: Option<String>,
    pub fecha: Option<String>,
    pub estado: Option<String>,
}

fn parse_status(raw: &str) -> Result<EventStatus, DomainError> {
    EventStatus::parse(raw)
        .ok_or_else(|| DomainError::invalid_field("estado", "El estado debe ser activo o inactivo"))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl TryFrom<ListEventsQuery> for EventFilter {
    type Error = DomainError;

    fn try_from(q: ListEventsQuery) -> Result<Self, Self::Error> {
        let status = match non_blank(q.estado) {
            Some(raw) => parse_status(&raw)?,
            None => EventStatus::Active,
        };
        Ok(Self {
            category: non_blank(q.categoria),
            location: non_blank(q.ubicacion),
            date: non_blank(q.fecha),
            status,
        })
    }
}

/// Missing fields deserialize to empty values and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateEventReq {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub ubicacion: String,
    pub fecha: String,
    pub hora: String,
    pub capacidad_maxima: Option<i64>,
    pub precio: Option<f64>,
    pub categoria: String,
    pub imagen: Option<String>,
}

impl From<CreateEventReq> for NewEvent {
    fn from(r: CreateEventReq) -> Self {
        Self {
            name: r.nombre,
            description: r.descripcion,
            location: r.ubicacion,
            date: r.fecha,
            time: r.hora,
            capacity: r.capacidad_maxima,
            price: r.precio,
            category: r.categoria,
            image: r.imagen,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateEventReq {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub ubicacion: Option<String>,
    pub fecha: Option<String>,
    pub hora: Option<String>,
    pub capacidad_maxima: Option<i64>,
    pub precio: Option<f64>,
    pub categoria: Option<String>,
    pub imagen: Option<String>,
    pub estado: Option<String>,
}

impl TryFrom<UpdateEventReq> for EventPatch {
    type Error = DomainError;

    fn try_from(r: UpdateEventReq) -> Result<Self, Self::Error> {
        let status = r.estado.as_deref().map(parse_status).transpose()?;
        Ok(Self {
            name: r.nombre,
            description: r.descripcion,
            location: r.ubicacion,
            date: r.fecha,
            time: r.hora,
            capacity: r.capacidad_maxima,
            price: r.precio,
            category: r.categoria,
            image: r.imagen,
            status,
        })
    }
}

// ---- registrations ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDto {
    pub id: u64,
    pub evento_id: u64,
    pub evento_nombre: String,
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub estado: String,
    pub fecha_inscripcion: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_actualizacion: Option<DateTime<Utc>>,
}

impl From<Registration> for RegistrationDto {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            evento_id: r.event_id,
            evento_nombre: r.event_name,
            nombre: r.attendee.name,
            email: r.attendee.email,
            telefono: r.attendee.phone,
            estado: r.status.as_str().to_string(),
            fecha_inscripcion: r.created_at,
            fecha_actualizacion: r.updated_at,
        }
    }
}

/// Registration plus the current event; `evento` is null once the event is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyRegistrationDto {
    #[serde(flatten)]
    pub registration: RegistrationDto,
    pub evento: Option<EventDto>,
}

impl From<RegistrationWithEvent> for MyRegistrationDto {
    fn from(r: RegistrationWithEvent) -> Self {
        Self {
            registration: r.registration.into(),
            evento: r.event.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollReq {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
}

impl From<EnrollReq> for Attendee {
    fn from(r: EnrollReq) -> Self {
        Self {
            name: r.nombre,
            email: r.email,
            phone: r.telefono,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateRegistrationReq {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    /// 0 when absent; rejected by validation.
    pub evento_id: u64,
}

impl UpdateRegistrationReq {
    pub fn into_parts(self) -> (Attendee, u64) {
        (
            Attendee {
                name: self.nombre,
                email: self.email,
                phone: self.telefono,
            },
            self.evento_id,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyRegistrationsQuery {
    pub email: Option<String>,
}

// ---- auth ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterReq {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterReq> for NewUser {
    fn from(r: RegisterReq) -> Self {
        Self {
            username: r.username,
            email: r.email,
            password: r.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginReq {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUserDto {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for SessionUserDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            role: u.role.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthDto {
    pub user: SessionUserDto,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeDto<C> {
    pub user: C,
}

// ---- users ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl From<Profile> for ProfileDto {
    fn from(p: Profile) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            phone: p.phone,
            avatar: p.avatar,
        }
    }
}

impl From<ProfileDto> for ProfilePatch {
    fn from(p: ProfileDto) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            phone: p.phone,
            avatar: p.avatar,
        }
    }
}

/// User without credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub profile: ProfileDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role.as_str().to_string(),
            profile: u.profile.into(),
            created_at: u.created_at,
            updated_at: u.updated_at,
            is_active: u.active,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<String>,
    /// `active` or `inactive`.
    pub status: Option<String>,
}

impl TryFrom<ListUsersQuery> for UserQuery {
    type Error = DomainError;

    fn try_from(q: ListUsersQuery) -> Result<Self, Self::Error> {
        let role = match non_blank(q.role) {
            Some(raw) => Some(
                Role::parse(&raw)
                    .ok_or_else(|| DomainError::invalid_field("role", "Rol inválido"))?,
            ),
            None => None,
        };
        let active = match non_blank(q.status).as_deref() {
            None => None,
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            Some(_) => {
                return Err(DomainError::invalid_field(
                    "status",
                    "El estado debe ser active o inactive",
                ))
            }
        };
        Ok(Self {
            page: q.page,
            limit: q.limit,
            search: q.search,
            role,
            active,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateUserReq {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile: Option<ProfileDto>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl TryFrom<UpdateUserReq> for UserPatch {
    type Error = DomainError;

    fn try_from(r: UpdateUserReq) -> Result<Self, Self::Error> {
        let role = r
            .role
            .as_deref()
            .map(|raw| {
                Role::parse(raw).ok_or_else(|| DomainError::invalid_field("role", "Rol inválido"))
            })
            .transpose()?;
        Ok(Self {
            username: r.username,
            email: r.email,
            profile: r.profile.map(Into::into),
            role,
            active: r.is_active,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordReq {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStatusDto {
    pub id: u64,
    pub username: String,
    pub is_active: bool,
}

impl From<User> for ToggleStatusDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            is_active: u.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsDto {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub admins: usize,
    pub regular: usize,
    pub recent_registrations: usize,
    pub last_updated: DateTime<Utc>,
}

impl From<UserStats> for UserStatsDto {
    fn from(s: UserStats) -> Self {
        Self {
            total: s.total,
            active: s.active,
            inactive: s.inactive,
            admins: s.admins,
            regular: s.regular,
            recent_registrations: s.recent_registrations,
            last_updated: s.last_updated,
        }
    }
}

/// Page of users plus the envelope pagination block.
pub fn user_page_parts(page: UserPage) -> (Vec<UserDto>, modkit::Pagination) {
    let pagination = modkit::Pagination {
        current: page.page,
        pages: page.pages,
        total: page.total,
        limit: page.limit,
    };
    (page.items.into_iter().map(Into::into).collect(), pagination)
}
