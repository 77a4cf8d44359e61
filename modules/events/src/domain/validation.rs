//! Input rules shared by the ledger, the catalog and the account service.
//!
//! Field names are the wire names clients send, so violations can be
//! reported back verbatim.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::model::{Attendee, EventPatch, NewEvent, NewUser, UserPatch};
use crate::domain::error::DomainError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}$").expect("phone regex is valid"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username regex is valid"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time regex is valid")
});

pub const MAX_CAPACITY: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects violations so a request reports every bad field at once.
#[derive(Debug, Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    fn finish(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(self.0))
        }
    }
}

fn char_len_between(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.chars().count())
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

pub fn is_valid_phone(raw: &str) -> bool {
    PHONE_RE.is_match(raw)
}

pub fn is_valid_time(raw: &str) -> bool {
    TIME_RE.is_match(raw)
}

/// At least 6 characters with a letter, a digit and one of `@ - _`.
pub fn is_strong_password(raw: &str) -> bool {
    raw.chars().count() >= 6
        && raw.chars().any(|c| c.is_ascii_alphabetic())
        && raw.chars().any(|c| c.is_ascii_digit())
        && raw.chars().any(|c| matches!(c, '@' | '-' | '_'))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Returns the attendee with a trimmed name and a lowercased email.
pub fn validate_attendee(a: &Attendee) -> Result<Attendee, DomainError> {
    let name = a.name.trim();
    let mut v = Violations::default();
    v.check(
        char_len_between(name, 2, 100),
        "nombre",
        "El nombre debe tener entre 2 y 100 caracteres",
    );
    v.check(is_valid_email(&a.email), "email", "Debe ser un email válido");
    v.check(
        is_valid_phone(&a.phone),
        "telefono",
        "El teléfono debe tener exactamente 9 dígitos",
    );
    v.finish()?;

    Ok(Attendee {
        name: name.to_string(),
        email: normalize_email(&a.email),
        phone: a.phone.clone(),
    })
}

/// Attendee rules plus a positive target event id.
pub fn validate_registration_update(
    a: &Attendee,
    event_id: u64,
) -> Result<Attendee, DomainError> {
    let attendee = validate_attendee(a);
    match (attendee, event_id) {
        (Ok(a), id) if id > 0 => Ok(a),
        (Ok(_), _) => Err(DomainError::invalid_field("eventoId", "ID de evento inválido")),
        (Err(DomainError::Validation { mut violations }), id) => {
            if id == 0 {
                violations.push(FieldViolation::new("eventoId", "ID de evento inválido"));
            }
            Err(DomainError::validation(violations))
        }
        (Err(e), _) => Err(e),
    }
}

/// Event fields after validation and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub time: String,
    pub capacity: u32,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
}

fn check_event_name(v: &mut Violations, raw: &str) {
    v.check(
        char_len_between(raw.trim(), 3, 200),
        "nombre",
        "El nombre del evento debe tener entre 3 y 200 caracteres",
    );
}

fn check_description(v: &mut Violations, raw: &str) {
    v.check(
        raw.trim().chars().count() <= 1000,
        "descripcion",
        "La descripción no puede exceder 1000 caracteres",
    );
}

fn check_location(v: &mut Violations, raw: &str) {
    v.check(
        char_len_between(raw.trim(), 2, 100),
        "ubicacion",
        "La ubicación debe tener entre 2 y 100 caracteres",
    );
}

fn check_date(v: &mut Violations, raw: &str) -> Option<NaiveDate> {
    let parsed = parse_date(raw);
    v.check(parsed.is_some(), "fecha", "Fecha inválida");
    parsed
}

fn check_time(v: &mut Violations, raw: &str) {
    v.check(is_valid_time(raw.trim()), "hora", "Hora inválida (formato HH:MM)");
}

fn check_capacity(v: &mut Violations, raw: Option<i64>) -> Option<u32> {
    let ok = raw.filter(|c| (1..=MAX_CAPACITY).contains(c));
    v.check(ok.is_some(), "capacidadMaxima", "La capacidad debe ser entre 1 y 10000");
    ok.and_then(|c| u32::try_from(c).ok())
}

fn check_price(v: &mut Violations, raw: Option<f64>) -> Option<f64> {
    let ok = raw.filter(|p| p.is_finite() && *p >= 0.0);
    v.check(ok.is_some(), "precio", "El precio debe ser mayor o igual a 0");
    ok
}

fn check_category(v: &mut Violations, raw: &str) {
    v.check(
        char_len_between(raw.trim(), 2, 50),
        "categoria",
        "La categoría debe tener entre 2 y 50 caracteres",
    );
}

fn trimmed_opt(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn validate_new_event(n: &NewEvent) -> Result<ValidEvent, DomainError> {
    let mut v = Violations::default();
    check_event_name(&mut v, &n.name);
    if let Some(d) = &n.description {
        check_description(&mut v, d);
    }
    check_location(&mut v, &n.location);
    let date = check_date(&mut v, &n.date);
    check_time(&mut v, &n.time);
    let capacity = check_capacity(&mut v, n.capacity);
    let price = check_price(&mut v, n.price);
    check_category(&mut v, &n.category);
    v.finish()?;

    match (date, capacity, price) {
        (Some(date), Some(capacity), Some(price)) => Ok(ValidEvent {
            name: n.name.trim().to_string(),
            description: trimmed_opt(&n.description),
            location: n.location.trim().to_string(),
            date,
            time: n.time.trim().to_string(),
            capacity,
            price,
            category: n.category.trim().to_string(),
            image: trimmed_opt(&n.image),
        }),
        _ => Err(DomainError::internal("event validation passed without parsed fields")),
    }
}

/// Same rules as creation, applied to present fields only.
pub fn validate_event_patch(p: &EventPatch) -> Result<EventPatch, DomainError> {
    let mut v = Violations::default();
    if let Some(name) = &p.name {
        check_event_name(&mut v, name);
    }
    if let Some(d) = &p.description {
        check_description(&mut v, d);
    }
    if let Some(loc) = &p.location {
        check_location(&mut v, loc);
    }
    if let Some(date) = &p.date {
        check_date(&mut v, date);
    }
    if let Some(time) = &p.time {
        check_time(&mut v, time);
    }
    if p.capacity.is_some() {
        check_capacity(&mut v, p.capacity);
    }
    if p.price.is_some() {
        check_price(&mut v, p.price);
    }
    if let Some(cat) = &p.category {
        check_category(&mut v, cat);
    }
    v.finish()?;

    Ok(EventPatch {
        name: p.name.as_deref().map(|s| s.trim().to_string()),
        description: p.description.as_deref().map(|s| s.trim().to_string()),
        location: p.location.as_deref().map(|s| s.trim().to_string()),
        date: p.date.as_deref().map(|s| s.trim().to_string()),
        time: p.time.as_deref().map(|s| s.trim().to_string()),
        capacity: p.capacity,
        price: p.price,
        category: p.category.as_deref().map(|s| s.trim().to_string()),
        image: p.image.as_deref().map(|s| s.trim().to_string()),
        status: p.status,
    })
}

fn check_username(v: &mut Violations, raw: &str) {
    if !char_len_between(raw, 3, 30) {
        v.push(
            "username",
            "El nombre de usuario debe tener entre 3 y 30 caracteres",
        );
    } else if !USERNAME_RE.is_match(raw) {
        v.push(
            "username",
            "El nombre de usuario solo puede contener letras, números y guiones bajos",
        );
    }
}

fn check_password(v: &mut Violations, field: &str, label: &str, raw: &str) {
    if raw.chars().count() < 6 {
        v.push(field, format!("{label} debe tener al menos 6 caracteres"));
    } else if !is_strong_password(raw) {
        v.push(
            field,
            format!(
                "{label} debe contener letras, números y al menos uno de estos caracteres: @, -, _"
            ),
        );
    }
}

/// Returns the user with a trimmed username and a lowercased email.
pub fn validate_new_user(n: &NewUser) -> Result<NewUser, DomainError> {
    let username = n.username.trim();
    let mut v = Violations::default();
    check_username(&mut v, username);
    v.check(is_valid_email(&n.email), "email", "Debe ser un email válido");
    check_password(&mut v, "password", "La contraseña", &n.password);
    v.finish()?;

    Ok(NewUser {
        username: username.to_string(),
        email: normalize_email(&n.email),
        password: n.password.clone(),
    })
}

pub fn validate_login(identifier: &str, password: &str) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(
        !identifier.trim().is_empty(),
        "identifier",
        "Usuario o email es requerido",
    );
    v.check(!password.is_empty(), "password", "Contraseña es requerida");
    v.finish()
}

pub fn validate_password_change(current: &str, new: &str) -> Result<(), DomainError> {
    let mut v = Violations::default();
    v.check(
        !current.is_empty(),
        "currentPassword",
        "Contraseña actual requerida",
    );
    check_password(&mut v, "newPassword", "La nueva contraseña", new);
    v.finish()
}

/// Validates present fields and normalizes username, email and profile names.
pub fn validate_user_patch(p: &UserPatch) -> Result<UserPatch, DomainError> {
    let mut v = Violations::default();
    let username = p.username.as_deref().map(str::trim);
    if let Some(u) = username {
        check_username(&mut v, u);
    }
    if let Some(e) = &p.email {
        v.check(is_valid_email(e), "email", "Debe ser un email válido");
    }

    let mut profile = p.profile.clone();
    if let Some(pp) = profile.as_mut() {
        pp.first_name = pp.first_name.as_deref().map(|s| s.trim().to_string());
        pp.last_name = pp.last_name.as_deref().map(|s| s.trim().to_string());
        if let Some(first) = &pp.first_name {
            v.check(
                char_len_between(first, 2, 50),
                "profile.firstName",
                "El nombre debe tener entre 2 y 50 caracteres",
            );
        }
        if let Some(last) = &pp.last_name {
            v.check(
                char_len_between(last, 2, 50),
                "profile.lastName",
                "El apellido debe tener entre 2 y 50 caracteres",
            );
        }
        if let Some(phone) = &pp.phone {
            v.check(
                is_valid_phone(phone),
                "profile.phone",
                "El teléfono debe tener exactamente 9 dígitos",
            );
        }
    }
    v.finish()?;

    Ok(UserPatch {
        username: username.map(str::to_string),
        email: p.email.as_deref().map(normalize_email),
        profile,
        role: p.role,
        active: p.active,
    })
}
