use chrono::{DateTime, NaiveDate, Utc};

/// Id of the primary admin. It can never be deleted or deactivated.
pub const PRIMARY_ADMIN_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventStatus {
    #[default]
    Active,
    Inactive,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "activo",
            Self::Inactive => "inactivo",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "activo" => Some(Self::Active),
            "inactivo" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Event record as stored in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    /// `HH:MM`, 24h clock.
    pub time: String,
    pub capacity: u32,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }
}

/// Event plus its derived occupancy.
#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    pub event: Event,
    pub current_enrollment: usize,
    pub is_available: bool,
}

impl EventView {
    pub fn new(event: Event, current_enrollment: usize) -> Self {
        let is_available = current_enrollment < event.capacity as usize;
        Self {
            event,
            current_enrollment,
            is_available,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDetail {
    pub view: EventView,
    pub registrations: Vec<Registration>,
}

/// Listing filter; text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    /// Exact `YYYY-MM-DD` match.
    pub date: Option<String>,
    pub status: EventStatus,
}

/// Raw input for a new event; validated by the catalog.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub date: String,
    pub time: String,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub category: String,
    pub image: Option<String>,
}

/// Present fields overwrite, absent fields are preserved.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub capacity: Option<i64>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStatus {
    #[default]
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmada",
            Self::Cancelled => "cancelada",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: u64,
    pub event_id: u64,
    /// Event name at the time of the last write.
    pub event_name: String,
    pub attendee: Attendee,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }
}

/// A registration joined with the current state of its event, if it still exists.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationWithEvent {
    pub registration: Registration,
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub credential_hash: String,
    pub role: Role,
    pub active: bool,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Partial update of a user. `role` and `active` are honoured for admins only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile: Option<ProfilePatch>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// Who is performing a user-management call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    pub page: u32,
    pub pages: u32,
    pub total: usize,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub admins: usize,
    pub regular: usize,
    pub recent_registrations: usize,
    pub last_updated: DateTime<Utc>,
}
