use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{
    Actor, NewUser, Profile, ProfilePatch, Role, User, UserPage, UserPatch, UserQuery, UserStats,
    PRIMARY_ADMIN_ID,
};
use crate::domain::error::DomainError;
use crate::domain::ports::PasswordHasher;
use crate::domain::repo::UsersRepository;
use crate::domain::validation;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;
const RECENT_DAYS: i64 = 30;

/// Credential store and user management.
///
/// Mutations that check username/email uniqueness run under one writer
/// lock. Hashing never happens while that lock is held.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepository>,
    hasher: Arc<dyn PasswordHasher>,
    writer: Arc<Mutex<()>>,
}

fn merge_profile(current: &Profile, patch: ProfilePatch) -> Profile {
    Profile {
        first_name: patch.first_name.or_else(|| current.first_name.clone()),
        last_name: patch.last_name.or_else(|| current.last_name.clone()),
        phone: patch.phone.or_else(|| current.phone.clone()),
        avatar: patch.avatar.or_else(|| current.avatar.clone()),
    }
}

fn matches_search(u: &User, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&needle);
    hit(&u.username)
        || hit(&u.email)
        || u.profile.first_name.as_deref().is_some_and(hit)
        || u.profile.last_name.as_deref().is_some_and(hit)
}

impl AccountService {
    pub fn new(users: Arc<dyn UsersRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            hasher,
            writer: Arc::new(Mutex::new(())),
        }
    }

    async fn hash_password(&self, plaintext: String) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| DomainError::internal(format!("hashing task failed: {e}")))?
            .map_err(|e| DomainError::internal(format!("hashing failed: {e:#}")))
    }

    async fn verify_password(&self, plaintext: String, hash: String) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("verification task failed: {e}")))?
            .map_err(|e| DomainError::internal(format!("verification failed: {e:#}")))
    }

    async fn find(&self, id: u64) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    /// Case-insensitive lookup by username, then by email.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, DomainError> {
        let identifier = identifier.trim();
        if let Some(u) = self
            .users
            .find_by_username(identifier)
            .await
            .map_err(DomainError::storage)?
        {
            return Ok(Some(u));
        }
        self.users
            .find_by_email(identifier)
            .await
            .map_err(DomainError::storage)
    }

    async fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<u64>,
    ) -> Result<(), DomainError> {
        let other = |u: &User| Some(u.id) != except;
        if let Some(username) = username {
            let taken = self
                .users
                .find_by_username(username)
                .await
                .map_err(DomainError::storage)?
                .filter(other);
            if taken.is_some() {
                return Err(DomainError::UsernameTaken {
                    username: username.to_string(),
                });
            }
        }
        if let Some(email) = email {
            let taken = self
                .users
                .find_by_email(email)
                .await
                .map_err(DomainError::storage)?
                .filter(other);
            if taken.is_some() {
                return Err(DomainError::EmailTaken {
                    email: email.to_string(),
                });
            }
        }
        Ok(())
    }

    #[instrument(name = "events.accounts.register", skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register(&self, new_user: NewUser) -> Result<User, DomainError> {
        let new_user = validation::validate_new_user(&new_user)?;
        // Cheap pre-check so duplicates fail before paying for a hash.
        self.ensure_unique(Some(&new_user.username), Some(&new_user.email), None)
            .await?;
        let credential_hash = self.hash_password(new_user.password).await?;

        let _w = self.writer.lock().await;
        self.ensure_unique(Some(&new_user.username), Some(&new_user.email), None)
            .await?;

        let now = Utc::now();
        let user = User {
            id: self.users.next_id(),
            username: new_user.username,
            email: new_user.email,
            credential_hash,
            role: Role::User,
            active: true,
            profile: Profile::default(),
            created_at: now,
            updated_at: now,
        };
        self.users
            .insert(user.clone())
            .await
            .map_err(DomainError::storage)?;
        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Unknown identifiers, wrong passwords and disabled accounts all fail.
    #[instrument(name = "events.accounts.authenticate", skip(self, password))]
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, DomainError> {
        validation::validate_login(identifier, password)?;

        let Some(user) = self.find_by_identifier(identifier).await? else {
            debug!("Unknown identifier");
            return Err(DomainError::InvalidCredentials);
        };
        let ok = self
            .verify_password(password.to_string(), user.credential_hash.clone())
            .await?;
        if !ok {
            debug!(user_id = user.id, "Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }
        if !user.active {
            return Err(DomainError::AccountDisabled { id: user.id });
        }
        info!(user_id = user.id, "User authenticated");
        Ok(user)
    }

    /// Admins see anyone; other users only themselves.
    pub async fn get_user(&self, actor: Actor, id: u64) -> Result<User, DomainError> {
        if !actor.is_admin() && actor.id != id {
            return Err(DomainError::forbidden("No tienes permisos para ver este usuario"));
        }
        self.find(id).await
    }

    #[instrument(name = "events.accounts.list_users", skip(self, query))]
    pub async fn list_users(&self, query: &UserQuery) -> Result<UserPage, DomainError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let filtered: Vec<User> = self
            .users
            .list()
            .await
            .map_err(DomainError::storage)?
            .into_iter()
            .filter(|u| search.map_or(true, |s| matches_search(u, s)))
            .filter(|u| query.role.map_or(true, |r| u.role == r))
            .filter(|u| query.active.map_or(true, |a| u.active == a))
            .collect();

        let total = filtered.len();
        let pages = total.div_ceil(limit as usize) as u32;
        let items = filtered
            .into_iter()
            .skip((page as usize - 1) * limit as usize)
            .take(limit as usize)
            .collect();

        Ok(UserPage {
            items,
            page,
            pages,
            total,
            limit,
        })
    }

    async fn apply_patch(
        &self,
        id: u64,
        patch: UserPatch,
        admin_fields: bool,
    ) -> Result<User, DomainError> {
        let patch = validation::validate_user_patch(&patch)?;

        let _w = self.writer.lock().await;
        let current = self.find(id).await?;

        let username = patch
            .username
            .filter(|u| !u.is_empty() && *u != current.username);
        let email = patch.email.filter(|e| !e.is_empty() && *e != current.email);
        self.ensure_unique(username.as_deref(), email.as_deref(), Some(id))
            .await?;

        let mut updated = User {
            username: username.unwrap_or_else(|| current.username.clone()),
            email: email.unwrap_or_else(|| current.email.clone()),
            profile: match patch.profile {
                Some(p) => merge_profile(&current.profile, p),
                None => current.profile.clone(),
            },
            updated_at: Utc::now(),
            ..current
        };
        if admin_fields {
            if let Some(role) = patch.role {
                updated.role = role;
            }
            if let Some(active) = patch.active {
                updated.active = active;
            }
        }

        self.users
            .update(updated.clone())
            .await
            .map_err(DomainError::storage)?;
        Ok(updated)
    }

    /// Self-service update; role and active flag are ignored.
    #[instrument(name = "events.accounts.update_profile", skip(self, patch), fields(user_id = actor_id))]
    pub async fn update_profile(&self, actor_id: u64, patch: UserPatch) -> Result<User, DomainError> {
        let user = self.apply_patch(actor_id, patch, false).await?;
        info!("Profile updated");
        Ok(user)
    }

    #[instrument(name = "events.accounts.admin_update", skip(self, patch), fields(user_id = id))]
    pub async fn admin_update(&self, id: u64, patch: UserPatch) -> Result<User, DomainError> {
        if id == PRIMARY_ADMIN_ID {
            if patch.active == Some(false) {
                return Err(DomainError::PrimaryAdminProtected {
                    action: "deactivated",
                });
            }
            if patch.role.is_some_and(|r| r != Role::Admin) {
                return Err(DomainError::PrimaryAdminProtected { action: "demoted" });
            }
        }
        let user = self.apply_patch(id, patch, true).await?;
        info!("User updated by admin");
        Ok(user)
    }

    #[instrument(name = "events.accounts.change_password", skip_all, fields(user_id = actor_id))]
    pub async fn change_password(
        &self,
        actor_id: u64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        validation::validate_password_change(current_password, new_password)?;

        let user = self.find(actor_id).await?;
        let ok = self
            .verify_password(current_password.to_string(), user.credential_hash)
            .await?;
        if !ok {
            return Err(DomainError::WrongPassword);
        }
        let credential_hash = self.hash_password(new_password.to_string()).await?;

        let _w = self.writer.lock().await;
        let current = self.find(actor_id).await?;
        self.users
            .update(User {
                credential_hash,
                updated_at: Utc::now(),
                ..current
            })
            .await
            .map_err(DomainError::storage)?;
        info!("Password changed");
        Ok(())
    }

    #[instrument(name = "events.accounts.delete_user", skip(self), fields(user_id = id))]
    pub async fn delete_user(&self, id: u64) -> Result<(), DomainError> {
        if id == PRIMARY_ADMIN_ID {
            return Err(DomainError::PrimaryAdminProtected { action: "deleted" });
        }
        let _w = self.writer.lock().await;
        let deleted = self.users.delete(id).await.map_err(DomainError::storage)?;
        if !deleted {
            return Err(DomainError::user_not_found(id));
        }
        info!("User deleted");
        Ok(())
    }

    /// Flips the active flag and returns the updated user.
    #[instrument(name = "events.accounts.toggle_status", skip(self), fields(user_id = id))]
    pub async fn toggle_status(&self, id: u64) -> Result<User, DomainError> {
        if id == PRIMARY_ADMIN_ID {
            return Err(DomainError::PrimaryAdminProtected {
                action: "deactivated",
            });
        }
        let _w = self.writer.lock().await;
        let current = self.find(id).await?;
        let updated = User {
            active: !current.active,
            updated_at: Utc::now(),
            ..current
        };
        self.users
            .update(updated.clone())
            .await
            .map_err(DomainError::storage)?;
        info!(active = updated.active, "User status toggled");
        Ok(updated)
    }

    pub async fn stats(&self) -> Result<UserStats, DomainError> {
        let users = self.users.list().await.map_err(DomainError::storage)?;
        let now = Utc::now();
        let since = now - Duration::days(RECENT_DAYS);

        let active = users.iter().filter(|u| u.active).count();
        let admins = users.iter().filter(|u| u.role == Role::Admin).count();
        Ok(UserStats {
            total: users.len(),
            active,
            inactive: users.len() - active,
            admins,
            regular: users.len() - admins,
            recent_registrations: users.iter().filter(|u| u.created_at >= since).count(),
            last_updated: now,
        })
    }

    /// Creates the primary admin. Must run before any other user exists.
    ///
    /// Without a configured password the admin gets a random one nobody
    /// knows, so the account exists but cannot log in.
    #[instrument(name = "events.accounts.seed_admin", skip_all)]
    pub async fn seed_admin(&self, password: Option<String>) -> Result<User, DomainError> {
        let password = match password.filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => {
                warn!("No admin password configured; the admin account cannot log in");
                OsRng
                    .sample_iter(&Alphanumeric)
                    .take(32)
                    .map(char::from)
                    .collect()
            }
        };
        let credential_hash = self.hash_password(password).await?;

        let _w = self.writer.lock().await;
        let id = self.users.next_id();
        if id != PRIMARY_ADMIN_ID {
            return Err(DomainError::internal(format!(
                "admin must be the first user, got id {id}"
            )));
        }
        let now = Utc::now();
        let admin = User {
            id,
            username: "admin".to_string(),
            email: "admin@corvoevent.com".to_string(),
            credential_hash,
            role: Role::Admin,
            active: true,
            profile: Profile {
                first_name: Some("Admin".to_string()),
                last_name: Some("CorvoEvent".to_string()),
                phone: Some("999888777".to_string()),
                avatar: None,
            },
            created_at: now,
            updated_at: now,
        };
        self.users
            .insert(admin.clone())
            .await
            .map_err(DomainError::storage)?;
        info!("Primary admin seeded");
        Ok(admin)
    }
}
