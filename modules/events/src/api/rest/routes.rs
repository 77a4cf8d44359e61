use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Extension, Router,
};

use crate::api::rest::handlers::{auth, events, users};
use crate::module::Services;

fn events_routes() -> Router {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/{id}", get(events::get_event).put(events::update_event))
        .route("/{id}/inscribirse", post(events::enroll))
        .route(
            "/inscripciones/mis-inscripciones",
            get(events::my_registrations),
        )
        .route(
            "/inscripciones/{id}",
            put(events::update_registration).delete(events::delete_registration),
        )
}

fn auth_routes() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
}

fn users_routes() -> Router {
    Router::new()
        .route("/", get(users::list_users))
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/password", put(users::change_password))
        .route("/stats/overview", get(users::stats))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{id}/toggle-status", post(users::toggle_status))
}

/// Mounts the events, auth and users APIs under `/api`.
pub fn register_routes(router: Router, services: Arc<Services>) -> anyhow::Result<Router> {
    let api = Router::new()
        .nest("/events", events_routes())
        .nest("/auth", auth_routes())
        .nest("/users", users_routes())
        .layer(Extension(services.sessions.clone()))
        .layer(Extension(services));

    Ok(router.nest("/api", api))
}
