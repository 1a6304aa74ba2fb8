use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionManager;
use crate::configuration::{ApplicationSettings, AuthSettings};
use crate::middleware::{JwtMiddleware, RequestLogging};
use crate::routes::{
    create_user, get_current_user, health_check, login, refresh, reset, revoke,
    update_current_user,
};
use crate::storage::{RefreshTokenRepository, UserRepository};

/// Persistence collaborators handed to the server
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

pub fn run(
    listener: TcpListener,
    storage: Storage,
    application: ApplicationSettings,
    auth: AuthSettings,
) -> Result<Server, std::io::Error> {
    let sessions = SessionManager::from_settings(&auth, storage.refresh_tokens)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let sessions = web::Data::new(sessions);
    let users = web::Data::from(storage.users);
    let application = web::Data::new(application);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(RequestLogging)

            // Shared state
            .app_data(sessions.clone())
            .app_data(users.clone())
            .app_data(application.clone())

            // Public routes
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(create_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/admin/reset", web::post().to(reset))

            // Protected routes (require a valid access token)
            .service(
                web::scope("/api/me")
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route("", web::get().to(get_current_user))
                    .route("", web::put().to(update_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
