use actix_web::{middleware::Logger, web, App, HttpServer};
use shopit::config::Config;
use shopit::db::Database;
use shopit::mailer::LogMailer;
use shopit::{api, AppState};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    // Initialize the database
    let db = Database::new(&config.database_path).map_err(to_io)?;
    db.create_schema().await.map_err(to_io)?; // Ensure the schema is created

    if let Some(email) = &config.admin_email {
        match db.promote_to_admin(email).await.map_err(to_io)? {
            Some(user) => info!("Admin account: {} ({})", user.email, user.id),
            None => warn!("ADMIN_EMAIL {} has no registered account yet", email),
        }
    }

    let addr = config.address();
    let state = web::Data::new(AppState::new(db, config, Arc::new(LogMailer)));
    info!("listening on http://{} ({:?})", addr, state.config.environment);

    // Start the Actix Web server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(&addr)?
    .run()
    .await?;

    info!("Server shut down");
    Ok(())
}

fn to_io(e: shopit::error::AppError) -> std::io::Error {
    error!("Startup failed: {}", e);
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}
