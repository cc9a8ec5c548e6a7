use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod notify;
mod report;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::notify::dispatcher::Dispatcher;
use crate::notify::store::SqlNotificationStore;
use crate::notify::telegram::TelegramClient;
use crate::notify::EventBus;
use crate::utils::bot_lang_cache;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    "OK"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "crewdesk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let dbs = init_db(&config).await?;

    // Post-commit side effects run off the request path
    let (events, rx) = EventBus::channel();
    let dispatcher = Dispatcher::new(
        SqlNotificationStore::new(dbs.clone()),
        TelegramClient::new(&config.telegram_bot_token),
    );
    actix_web::rt::spawn(dispatcher.run(rx));

    let bot_pool = dbs.bot.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = bot_lang_cache::warmup_lang_cache(&bot_pool, 500).await {
            warn!(error = %e, "Failed to warm up bot language cache");
        }
    });

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(dbs.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(events.clone()))
            .service(health)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
