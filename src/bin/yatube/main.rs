use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use yatube::cache::FragmentCache;
use yatube::config::Config;
use yatube::middleware::ClientCtx;
use yatube::{create_tables, init_db};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = Config::from_env()?;
    let db = init_db(&config.database_url)
        .await
        .context("Database connection failed.")?;
    create_tables(&db)
        .await
        .context("Database schema could not be created.")?;
    std::fs::create_dir_all(&config.media_root).with_context(|| {
        format!(
            "Media root {} could not be created.",
            config.media_root.display()
        )
    })?;

    let secret_key = config.session_key();
    let bind_address = config.bind_address.to_owned();
    let db = Data::new(db);
    let cache = Data::new(FragmentCache::new());
    let config = Data::new(config);

    log::info!("Listening on http://{}", bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        // However, services are read top->down, higher traffic routes should be
        // placed higher
        App::new()
            .app_data(db.clone())
            .app_data(cache.clone())
            .app_data(config.clone())
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, yatube::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        yatube::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(Logger::new("%a %r %s %T"))
            .service(yatube::web::media_files(&config))
            .configure(yatube::web::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env is fine; the environment may already be set.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
