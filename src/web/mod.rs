pub mod about;
pub mod auth;
pub mod error;
pub mod follow;
pub mod group;
pub mod index;
pub mod post;
pub mod profile;

use crate::config::Config;
use actix_web::{Error, HttpResponse};
use serde::Deserialize;

/// Configures the web app
///
/// Static prefixes are registered before the `/{username}/` patterns so that
/// they are never read as usernames.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    index::configure(conf);
    follow::configure_feed(conf);
    post::configure_new(conf);
    group::configure(conf);
    about::configure(conf);
    auth::configure(conf);
    profile::configure(conf);
    follow::configure(conf);
    post::configure(conf);
}

/// Read-only service for uploaded files.
pub fn media_files(config: &Config) -> actix_files::Files {
    actix_files::Files::new("/media", &config.media_root)
}

/// `?page=` as sent by the paginator links.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Logs a store fault and converts it into a 500.
pub(crate) fn db_error(e: sea_orm::DbErr) -> Error {
    log::error!("{}", e);
    actix_web::error::ErrorInternalServerError("Database error.")
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", location))
        .finish()
}
