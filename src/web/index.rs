use super::{db_error, PageQuery};
use crate::cache::{FragmentCache, FragmentKey};
use crate::config::Config;
use crate::middleware::ClientCtx;
use crate::paginator::Page;
use crate::post::{fetch_post_page, locate_post_page, select_posts_for_template, PostForTemplate};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

/// Name of the cached post-list region of the index page.
pub const INDEX_FRAGMENT: &str = "index_page";

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub fragment: String,
}

/// The post list alone; this is what the fragment cache holds.
#[derive(Template)]
#[template(path = "includes/post_list.html")]
pub struct PostListTemplate<'a> {
    pub page: &'a Page<PostForTemplate>,
}

#[get("/")]
async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<FragmentCache>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    // Only the count is needed to key the fragment; rows are read on a miss.
    let window = locate_post_page(db, select_posts_for_template(), query.page())
        .await
        .map_err(db_error)?;

    let fragment = cache
        .get_or_render(
            FragmentKey::new(INDEX_FRAGMENT, [window.number]),
            config.index_cache_ttl,
            || async move {
                let page = fetch_post_page(db, select_posts_for_template(), window)
                    .await
                    .map_err(db_error)?;
                PostListTemplate { page: &page }.render().map_err(|e| {
                    log::error!("view_index: {}", e);
                    error::ErrorInternalServerError("Could not render the post list.")
                })
            },
        )
        .await?;

    Ok(IndexTemplate { client, fragment }.to_response())
}
