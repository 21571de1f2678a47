use super::{db_error, redirect, PageQuery};
use crate::follow::{follow_author, select_feed_posts, unfollow_author};
use crate::middleware::ClientCtx;
use crate::paginator::Page;
use crate::post::{get_post_page, PostForTemplate};
use crate::user::get_user_by_name;
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure_feed(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_follow_index);
}

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(profile_follow).service(profile_unfollow);
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
}

fn profile_url(username: &str) -> String {
    format!("/{}/", username)
}

#[get("/follow/")]
async fn view_follow_index(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let user = client.require_user(&req)?;
    let page = get_post_page(db.get_ref(), select_feed_posts(user.id), query.page())
        .await
        .map_err(db_error)?;

    Ok(FollowTemplate { client, page }.to_response())
}

#[get("/{username}/follow/")]
async fn profile_follow(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user = client.require_user(&req)?;
    let db = db.get_ref();
    let username = path.into_inner();
    let author = get_user_by_name(db, &username)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    if follow_author(db, user.id, author.id)
        .await
        .map_err(db_error)?
    {
        log::debug!("{} now follows {}", user.username, author.username);
    }

    Ok(redirect(&profile_url(&author.username)))
}

#[get("/{username}/unfollow/")]
async fn profile_unfollow(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user = client.require_user(&req)?;
    let db = db.get_ref();
    let username = path.into_inner();

    // Unknown names have no edge to remove.
    if let Some(author) = get_user_by_name(db, &username)
        .await
        .map_err(db_error)?
    {
        unfollow_author(db, user.id, author.id)
            .await
            .map_err(db_error)?;
    }

    Ok(redirect(&profile_url(&username)))
}
