use super::{db_error, PageQuery};
use crate::follow::{count_followers, count_following, viewer_follows};
use crate::middleware::ClientCtx;
use crate::orm::{posts, users};
use crate::paginator::Page;
use crate::post::{get_post_page, select_posts_for_template, PostForTemplate};
use crate::user::get_user_by_name;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_profile);
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub client: ClientCtx,
    pub author: users::Model,
    pub page: Page<PostForTemplate>,
    pub following: bool,
    /// Whether the follow buttons are shown at all.
    pub can_follow: bool,
    pub followers_count: u64,
    pub following_count: u64,
}

#[get("/{username}/")]
async fn view_profile(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    let author = get_user_by_name(db, &path.into_inner())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))?;

    let select = select_posts_for_template().filter(posts::Column::AuthorId.eq(author.id));
    let page = get_post_page(db, select, query.page())
        .await
        .map_err(db_error)?;
    let following = viewer_follows(db, client.get_id(), author.id)
        .await
        .map_err(db_error)?;
    let followers_count = count_followers(db, author.id).await.map_err(db_error)?;
    let following_count = count_following(db, author.id).await.map_err(db_error)?;
    let can_follow = client.is_user() && client.get_id() != Some(author.id);

    Ok(ProfileTemplate {
        client,
        author,
        page,
        following,
        can_follow,
        followers_count,
        following_count,
    }
    .to_response())
}
