use super::{db_error, PageQuery};
use crate::group::get_group_by_slug;
use crate::middleware::ClientCtx;
use crate::orm::{groups, posts};
use crate::paginator::Page;
use crate::post::{get_post_page, select_posts_for_template, PostForTemplate};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_group);
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub client: ClientCtx,
    pub group: groups::Model,
    pub page: Page<PostForTemplate>,
}

#[get("/group/{slug}/")]
async fn view_group(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    let group = get_group_by_slug(db, &path.into_inner())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Group not found."))?;

    let select = select_posts_for_template().filter(posts::Column::GroupId.eq(group.id));
    let page = get_post_page(db, select, query.page())
        .await
        .map_err(db_error)?;

    Ok(GroupTemplate {
        client,
        group,
        page,
    }
    .to_response())
}
