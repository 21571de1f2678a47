use super::{db_error, redirect};
use crate::comment::{get_comments_for_post, insert_comment, CommentForTemplate};
use crate::config::Config;
use crate::follow::viewer_follows;
use crate::forms::{
    read_post_form, validate_comment, validate_post, CleanPost, CommentForm, CommentFormData,
    GroupChoice, PostForm,
};
use crate::group::get_group_choices;
use crate::media::save_post_image;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::post::{
    count_posts_by_author, get_post_by_author_and_id, get_url_for_post, insert_post,
    update_post, NewPost, PostChanges, PostForTemplate,
};
use crate::session::{flash, take_flash, COMMENT_ERROR_KEY};
use crate::user::get_user_by_name;
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{DatabaseConnection, DbErr};

pub(super) fn configure_new(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_new_post).service(create_post);
}

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_post)
        .service(edit_post)
        .service(update_post_form)
        .service(add_comment);
}

/// Post form page, shared by creation (`is_new`) and editing.
#[derive(Template)]
#[template(path = "new_post.html")]
pub struct NewPostTemplate {
    pub client: ClientCtx,
    pub form: PostForm,
    pub choices: Vec<GroupChoice>,
    pub is_new: bool,
    pub post: Option<PostForTemplate>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub client: ClientCtx,
    pub author: users::Model,
    pub post: PostForTemplate,
    pub posts_count: u64,
    pub comments: Vec<CommentForTemplate>,
    pub form: CommentForm,
    pub following: bool,
    pub can_follow: bool,
    pub can_edit: bool,
}

async fn render_post_form(
    db: &DatabaseConnection,
    client: ClientCtx,
    form: PostForm,
    post: Option<PostForTemplate>,
) -> Result<HttpResponse, Error> {
    let groups = get_group_choices(db).await.map_err(db_error)?;
    Ok(NewPostTemplate {
        client,
        choices: form.choices(&groups),
        form,
        is_new: post.is_none(),
        post,
    }
    .to_response())
}

/// Reads and validates a multipart post submission, storing its image.
/// `Err(form)` carries the form to show again.
async fn accept_post_form(
    db: &DatabaseConnection,
    config: &Config,
    multipart: Multipart,
) -> Result<Result<(CleanPost, Option<String>), PostForm>, Error> {
    let groups = get_group_choices(db).await.map_err(db_error)?;
    let data = read_post_form(multipart).await?;

    let mut clean = match validate_post(data, &groups) {
        Ok(clean) => clean,
        Err(form) => {
            log::debug!("accept_post_form: rejected: {:?}", form.errors);
            return Ok(Err(form));
        }
    };

    let image = match clean.image.take() {
        Some(upload) => Some(save_post_image(&config.media_root, upload).await?),
        None => None,
    };

    Ok(Ok((clean, image)))
}

/// Resolves the post under the author's username only.
async fn find_post(
    db: &DatabaseConnection,
    username: &str,
    post_id: i32,
) -> Result<PostForTemplate, Error> {
    get_post_by_author_and_id(db, username, post_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))
}

async fn find_author(db: &DatabaseConnection, username: &str) -> Result<users::Model, Error> {
    get_user_by_name(db, username)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))
}

#[get("/new/")]
async fn view_new_post(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    client.require_user(&req)?;
    render_post_form(db.get_ref(), client, PostForm::default(), None).await
}

#[post("/new/")]
async fn create_post(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    multipart: Multipart,
) -> Result<impl Responder, Error> {
    let user = client.require_user(&req)?;
    let db = db.get_ref();

    let (clean, image) = match accept_post_form(db, &config, multipart).await? {
        Ok(accepted) => accepted,
        Err(form) => return render_post_form(db, client, form, None).await,
    };

    let post = insert_post(
        db,
        NewPost {
            author_id: user.id,
            text: clean.text,
            group_id: clean.group_id,
            image,
        },
    )
    .await
    .map_err(db_error)?;
    log::info!("{} created post {}", user.username, post.id);

    Ok(redirect("/"))
}

#[get(r"/{username}/{post_id:\d+}/")]
async fn view_post(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, i32)>,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    let (username, post_id) = path.into_inner();
    let author = find_author(db, &username).await?;
    let post = find_post(db, &author.username, post_id).await?;

    let posts_count = count_posts_by_author(db, author.id)
        .await
        .map_err(db_error)?;
    let comments = get_comments_for_post(db, post.id)
        .await
        .map_err(db_error)?;
    let following = viewer_follows(db, client.get_id(), author.id)
        .await
        .map_err(db_error)?;
    let form = CommentForm {
        error: take_flash(&session, COMMENT_ERROR_KEY),
    };
    let can_follow = client.is_user() && !client.can_update_post(author.id);
    let can_edit = client.can_update_post(author.id);

    Ok(PostTemplate {
        client,
        author,
        post,
        posts_count,
        comments,
        form,
        following,
        can_follow,
        can_edit,
    }
    .to_response())
}

/// Guards shared by both edit routes. `Ok(Err(response))` is the silent
/// redirect given to anyone but the author.
async fn resolve_editable_post(
    client: &ClientCtx,
    req: &HttpRequest,
    db: &DatabaseConnection,
    username: &str,
    post_id: i32,
) -> Result<Result<PostForTemplate, HttpResponse>, Error> {
    let user = client.require_user(req)?;
    let author = find_author(db, username).await?;

    if user.id != author.id {
        log::debug!("{} may not edit post {} of {}", user.username, post_id, username);
        return Ok(Err(redirect(&get_url_for_post(username, post_id))));
    }

    Ok(Ok(find_post(db, &author.username, post_id).await?))
}

#[get(r"/{username}/{post_id:\d+}/edit/")]
async fn edit_post(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, i32)>,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    let (username, post_id) = path.into_inner();
    let post = match resolve_editable_post(&client, &req, db, &username, post_id).await? {
        Ok(post) => post,
        Err(response) => return Ok(response),
    };

    let form = PostForm::with_initial(&post.text, post.group_id);
    render_post_form(db, client, form, Some(post)).await
}

#[post(r"/{username}/{post_id:\d+}/edit/")]
async fn update_post_form(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    path: web::Path<(String, i32)>,
    multipart: Multipart,
) -> Result<impl Responder, Error> {
    let db = db.get_ref();
    let (username, post_id) = path.into_inner();
    let post = match resolve_editable_post(&client, &req, db, &username, post_id).await? {
        Ok(post) => post,
        Err(response) => return Ok(response),
    };

    let (clean, image) = match accept_post_form(db, &config, multipart).await? {
        Ok(accepted) => accepted,
        Err(form) => return render_post_form(db, client, form, Some(post)).await,
    };

    update_post(
        db,
        post.id,
        PostChanges {
            text: clean.text,
            group_id: clean.group_id,
            image,
        },
    )
    .await
    .map_err(|e| match e {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
            error::ErrorNotFound("Post not found.")
        }
        e => db_error(e),
    })?;

    Ok(redirect(&post.get_url()))
}

#[post(r"/{username}/{post_id:\d+}/comment/")]
async fn add_comment(
    client: ClientCtx,
    req: HttpRequest,
    session: Session,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(String, i32)>,
    form: web::Form<CommentFormData>,
) -> Result<impl Responder, Error> {
    let user = client.require_user(&req)?;
    let db = db.get_ref();
    let (username, post_id) = path.into_inner();
    let post = find_post(db, &username, post_id).await?;

    match validate_comment(&form) {
        Ok(text) => {
            insert_comment(db, post.id, user.id, text)
                .await
                .map_err(db_error)?;
        }
        Err(message) => {
            log::debug!("add_comment: rejected comment on post {}: {}", post.id, message);
            flash(&session, COMMENT_ERROR_KEY, message);
        }
    }

    Ok(redirect(&post.get_url()))
}
