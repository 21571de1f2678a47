use super::{db_error, redirect};
use crate::forms::{
    validate_signup, LoginFormData, SignupFormData, SignupFormErrors, USERNAME_TAKEN,
};
use crate::middleware::ClientCtx;
use crate::session;
use crate::user::{authenticate, get_user_by_name, insert_new_user, ClientUser, NewUser};
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub const LOGIN_FAILED: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_logout)
        .service(view_signup)
        .service(post_signup);
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub username: String,
    pub next: Option<String>,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "auth/logged_out.html")]
pub struct LoggedOutTemplate {
    pub client: ClientCtx,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub client: ClientCtx,
    pub form: SignupFormData,
    pub errors: SignupFormErrors,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Where to go after logging in. Only paths on this site are honoured.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}

#[get("/auth/login/")]
async fn view_login(client: ClientCtx, query: web::Query<NextQuery>) -> impl Responder {
    LoginTemplate {
        client,
        username: String::new(),
        next: query.into_inner().next,
        error: None,
    }
    .to_response()
}

#[post("/auth/login/")]
async fn post_login(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<LoginFormData>,
) -> Result<HttpResponse, Error> {
    let form = form.into_inner();
    let user = authenticate(db.get_ref(), form.username.trim(), &form.password)
        .await
        .map_err(db_error)?;

    match user {
        Some(user) => {
            session::login(&session, &user)?;
            log::info!("{} logged in", user.username);
            Ok(redirect(safe_next(form.next.as_deref())))
        }
        None => {
            log::debug!("post_login: failed login for {:?}", form.username);
            Ok(LoginTemplate {
                client,
                username: form.username,
                next: form.next,
                error: Some(LOGIN_FAILED),
            }
            .to_response())
        }
    }
}

#[get("/auth/logout/")]
async fn view_logout(session: Session) -> impl Responder {
    session::logout(&session);
    // The context was resolved before the session was purged.
    LoggedOutTemplate {
        client: ClientCtx::default(),
    }
    .to_response()
}

#[get("/auth/signup/")]
async fn view_signup(client: ClientCtx) -> impl Responder {
    SignupTemplate {
        client,
        form: SignupFormData::default(),
        errors: SignupFormErrors::default(),
    }
    .to_response()
}

#[post("/auth/signup/")]
async fn post_signup(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<SignupFormData>,
) -> Result<HttpResponse, Error> {
    let db = db.get_ref();
    let form = form.into_inner();
    let mut errors = validate_signup(&form);
    let username = form.username.trim();

    if errors.username.is_none()
        && get_user_by_name(db, username)
            .await
            .map_err(db_error)?
            .is_some()
    {
        errors.username = Some(USERNAME_TAKEN);
    }

    if !errors.is_empty() {
        return Ok(SignupTemplate {
            client,
            form,
            errors,
        }
        .to_response());
    }

    let user = insert_new_user(
        db,
        NewUser {
            username,
            password: &form.password1,
            first_name: &form.first_name,
            last_name: &form.last_name,
            email: &form.email,
        },
    )
    .await
    .map_err(db_error)?;
    log::info!("new user {} ({})", user.username, user.id);

    session::login(
        &session,
        &ClientUser {
            id: user.id,
            username: user.username,
        },
    )?;

    Ok(redirect("/"))
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn test_safe_next_keeps_local_paths() {
        assert_eq!(safe_next(Some("/new/")), "/new/");
        assert_eq!(safe_next(Some("/leo/1/edit/?page=2")), "/leo/1/edit/?page=2");
    }

    #[test]
    fn test_safe_next_rejects_other_sites() {
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("https://example.com/")), "/");
        assert_eq!(safe_next(Some("//example.com/")), "/");
        assert_eq!(safe_next(Some("/\\example.com")), "/");
    }
}
