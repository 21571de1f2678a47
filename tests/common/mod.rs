#![allow(dead_code)]

use actix_http::Request;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::ErrorHandlers;
use actix_web::web::Data;
use actix_web::{test, App, Error};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use yatube::cache::FragmentCache;
use yatube::config::Config;
use yatube::middleware::ClientCtx;
use yatube::orm::{groups, posts, users};
use yatube::post::{insert_post, NewPost};
use yatube::user::{insert_new_user, NewUser};

pub const PASSWORD: &str = "test-password-123";
pub const BOUNDARY: &str = "yatube-test-boundary";

/// A 2x1 black and white GIF.
pub const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x00\x00\x00\x00\x00,\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0c\n\x00;";

static MEDIA_DIRS: AtomicUsize = AtomicUsize::new(0);

/// Everything one test application shares: a fresh in-memory database,
/// its own media root and cache.
pub struct TestState {
    pub db: Data<DatabaseConnection>,
    pub cache: Data<FragmentCache>,
    pub config: Data<Config>,
    pub key: Key,
}

impl TestState {
    pub async fn new() -> Self {
        Self::with_index_ttl(Duration::from_secs(20)).await
    }

    pub async fn with_index_ttl(index_cache_ttl: Duration) -> Self {
        let db = yatube::init_db("sqlite::memory:")
            .await
            .expect("in-memory database");
        yatube::create_tables(&db).await.expect("schema");

        let media_root: PathBuf = std::env::temp_dir().join(format!(
            "yatube-test-{}-{}",
            std::process::id(),
            MEDIA_DIRS.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&media_root).expect("media root");

        let config = Config {
            database_url: "sqlite::memory:".to_owned(),
            media_root,
            index_cache_ttl,
            ..Default::default()
        };

        Self {
            db: Data::new(db),
            cache: Data::new(FragmentCache::new()),
            config: Data::new(config),
            key: Key::generate(),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.get_ref()
    }

    pub async fn create_user(&self, username: &str) -> users::Model {
        insert_new_user(
            self.db(),
            NewUser {
                username,
                password: PASSWORD,
                first_name: "",
                last_name: "",
                email: "",
            },
        )
        .await
        .expect("user")
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> groups::Model {
        yatube::group::insert_group(self.db(), title, slug, "Test group description")
            .await
            .expect("group")
    }

    pub async fn create_post(
        &self,
        author: &users::Model,
        text: &str,
        group: Option<&groups::Model>,
    ) -> posts::Model {
        insert_post(
            self.db(),
            NewPost {
                author_id: author.id,
                text: text.to_owned(),
                group_id: group.map(|g| g.id),
                image: None,
            },
        )
        .await
        .expect("post")
    }

    pub async fn count_posts(&self) -> u64 {
        posts::Entity::find()
            .count(self.db())
            .await
            .expect("count")
    }
}

impl Drop for TestState {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.config.media_root);
    }
}

/// The whole application wired the way the binary wires it.
pub async fn init_app(
    state: &TestState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(state.db.clone())
            .app_data(state.cache.clone())
            .app_data(state.config.clone())
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
                state.key.clone(),
            ))
            .service(yatube::web::media_files(&state.config))
            .configure(yatube::web::configure),
    )
    .await
}

/// Logs in through the login form and returns the session cookie.
pub async fn login<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(&[("username", username), ("password", PASSWORD)])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND, "login as {} failed", username);

    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("session cookie")
        .into_owned()
}

pub fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ASCII Location")
}

/// Returns the body of a response as a string.
pub async fn body_string<B>(resp: ServiceResponse<B>) -> String
where
    B: MessageBody,
{
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

/// Builds a `multipart/form-data` body of text fields and at most one file.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((name, filename, content_type, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (
        format!("multipart/form-data; boundary={}", BOUNDARY),
        body,
    )
}

/// A POST request carrying a multipart body and, optionally, a session.
pub fn multipart_request(
    uri: &str,
    cookie: Option<&Cookie<'static>>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Request {
    let (content_type, body) = multipart_body(fields, file);
    let mut req = test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    req.to_request()
}
