use crate::user::ClientUser;
use actix_session::SessionExt;
use actix_utils::future::{ok, Ready};
use actix_web::dev::{
    forward_ready, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use sea_orm::DatabaseConnection;
use std::time::{Duration, Instant};
use std::{cell::RefCell, rc::Rc};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    pub client: Option<ClientUser>,
    pub request_start: Instant,
}

impl ClientCtxInner {
    fn new() -> Self {
        Self {
            client: None,
            request_start: Instant::now(),
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Rc<RefCell<ClientCtxInner>>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(ClientCtxInner::new())))
    }
}

impl ClientCtx {
    fn get_client_ctx(extensions: &mut Extensions) -> Self {
        match extensions.get::<Rc<RefCell<ClientCtxInner>>>() {
            // Existing record in extensions; pull it.
            Some(s_impl) => Self(Rc::clone(s_impl)),
            // No existing record; create and insert it.
            None => {
                let inner = Rc::new(RefCell::new(ClientCtxInner::new()));
                extensions.insert(inner.clone());
                Self(inner)
            }
        }
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.borrow().client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.borrow().client {
            Some(user) => user.username.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn get_user(&self) -> Option<ClientUser> {
        self.0.borrow().client.to_owned()
    }

    pub fn is_user(&self) -> bool {
        self.0.borrow().client.is_some()
    }

    /// Only authors may edit their posts.
    pub fn can_update_post(&self, author_id: i32) -> bool {
        self.get_id() == Some(author_id)
    }

    /// Returns the signed-in user, or an error whose response redirects to the
    /// login page and back to this request afterwards.
    pub fn require_user(&self, req: &HttpRequest) -> Result<ClientUser, Error> {
        self.get_user().ok_or_else(|| {
            let next = match req.query_string() {
                "" => req.path().to_owned(),
                query => format!("{}?{}", req.path(), query),
            };
            InternalError::from_response("Login required.", login_redirect(&next)).into()
        })
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.borrow().request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

/// A 302 to the login page carrying the path to come back to.
pub fn login_redirect(next: &str) -> HttpResponse {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    // Slashes stay readable, as in `/auth/login/?next=/new/`.
    let next = next.replace("%2F", "/");
    HttpResponse::Found()
        .append_header((header::LOCATION, format!("/auth/login/?next={}", next)))
        .finish()
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ok(ClientCtx::get_client_ctx(&mut req.extensions_mut()))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ClientCtxMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ClientCtxMiddleware {
            service: Rc::new(service),
        })
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let session = req.get_session();
        let db = req.app_data::<Data<DatabaseConnection>>().cloned();
        let ctx = ClientCtx::get_client_ctx(&mut req.extensions_mut());

        async move {
            use crate::session::authenticate_client_by_session;

            match db {
                Some(db) => {
                    // Resolve before borrowing; the borrow must not span an await.
                    let client = authenticate_client_by_session(&db, &session).await;
                    ctx.0.borrow_mut().client = client;
                }
                None => {
                    log::error!("ClientCtxMiddleware: no DatabaseConnection in app data.");
                }
            }

            service.call(req).await
        }
        .boxed_local()
    }
}
