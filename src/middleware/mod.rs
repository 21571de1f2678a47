mod client_ctx;

pub use client_ctx::{login_redirect, ClientCtx, ClientCtxMiddleware};
