pub mod cache;
pub mod comment;
pub mod config;
pub mod db;
pub mod follow;
pub mod forms;
pub mod group;
pub mod media;
pub mod middleware;
pub mod orm;
pub mod paginator;
pub mod post;
pub mod session;
pub mod user;
pub mod web;

pub use db::{create_tables, init_db};
