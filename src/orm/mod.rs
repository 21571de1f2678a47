//! Entities backing the store. Tables are created from these definitions by
//! `crate::db::create_tables`, so relations carry the delete rules.

pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod users;
