use crate::orm::users;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
}

/// Everything needed to insert a new account.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

pub async fn get_client_user_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .into_model::<ClientUser>()
        .one(db)
        .await
}

pub async fn get_user_by_name<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
}

pub async fn insert_new_user<C: ConnectionTrait>(
    db: &C,
    user: NewUser<'_>,
) -> Result<users::Model, DbErr> {
    let password_hash = hash_password(user.password).map_err(|e| {
        log::error!("insert_new_user: hash_password(): {}", e);
        DbErr::Custom("password could not be hashed".to_owned())
    })?;

    users::ActiveModel {
        username: Set(user.username.to_owned()),
        first_name: Set(user.first_name.trim().to_owned()),
        last_name: Set(user.last_name.trim().to_owned()),
        email: Set(user.email.trim().to_owned()),
        password: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Returns the account if the name exists and the password matches it.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<ClientUser>, DbErr> {
    let user = match get_user_by_name(db, username).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let parsed_hash = match PasswordHash::new(&user.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("authenticate: stored hash for {} is unreadable: {}", user.id, e);
            return Ok(None);
        }
    };

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(Some(ClientUser {
            id: user.id,
            username: user.username,
        }))
    } else {
        Ok(None)
    }
}
