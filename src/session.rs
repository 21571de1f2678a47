use crate::user::{get_client_user_by_id, ClientUser};
use actix_session::Session;
use sea_orm::DatabaseConnection;

/// Session key holding the signed-in user's id.
pub const USER_ID_KEY: &str = "user_id";
/// Session key holding a one-shot message for the next page view.
pub const COMMENT_ERROR_KEY: &str = "comment_error";

/// Binds the session to the user. The session id is renewed to prevent fixation.
pub fn login(session: &Session, user: &ClientUser) -> Result<(), actix_web::Error> {
    session.renew();
    session.insert(USER_ID_KEY, user.id)?;
    Ok(())
}

pub fn logout(session: &Session) {
    session.purge();
}

/// Resolves the user the session belongs to, if any.
pub async fn authenticate_client_by_session(
    db: &DatabaseConnection,
    session: &Session,
) -> Option<ClientUser> {
    let user_id = match session.get::<i32>(USER_ID_KEY) {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("authenticate_client_by_session: bad {}: {}", USER_ID_KEY, e);
            session.remove(USER_ID_KEY);
            return None;
        }
    };

    match get_client_user_by_id(db, user_id).await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            // The account is gone; forget it.
            session.remove(USER_ID_KEY);
            None
        }
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

/// Stores a message to be shown once on the next page.
pub fn flash(session: &Session, key: &str, message: &str) {
    if let Err(e) = session.insert(key, message) {
        log::error!("flash: {}", e);
    }
}

/// Removes and returns a flashed message.
pub fn take_flash(session: &Session, key: &str) -> Option<String> {
    match session.remove_as::<String>(key) {
        Some(Ok(message)) => Some(message),
        Some(Err(raw)) => {
            log::warn!("take_flash: unreadable {} value {:?}", key, raw);
            None
        }
        None => None,
    }
}
