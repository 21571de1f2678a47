use crate::orm::{follows, posts};
use crate::post::select_posts_for_template;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, PaginatorTrait};

/// Creates the edge `user_id -> author_id` unless it already exists or both
/// ids are the same user. Returns whether an edge was created.
///
/// The store's primary key decides uniqueness, so concurrent requests cannot
/// produce duplicates.
pub async fn follow_author<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    if user_id == author_id {
        return Ok(false);
    }

    let rows = follows::Entity::insert(follows::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
    })
    .on_conflict(
        OnConflict::columns([follows::Column::UserId, follows::Column::AuthorId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    Ok(rows > 0)
}

/// Removes the edge if present. Returns whether an edge was removed.
pub async fn unfollow_author<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    let res = follows::Entity::delete_many()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;

    Ok(res.rows_affected > 0)
}

pub async fn is_following<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follows::Entity::find_by_id((user_id, author_id))
        .count(db)
        .await?
        > 0)
}

/// Whether the viewer follows the author. Guests and the author themselves
/// never do.
pub async fn viewer_follows<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    author_id: i32,
) -> Result<bool, DbErr> {
    match viewer {
        Some(user_id) if user_id != author_id => is_following(db, user_id, author_id).await,
        _ => Ok(false),
    }
}

pub async fn count_followers<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<u64, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

pub async fn count_following<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<u64, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::UserId.eq(user_id))
        .count(db)
        .await
}

/// Posts by every author the user follows, newest first.
pub fn select_feed_posts(user_id: i32) -> Select<posts::Entity> {
    select_posts_for_template().filter(
        posts::Column::AuthorId.in_subquery(
            Query::select()
                .column(follows::Column::AuthorId)
                .from(follows::Entity)
                .and_where(follows::Column::UserId.eq(user_id))
                .to_owned(),
        ),
    )
}
