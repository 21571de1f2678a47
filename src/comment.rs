use crate::orm::{comments, users};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};

#[derive(Clone, Debug, FromQueryResult)]
pub struct CommentForTemplate {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub created: chrono::NaiveDateTime,
    // join users
    pub author_username: String,
}

impl CommentForTemplate {
    pub fn get_created(&self) -> String {
        self.created.format("%d %b %Y %H:%M").to_string()
    }
}

/// Comments of a post, oldest first.
pub async fn get_comments_for_post<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
) -> Result<Vec<CommentForTemplate>, DbErr> {
    comments::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "author_username")
        .filter(comments::Column::PostId.eq(post_id))
        .order_by_asc(comments::Column::Created)
        .order_by_asc(comments::Column::Id)
        .into_model::<CommentForTemplate>()
        .all(db)
        .await
}

pub async fn insert_comment<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    author_id: i32,
    text: String,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(author_id),
        text: Set(text),
        created: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
