use crate::orm::groups;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

pub async fn get_group_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<groups::Model>, DbErr> {
    groups::Entity::find()
        .filter(groups::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// All groups, for the choice list of the post form.
pub async fn get_group_choices<C: ConnectionTrait>(db: &C) -> Result<Vec<groups::Model>, DbErr> {
    groups::Entity::find()
        .order_by_asc(groups::Column::Title)
        .all(db)
        .await
}

/// Groups have no public editor; they are created by site staff.
pub async fn insert_group<C: ConnectionTrait>(
    db: &C,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<groups::Model, DbErr> {
    groups::ActiveModel {
        title: Set(title.trim().to_owned()),
        slug: Set(slug.trim().to_owned()),
        description: Set(description.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
}
