use crate::orm::{groups, posts, users};
use crate::paginator::{fetch_page, locate_page, paginate_query, Page, PageWindow, PAGE_SIZE};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult, PaginatorTrait};

/// A fully joined struct representing the post model and its relational data.
#[derive(Clone, Debug, FromQueryResult)]
pub struct PostForTemplate {
    pub id: i32,
    pub text: String,
    pub pub_date: chrono::NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
    // join users
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    // join groups
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

impl PostForTemplate {
    pub fn get_url(&self) -> String {
        get_url_for_post(&self.author_username, self.id)
    }

    pub fn get_image_url(&self) -> Option<String> {
        self.image.as_deref().map(crate::media::get_url_for_path)
    }

    pub fn get_author_name(&self) -> String {
        let full = format!("{} {}", self.author_first_name, self.author_last_name);
        match full.trim() {
            "" => self.author_username.to_owned(),
            full => full.to_owned(),
        }
    }

    pub fn get_pub_date(&self) -> String {
        self.pub_date.format("%d %b %Y %H:%M").to_string()
    }
}

/// Fields a post is inserted with.
#[derive(Debug)]
pub struct NewPost {
    pub author_id: i32,
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// Mutable fields of an existing post. `image: None` keeps the current image.
#[derive(Debug)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

pub fn get_url_for_post(username: &str, post_id: i32) -> String {
    format!("/{}/{}/", username, post_id)
}

/// Posts with author and group columns, newest first.
pub fn select_posts_for_template() -> Select<posts::Entity> {
    posts::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "author_username")
        .column_as(users::Column::FirstName, "author_first_name")
        .column_as(users::Column::LastName, "author_last_name")
        .left_join(groups::Entity)
        .column_as(groups::Column::Title, "group_title")
        .column_as(groups::Column::Slug, "group_slug")
        .order_by_desc(posts::Column::PubDate)
        .order_by_desc(posts::Column::Id)
}

/// Fetches one page of the given post selection.
pub async fn get_post_page<C: ConnectionTrait>(
    db: &C,
    select: Select<posts::Entity>,
    page: Option<&str>,
) -> Result<Page<PostForTemplate>, DbErr> {
    paginate_query(
        db,
        select.into_model::<PostForTemplate>(),
        PAGE_SIZE,
        page,
    )
    .await
}

/// Resolves which page of the selection `page` names, counting rows only.
pub async fn locate_post_page<C: ConnectionTrait>(
    db: &C,
    select: Select<posts::Entity>,
    page: Option<&str>,
) -> Result<PageWindow, DbErr> {
    locate_page(db, select.into_model::<PostForTemplate>(), PAGE_SIZE, page).await
}

pub async fn fetch_post_page<C: ConnectionTrait>(
    db: &C,
    select: Select<posts::Entity>,
    window: PageWindow,
) -> Result<Page<PostForTemplate>, DbErr> {
    fetch_page(db, select.into_model::<PostForTemplate>(), PAGE_SIZE, window).await
}

/// Resolves a post only under its true author's username.
pub async fn get_post_by_author_and_id<C: ConnectionTrait>(
    db: &C,
    username: &str,
    post_id: i32,
) -> Result<Option<PostForTemplate>, DbErr> {
    select_posts_for_template()
        .filter(users::Column::Username.eq(username))
        .filter(posts::Column::Id.eq(post_id))
        .into_model::<PostForTemplate>()
        .one(db)
        .await
}

pub async fn count_posts_by_author<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<u64, DbErr> {
    posts::Entity::find()
        .filter(posts::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

pub async fn insert_post<C: ConnectionTrait>(db: &C, post: NewPost) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        text: Set(post.text),
        pub_date: Set(Utc::now().naive_utc()),
        author_id: Set(post.author_id),
        group_id: Set(post.group_id),
        image: Set(post.image),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Overwrites only the mutable fields; id, author and date are untouched.
pub async fn update_post<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    changes: PostChanges,
) -> Result<posts::Model, DbErr> {
    let mut post = posts::ActiveModel {
        id: Unchanged(post_id),
        text: Set(changes.text),
        group_id: Set(changes.group_id),
        ..Default::default()
    };
    if let Some(image) = changes.image {
        post.image = Set(Some(image));
    }
    post.update(db).await
}
