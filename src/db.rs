use crate::orm::{comments, follows, groups, posts, users};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityName, EntityTrait,
    Schema,
};
use std::time::Duration;

/// Opens the database URL and returns the pool.
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    // Every connection to an in-memory SQLite database is its own database,
    // so the single connection must never be recycled.
    if database_url.contains(":memory:") {
        let day = Duration::from_secs(24 * 60 * 60);
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(day)
            .max_lifetime(day);
    }

    Database::connect(opt).await
}

/// Creates any missing tables from the entity definitions.
/// Parents are created before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, groups::Entity).await?;
    create_table(db, posts::Entity).await?;
    create_table(db, comments::Entity).await?;
    create_table(db, follows::Entity).await?;
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    log::debug!("create_table: {}", entity.table_name());
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
