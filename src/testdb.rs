//! Throwaway databases for tests that need postgres.
//!
//! Each [`TestDb`] is a new database on the server named by
//! `DATABASE_URL`, migrated to the current schema and dropped again
//! when the test is done.  When `DATABASE_URL` is not set, the tests
//! using it are skipped.
use crate::dbopt::{Connection, Pool};
use crate::models::{DateTime, Post, PostData, User};
use crate::schema::categories::dsl as c;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::Connection as _;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::RunQueryDsl;
use diesel_migrations::{
    embed_migrations, EmbeddedMigrations, MigrationHarness,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static SERIAL: AtomicUsize = AtomicUsize::new(0);

pub struct TestDb {
    base_url: String,
    name: String,
    pool: Pool,
}

impl TestDb {
    /// Create and migrate a database, or `None` to skip the test.
    pub fn create() -> Option<TestDb> {
        dotenv::dotenv().ok();
        let Ok(base_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is not set, skipping database test");
            return None;
        };
        let name = format!(
            "blogicum_test_{}_{}",
            std::process::id(),
            SERIAL.fetch_add(1, Ordering::SeqCst),
        );
        let mut server = PgConnection::establish(&base_url)
            .expect("connect to DATABASE_URL");
        let create = diesel::sql_query(format!("CREATE DATABASE {name}"));
        diesel::RunQueryDsl::execute(create, &mut server)
            .expect("create test database");

        let mut url = Url::parse(&base_url).expect("DATABASE_URL is a url");
        url.set_path(&name);
        PgConnection::establish(url.as_str())
            .expect("connect to test database")
            .run_pending_migrations(MIGRATIONS)
            .expect("migrate test database");

        let manager = AsyncDieselConnectionManager::new(url.as_str());
        let pool = Pool::builder(manager)
            .max_size(4)
            .build()
            .expect("test database pool");
        Some(TestDb {
            base_url,
            name,
            pool,
        })
    }

    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    pub async fn db(&self) -> Connection {
        self.pool.get().await.expect("test database connection")
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        self.pool.close();
        let dropped = PgConnection::establish(&self.base_url)
            .map_err(|e| e.to_string())
            .and_then(|mut server| {
                let query = diesel::sql_query(format!(
                    "DROP DATABASE IF EXISTS {} WITH (FORCE)",
                    self.name
                ));
                diesel::RunQueryDsl::execute(query, &mut server)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = dropped {
            eprintln!("Failed to drop test database {}: {e}", self.name);
        }
    }
}

pub async fn user(username: &str, db: &mut Connection) -> User {
    User::create(username, "not a hash", db)
        .await
        .expect("create user")
}

/// Create a category, returning its id.
pub async fn category(
    slug: &str,
    is_published: bool,
    db: &mut Connection,
) -> i32 {
    diesel::insert_into(c::categories)
        .values((
            c::title.eq(slug),
            c::description.eq(""),
            c::slug.eq(slug),
            c::is_published.eq(is_published),
        ))
        .returning(c::id)
        .get_result(db)
        .await
        .expect("create category")
}

pub async fn post(
    title: &str,
    author_id: i32,
    category_id: Option<i32>,
    pub_date: DateTime,
    is_published: bool,
    db: &mut Connection,
) -> Post {
    let data = PostData {
        title,
        text: "Some text.",
        pub_date,
        author_id,
        location_id: None,
        category_id,
        image: None,
        is_published,
    };
    Post::create(&data, db).await.expect("create post")
}
