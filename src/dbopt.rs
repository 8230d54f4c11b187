//! Database options, shared by all subcommands.
use anyhow::{Context, Result};
use clap::Parser;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::Connection as _;
use diesel_async::pooled_connection::deadpool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// An asynchronous postgres database connection pool.
pub type Pool = deadpool::Pool<AsyncPgConnection>;
pub type Connection = deadpool::Object<AsyncPgConnection>;

const SLOW_CONNECT: Duration = Duration::from_millis(50);

#[derive(Parser)]
pub struct DbOpt {
    /// How to connect to the postgres database.
    #[clap(long, env = "DATABASE_URL", hide_env_values = true)]
    db_url: String,

    /// Max number of connections in the server pool.
    #[clap(long, env = "DB_POOL_SIZE", default_value_t = 20)]
    db_pool_size: usize,
}

impl DbOpt {
    /// A synchronous connection, for the admin commands.
    #[tracing::instrument(skip(self))]
    pub fn get_db(&self) -> Result<PgConnection> {
        let start = Instant::now();
        let db = PgConnection::establish(&self.db_url)
            .context("Failed to connect to the database")?;
        match start.elapsed() {
            time if time > SLOW_CONNECT => {
                warn!("Got a db connection in {time:.1?}.  Why so slow?")
            }
            time => debug!("Got a connection in {time:.1?}."),
        }
        Ok(db)
    }

    /// The async connection pool for the web server.
    ///
    /// Connections are opened lazily, on first use.
    pub fn build_pool(&self) -> Result<Pool> {
        let manager = AsyncDieselConnectionManager::new(&self.db_url);
        let pool = Pool::builder(manager)
            .max_size(self.db_pool_size)
            .build()
            .context("Failed to create the database pool")?;
        info!("Database pool of up to {} connections", self.db_pool_size);
        Ok(pool)
    }
}
