//! A blog where users publish posts, comment on each other's posts,
//! and manage their own content.
#![forbid(unsafe_code)]
#[macro_use]
extern crate diesel;

mod access;
mod admin;
mod dbopt;
mod listposts;
mod models;
mod password;
mod route;
mod schema;
mod server;
#[cfg(test)]
mod testdb;
mod visibility;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;

/// Main program: Set up env and run according to arguments.
fn main() -> Result<()> {
    match dotenv() {
        Ok(_) => (),
        Err(ref err) if err.not_found() => (),
        Err(e) => return Err(e).context("Failed to read .env"),
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").as_deref().unwrap_or("info"),
        )
        .init();

    Blogicum::parse().run()
}

/// Run and manage the blog
#[derive(Parser)]
#[clap(about, author, version)]
enum Blogicum {
    /// List all posts and whether they are public
    ListPosts(listposts::Args),
    /// Manage post categories
    #[clap(subcommand)]
    Category(admin::CategoryCmd),
    /// Manage post locations
    #[clap(subcommand)]
    Location(admin::LocationCmd),
    /// Run the web server
    RunServer(server::Args),
}

impl Blogicum {
    fn run(self) -> Result<()> {
        match self {
            Blogicum::ListPosts(args) => args.run(),
            Blogicum::Category(cmd) => cmd.run(),
            Blogicum::Location(cmd) => cmd.run(),
            Blogicum::RunServer(args) => run_async(args.run()),
        }
    }
}

fn run_async<F>(work: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(10)
        .build()?
        .block_on(work)
}
