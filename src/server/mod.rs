mod assets;
mod auth;
mod category;
mod comment;
mod csrf;
mod error;
mod forms;
mod posts;
mod profile;
mod session;

use self::error::{ViewError, ViewResult};
use self::session::Sessions;
use crate::access::Identity;
use crate::dbopt::{Connection, DbOpt, Pool};
use crate::models::User;
use clap::Parser;
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::http::header::{CONTENT_SECURITY_POLICY, SERVER, SET_COOKIE};
use warp::http::response::Builder;
use warp::reply::Response;
use warp::{self, Filter, Reply};

pub use templates::ToHtml;

type Result<T, E = ViewError> = std::result::Result<T, E>;

/// Largest form body accepted.
const FORM_LIMIT: u64 = 64 * 1024;

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Adress to listen on
    #[clap(long, default_value = "127.0.0.1:8765")]
    bind: SocketAddr,

    /// A 32-byte secret key for csrf generation and verification.
    #[clap(long, env = "CSRF_SECRET", hide_env_values = true)]
    csrf_secret: csrf::Secret,

    /// A secret of at least 32 bytes for signing login sessions.
    #[clap(long, env = "SESSION_SECRET", hide_env_values = true)]
    session_secret: session::Secret,
}

impl Args {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let app = AppData::new(&self)?;
        info!("Serving on http://{}/", self.bind);
        warp::serve(routes(app)).run(self.bind).await;
        Ok(())
    }
}

/// Every page of the blog, with errors turned into responses.
fn routes(app: App) -> BoxedFilter<(impl Reply,)> {
    use warp::path::{end, path};
    let s = warp::any()
        .map(move || app.clone())
        .and(warp::cookie::optional(session::COOKIE))
        .and(warp::cookie::optional(csrf::COOKIE))
        .map(
            |app: App, session: Option<String>, csrf_cookie: Option<String>| {
                Req {
                    app,
                    session,
                    csrf_cookie,
                }
            },
        )
        .boxed();
    let s = move || s.clone();

    warp::any()
        .and(path("s").and(assets::routes()))
        .or(path("posts").and(posts::routes(s()).or(comment::routes(s()))))
        .or(path("category").and(category::routes(s())))
        .or(path("profile").and(profile::routes(s())))
        .or(path("auth").and(auth::routes(s())))
        .or(path("robots.txt")
            .and(end())
            .and(goh())
            .map(robots_txt)
            .map(wrap))
        .or(end()
            .and(goh())
            .and(warp::query())
            .and(s())
            .then(posts::index)
            .map(wrap)
            .boxed())
        .recover(error::for_rejection)
        .boxed()
}

pub struct AppData {
    pool: Pool,
    csrf: csrf::Server,
    sessions: Sessions,
}
type App = Arc<AppData>;

impl std::fmt::Debug for AppData {
    fn fmt(&self, out: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = self.pool.status();
        write!(out, "App(pool {}/{}({}))", s.available, s.size, s.max_size)
    }
}

impl AppData {
    fn new(args: &Args) -> Result<App, anyhow::Error> {
        Ok(Arc::new(AppData {
            pool: args.db.build_pool()?,
            csrf: csrf::Server::from_key(&args.csrf_secret),
            sessions: Sessions::new(&args.session_secret),
        }))
    }
    async fn db(&self) -> Result<Connection, PoolError> {
        self.pool.get().await
    }
}

#[cfg(test)]
impl AppData {
    /// An app on a test database, with fixed secrets.
    fn for_test(pool: Pool) -> App {
        let secret = "0123456789abcdef0123456789abcdef";
        Arc::new(AppData {
            pool,
            csrf: csrf::Server::from_key(&secret.parse().unwrap()),
            sessions: Sessions::new(&secret.parse().unwrap()),
        })
    }

    /// The cookie header and form token of a logged in browser.
    fn browser(&self, user_id: i32) -> (String, String) {
        let session = self.sessions.issue(user_id).unwrap();
        let pair = self.csrf.generate_pair(None).unwrap();
        let cookie = format!(
            "{}={session}; {}={}",
            session::COOKIE,
            csrf::COOKIE,
            pair.cookie
        );
        (cookie, pair.token)
    }
}

/// What every handler gets: the app and the cookies it cares about.
#[derive(Clone)]
pub struct Req {
    app: App,
    session: Option<String>,
    csrf_cookie: Option<String>,
}

impl std::fmt::Debug for Req {
    fn fmt(&self, out: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(out, "Req(session: {})", self.session.is_some())
    }
}

impl Req {
    async fn db(&self) -> Result<Connection> {
        Ok(self.app.db().await?)
    }

    /// Who is making this request.
    ///
    /// A session for a user that no longer exists is anonymous.
    async fn identity(&self, db: &mut Connection) -> Result<Identity> {
        let Some(id) = self
            .session
            .as_deref()
            .and_then(|token| self.app.sessions.user_id(token))
        else {
            return Ok(Identity::Anonymous);
        };
        Ok(User::by_id(id, db)
            .await?
            .map_or(Identity::Anonymous, Identity::User))
    }

    /// Check the csrf token posted in a form.
    fn verify_csrf(&self, token: &str) -> Result<()> {
        self.app.csrf.verify(token, self.csrf_cookie.as_deref())
    }

    /// Context for rendering a page to `me`.
    fn ctx(&self, me: Identity) -> Result<Ctx> {
        let csrf = &self.app.csrf;
        let pair = csrf.generate_pair(self.csrf_cookie.as_deref())?;
        let cookie = pair.set_cookie();
        Ok(Ctx {
            me,
            csrf: pair.token,
            cookie,
        })
    }
}

/// Data every page needs.
pub struct Ctx {
    pub me: Identity,
    /// Csrf token for any form on the page.
    pub csrf: String,
    cookie: String,
}

impl Ctx {
    pub fn me(&self) -> Option<&User> {
        self.me.user()
    }
    /// True if the viewer is the user with this id.
    pub fn is_me(&self, id: i32) -> bool {
        self.me.is_user(id)
    }
    /// A response builder setting the csrf cookie for the page.
    fn response(&self) -> Builder {
        response().header(SET_COOKIE, self.cookie.as_str())
    }
}

/// Render a full page with the csrf cookie set.
fn render<F>(ctx: &Ctx, f: F) -> Result<Response>
where
    F: FnOnce(&mut Vec<u8>) -> std::io::Result<()>,
{
    use templates::RenderRucte;
    ctx.response().html(f).or_ise()
}

fn wrap(result: Result<impl Reply>) -> Response {
    match result {
        Ok(reply) => reply.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Get or head - a filter matching GET and HEAD requests only.
fn goh() -> BoxedFilter<()> {
    use warp::{get, head};
    get().or(head()).unify().boxed()
}

/// A filter for a posted urlencoded form.
fn form<T>() -> BoxedFilter<(T,)>
where
    T: for<'de> Deserialize<'de> + Send + 'static,
{
    warp::post()
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .boxed()
}

fn response() -> Builder {
    Builder::new()
        .header(
            SERVER,
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
        )
        .header(CONTENT_SECURITY_POLICY, "frame-ancestors 'none';")
}

fn found(url: &str) -> impl Reply {
    use warp::http::header;
    use warp::http::StatusCode;
    warp::reply::with_header(StatusCode::FOUND, header::LOCATION, url)
}

/// Redirect to `url` and set a cookie.
fn found_with_cookie(url: &str, cookie: String) -> impl Reply {
    warp::reply::with_header(found(url), SET_COOKIE, cookie)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

fn robots_txt() -> Result<Response> {
    use warp::http::header::CONTENT_TYPE;
    response()
        .header(CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
        .body(
            "User-agent: *\n\
             Disallow: /auth/\n\
             Disallow: /posts/create\n"
                .into(),
        )
        .or_ise()
}

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

#[cfg(test)]
mod test {
    use super::{found_with_cookie, robots_txt};
    use warp::http::header::{LOCATION, SET_COOKIE};
    use warp::http::StatusCode;
    use warp::Reply;

    #[test]
    fn redirect_sets_cookie() {
        let response =
            found_with_cookie("/profile/leo", "session=x".into()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/profile/leo");
        assert_eq!(response.headers()[SET_COOKIE], "session=x");
    }

    #[test]
    fn robots() {
        let response = robots_txt().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
