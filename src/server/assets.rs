use super::templates::statics::StaticFile;
use super::{goh, response, wrap, Result, ViewError, ViewResult};
use chrono::{Duration, Utc};
use tracing::instrument;
use warp::filters::BoxedFilter;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES};
use warp::path::{tail, Tail};
use warp::reply::Response;
use warp::{self, Filter, Reply};

/// Stylesheets and such, compiled into the server.
///
/// The file names contain a content hash, so they can be cached forever.
pub fn routes() -> BoxedFilter<(impl Reply,)> {
    tail().and(goh()).map(static_file).map(wrap).boxed()
}

/// Create a response from the file data with a correct content type
/// and a far expires header (or a 404 if the file does not exist).
#[instrument]
fn static_file(name: Tail) -> Result<Response> {
    let data = StaticFile::get(name.as_str()).ok_or(ViewError::NotFound)?;
    let far_expires = Utc::now() + Duration::days(180);
    response()
        .header(CONTENT_TYPE, data.mime.as_ref())
        .header(EXPIRES, far_expires.to_rfc2822())
        .header(CACHE_CONTROL, "public, max-age=15552000, immutable")
        .body(data.content.into())
        .or_ise()
}

#[cfg(test)]
mod test {
    use super::super::templates::statics::style_css;
    use super::routes;
    use warp::http::StatusCode;

    #[tokio::test]
    async fn serves_stylesheet() {
        let response = warp::test::request()
            .path(&format!("/{}", style_css.name))
            .reply(&routes())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str();
        assert!(content_type.unwrap().starts_with("text/css"));
    }

    #[tokio::test]
    async fn unknown_file() {
        let response = warp::test::request()
            .path("/nosuch.css")
            .reply(&routes())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
