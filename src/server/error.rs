use super::templates::{self, RenderRucte};
use crate::access::LoginRequired;
use crate::route::Route;
use diesel_async::pooled_connection::deadpool::PoolError;
use warp::http::response::Builder;
use warp::http::status::StatusCode;
use warp::reply::Response;
use warp::{self, Rejection, Reply};

#[derive(Debug)]
pub enum ViewError {
    /// 404
    NotFound,
    /// 400
    BadRequest(String),
    /// Redirect to the login page, continuing to the route afterwards.
    LoginRequired(Route),
    /// 503
    ServiceUnavailable,
    /// 500
    Err(String),
}

pub trait ViewResult<T> {
    fn or_ise(self) -> Result<T, ViewError>;
}

impl<T, E> ViewResult<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn or_ise(self) -> Result<T, ViewError> {
        self.map_err(|e| {
            tracing::error!("Internal server error: {e}");
            ViewError::Err(e.to_string())
        })
    }
}

impl Reply for ViewError {
    fn into_response(self) -> Response {
        match self {
            ViewError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "Not found")
            }
            ViewError::BadRequest(msg) => {
                error_response(StatusCode::BAD_REQUEST, &msg)
            }
            ViewError::LoginRequired(wanted) => {
                super::found(&LoginRequired(wanted).login_route().url())
                    .into_response()
            }
            ViewError::ServiceUnavailable => error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "The server is exhausted and can't handle your request \
                 right now. Sorry. \
                 Please try again later.",
            ),
            ViewError::Err(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
            ),
        }
    }
}

fn error_response(code: StatusCode, message: &str) -> Response {
    Builder::new()
        .status(code)
        .html(|o| templates::error_html(o, code, message))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to render error page: {e}");
            let mut response = Response::new(message.to_string().into());
            *response.status_mut() = code;
            response
        })
}

impl From<LoginRequired> for ViewError {
    fn from(e: LoginRequired) -> Self {
        ViewError::LoginRequired(e.0)
    }
}

impl From<anyhow::Error> for ViewError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal server error: {e:#}");
        ViewError::Err(e.to_string())
    }
}

impl From<diesel::result::Error> for ViewError {
    fn from(e: diesel::result::Error) -> Self {
        tracing::error!("Database error: {e}\n    {e:?}");
        ViewError::Err("Database error".to_string())
    }
}

impl From<PoolError> for ViewError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Timeout(kind) => {
                tracing::warn!("Pool timeout: {kind:?}");
                ViewError::ServiceUnavailable
            }
            e => {
                tracing::error!("Pool error: {e}");
                ViewError::Err(e.to_string())
            }
        }
    }
}

/// Create custom errors for warp rejections.
///
/// Only 404 and bad form bodies get a custom page, other built-in
/// rejections are left to warp.
pub async fn for_rejection(err: Rejection) -> Result<Response, Rejection> {
    if err.is_not_found() {
        Ok(ViewError::NotFound.into_response())
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        tracing::info!("Bad form: {e}");
        Ok(ViewError::BadRequest("Bad form data".into()).into_response())
    } else {
        Err(err)
    }
}
