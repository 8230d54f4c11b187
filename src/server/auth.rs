//! Logging in and out, and creating accounts.
use super::forms::{ConfirmForm, Errors, LoginForm, RegistrationForm};
use super::{
    form, found, found_with_cookie, goh, render, session, templates, wrap,
    Req, Result, ViewResult,
};
use crate::models::User;
use crate::password;
use crate::route::{local_path, Route};
use diesel::result::{DatabaseErrorKind, Error as DbError};
use serde::Deserialize;
use tracing::{info, instrument};
use warp::filters::BoxedFilter;
use warp::path::{end, path};
use warp::reply::Response;
use warp::{Filter, Reply};

pub fn routes(s: BoxedFilter<(Req,)>) -> BoxedFilter<(impl Reply,)> {
    let login = path("login").and(end());
    let login = login
        .clone()
        .and(goh())
        .and(warp::query())
        .and(s.clone())
        .then(login_form)
        .or(login.and(form()).and(s.clone()).then(log_in))
        .unify();
    let logout = path("logout")
        .and(end())
        .and(form())
        .and(s.clone())
        .then(log_out);
    let registration = path("registration").and(end());
    let registration = registration
        .clone()
        .and(goh())
        .and(s.clone())
        .then(registration_form)
        .or(registration.and(form()).and(s).then(register))
        .unify();
    login
        .or(logout)
        .unify()
        .or(registration)
        .unify()
        .map(wrap)
        .boxed()
}

#[derive(Debug, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

#[instrument]
async fn login_form(query: NextQuery, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let form = LoginForm {
        next: query.next.unwrap_or_default(),
        ..Default::default()
    };
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::login_html(o, &ctx, &form, &Errors::new()))
}

#[instrument(skip(form))]
async fn log_in(form: LoginForm, req: Req) -> Result<Response> {
    req.verify_csrf(&form.csrftoken)?;
    let mut db = req.db().await?;
    let user = User::with_password_hash(form.username.trim(), &mut db)
        .await?
        .filter(|(_, hash)| password::verify(&form.password, hash))
        .map(|(user, _)| user);
    let Some(user) = user else {
        info!("Failed login for {:?}", form.username);
        let me = req.identity(&mut db).await?;
        let ctx = req.ctx(me)?;
        let errors = vec![
            "Please enter a correct username and password.".to_string(),
        ];
        return render(&ctx, |o| {
            templates::login_html(o, &ctx, &form, &errors)
        });
    };
    let token = req.app.sessions.issue(user.id).or_ise()?;
    info!("{} logged in", user.username);
    let to = local_path(&form.next)
        .map(String::from)
        .unwrap_or_else(|| user.url());
    Ok(found_with_cookie(&to, session::set_cookie(&token)).into_response())
}

#[instrument(skip(form))]
async fn log_out(form: ConfirmForm, req: Req) -> Result<Response> {
    req.verify_csrf(&form.csrftoken)?;
    Ok(found_with_cookie(&Route::Index.url(), session::clear_cookie())
        .into_response())
}

#[instrument]
async fn registration_form(req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let ctx = req.ctx(me)?;
    let form = RegistrationForm::default();
    render(&ctx, |o| {
        templates::registration_html(o, &ctx, &form, &Errors::new())
    })
}

#[instrument(skip(form))]
async fn register(form: RegistrationForm, req: Req) -> Result<Response> {
    req.verify_csrf(&form.csrftoken)?;
    let mut db = req.db().await?;
    let errors = match form.validate() {
        Ok(()) => {
            let hash = password::hash(&form.password1).or_ise()?;
            match User::create(form.username.trim(), &hash, &mut db).await {
                Ok(user) => {
                    info!("Registered user {}", user.username);
                    let login = Route::Login { next: None };
                    return Ok(found(&login.url()).into_response());
                }
                Err(DbError::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    _,
                )) => vec!["A user with that username already exists.".into()],
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };
    let me = req.identity(&mut db).await?;
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::registration_html(o, &ctx, &form, &errors))
}
