//! User profiles: a user's posts, and editing one's own details.
use super::forms::{Errors, UserForm};
use super::{
    form, found, goh, render, templates, wrap, Ctx, PageQuery, Req, Result,
    ViewError,
};
use crate::access::{may_edit_profile, Decision};
use crate::models::{Listing, Page, Teaser, User};
use crate::route::Route;
use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DbError};
use tracing::{info, instrument};
use warp::filters::BoxedFilter;
use warp::path::{end, param, path};
use warp::reply::Response;
use warp::{Filter, Reply};

pub fn routes(s: BoxedFilter<(Req,)>) -> BoxedFilter<(impl Reply,)> {
    let list = param()
        .and(end())
        .and(goh())
        .and(warp::query())
        .and(s.clone())
        .then(profile_page);
    let edit = param().and(path("edit")).and(end());
    let edit = edit
        .clone()
        .and(goh())
        .and(s.clone())
        .then(edit_form)
        .or(edit.and(form()).and(s).then(edit_profile))
        .unify();
    list.or(edit).unify().map(wrap).boxed()
}

/// A user's posts.
///
/// The owner sees all their posts, others only the public ones.
#[instrument]
async fn profile_page(
    username: String,
    query: PageQuery,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let profile = User::by_username(&username, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    let page = Page::from_query(query.page.as_deref());
    let listing = Listing::Author {
        id: profile.id,
        include_hidden: me.is_user(profile.id),
    };
    let posts = Teaser::page(listing, page, Utc::now(), &mut db).await?;
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::profile_html(o, &ctx, &profile, &posts))
}

#[instrument]
async fn edit_form(username: String, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    me.require_user(Route::ProfileEdit {
        username: username.clone(),
    })?;
    let profile = User::by_username(&username, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    let profile = match may_edit_profile(&me, profile) {
        Decision::Allow(profile) => profile,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    let ctx = req.ctx(me)?;
    edit_page(&ctx, &profile, &UserForm::from_user(&profile), &Errors::new())
}

#[instrument(skip(form))]
async fn edit_profile(
    username: String,
    form: UserForm,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    me.require_user(Route::ProfileEdit {
        username: username.clone(),
    })?;
    let profile = User::by_username(&username, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    let profile = match may_edit_profile(&me, profile) {
        Decision::Allow(profile) => profile,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    req.verify_csrf(&form.csrftoken)?;
    let errors = match form.validate() {
        Ok(()) => {
            let saved = User::update_profile(
                profile.id,
                form.username.trim(),
                form.first_name.trim(),
                form.last_name.trim(),
                form.email.trim(),
                &mut db,
            )
            .await;
            match saved {
                Ok(user) => {
                    info!("Profile of {} updated", user.username);
                    return Ok(found(&user.url()).into_response());
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
    let ctx = req.ctx(me)?;
    edit_page(&ctx, &profile, &form, &errors)
}

fn edit_page(
    ctx: &Ctx,
    profile: &User,
    form: &UserForm,
    errors: &Errors,
) -> Result<Response> {
    render(ctx, |o| templates::user_form_html(o, ctx, profile, form, errors))
}
