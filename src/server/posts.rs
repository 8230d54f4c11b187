//! Listing, showing, writing and removing posts.
use super::forms::{ConfirmForm, Errors, PostForm, ValidPost};
use super::{
    form, found, goh, render, templates, wrap, Ctx, PageQuery, Req, Result,
    ViewError,
};
use crate::access::{may_change_post, Decision, Identity};
use crate::dbopt::Connection;
use crate::models::{
    Category, CommentByUser, FullPost, Listing, Location, Page, Post,
    PostData, Teaser, User,
};
use crate::route::Route;
use crate::visibility::resolve_detail;
use chrono::Utc;
use tracing::{info, instrument};
use warp::filters::BoxedFilter;
use warp::path::{end, param, path};
use warp::reply::Response;
use warp::{Filter, Reply};

pub fn routes(s: BoxedFilter<(Req,)>) -> BoxedFilter<(impl Reply,)> {
    let create = path("create").and(end());
    let create = create
        .clone()
        .and(goh())
        .and(s.clone())
        .then(create_form)
        .or(create.and(form()).and(s.clone()).then(create_post))
        .unify();
    let detail = param().and(end()).and(goh()).and(s.clone()).then(detail);
    let edit = param().and(path("edit")).and(end());
    let edit = edit
        .clone()
        .and(goh())
        .and(s.clone())
        .then(edit_form)
        .or(edit.and(form()).and(s.clone()).then(edit_post))
        .unify();
    let delete = param().and(path("delete")).and(end());
    let delete = delete
        .clone()
        .and(goh())
        .and(s.clone())
        .then(delete_form)
        .or(delete.and(form()).and(s).then(delete_post))
        .unify();
    create
        .or(detail)
        .unify()
        .or(edit)
        .unify()
        .or(delete)
        .unify()
        .map(wrap)
        .boxed()
}

/// The front page: all public posts.
#[instrument]
pub(super) async fn index(query: PageQuery, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let page = Page::from_query(query.page.as_deref());
    let posts =
        Teaser::page(Listing::Public, page, Utc::now(), &mut db).await?;
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::index_html(o, &ctx, &posts))
}

#[instrument]
async fn detail(id: i32, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let post = FullPost::load(id, &mut db).await?;
    let post =
        resolve_detail(post, &me, Utc::now()).ok_or(ViewError::NotFound)?;
    let comments = CommentByUser::for_post(post.id, &mut db).await?;
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::detail_html(o, &ctx, &post, &comments))
}

/// The choices for a post form.
struct Choices {
    categories: Vec<Category>,
    locations: Vec<Location>,
}

impl Choices {
    async fn load(db: &mut Connection) -> Result<Choices> {
        Ok(Choices {
            categories: Category::all(db).await?,
            locations: Location::all(db).await?,
        })
    }

    fn page(
        &self,
        ctx: &Ctx,
        action: &str,
        form: &PostForm,
        errors: &Errors,
    ) -> Result<Response> {
        render(ctx, |o| {
            templates::post_form_html(
                o,
                ctx,
                action,
                form,
                errors,
                &self.categories,
                &self.locations,
            )
        })
    }
}

fn post_data<'a>(valid: &ValidPost<'a>, author_id: i32) -> PostData<'a> {
    PostData {
        title: valid.title,
        text: valid.text,
        pub_date: valid.pub_date,
        author_id,
        location_id: valid.location_id,
        category_id: Some(valid.category_id),
        image: valid.image,
        is_published: valid.is_published,
    }
}

#[instrument]
async fn create_form(req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    me.require_user(Route::PostCreate)?;
    let choices = Choices::load(&mut db).await?;
    let ctx = req.ctx(me)?;
    let form = PostForm::new_post(Utc::now());
    choices.page(&ctx, &Route::PostCreate.url(), &form, &Errors::new())
}

#[instrument(skip(form))]
async fn create_post(form: PostForm, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let user = me.require_user(Route::PostCreate)?;
    req.verify_csrf(&form.csrftoken)?;
    let choices = Choices::load(&mut db).await?;
    match form.validate(&choices.categories, &choices.locations) {
        Ok(valid) => {
            let data = post_data(&valid, user.id);
            let post = Post::create(&data, &mut db).await?;
            info!("{} created post #{}", user.username, post.id);
            Ok(found(&user.url()).into_response())
        }
        Err(errors) => {
            let ctx = req.ctx(me)?;
            choices.page(&ctx, &Route::PostCreate.url(), &form, &errors)
        }
    }
}

/// Load a post for changing it, if `me` may.
///
/// Anonymous visitors are sent to log in, other users to the post.
async fn post_to_change(
    post_id: i32,
    wanted: Route,
    req: &Req,
    db: &mut Connection,
) -> Result<(User, Decision<Post>)> {
    let me = req.identity(db).await?;
    let user = me.require_user(wanted)?.clone();
    let post = Post::by_id(post_id, db).await?.ok_or(ViewError::NotFound)?;
    Ok((user, may_change_post(&me, post)))
}

#[instrument]
async fn edit_form(post_id: i32, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let (user, decision) =
        post_to_change(post_id, Route::PostEdit { post_id }, &req, &mut db)
            .await?;
    let post = match decision {
        Decision::Allow(post) => post,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    let choices = Choices::load(&mut db).await?;
    let ctx = req.ctx(Identity::User(user))?;
    let form = PostForm::from_post(&post);
    choices.page(&ctx, &post.edit_url(), &form, &Errors::new())
}

#[instrument(skip(form))]
async fn edit_post(
    post_id: i32,
    form: PostForm,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let (user, decision) =
        post_to_change(post_id, Route::PostEdit { post_id }, &req, &mut db)
            .await?;
    let post = match decision {
        Decision::Allow(post) => post,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    req.verify_csrf(&form.csrftoken)?;
    let choices = Choices::load(&mut db).await?;
    match form.validate(&choices.categories, &choices.locations) {
        Ok(valid) => {
            let data = post_data(&valid, post.author_id);
            let post = Post::update(post.id, &data, &mut db).await?;
            info!("{} updated post #{}", user.username, post.id);
            Ok(found(&post.url()).into_response())
        }
        Err(errors) => {
            let ctx = req.ctx(Identity::User(user))?;
            choices.page(&ctx, &post.edit_url(), &form, &errors)
        }
    }
}

#[instrument]
async fn delete_form(post_id: i32, req: Req) -> Result<Response> {
    let mut db = req.db().await?;
    let (user, decision) =
        post_to_change(post_id, Route::PostDelete { post_id }, &req, &mut db)
            .await?;
    if let Decision::Deny(to) = decision {
        return Ok(found(&to.url()).into_response());
    }
    let post = FullPost::load(post_id, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    let ctx = req.ctx(Identity::User(user))?;
    render(&ctx, |o| templates::post_delete_html(o, &ctx, &post))
}

#[instrument(skip(form))]
async fn delete_post(
    post_id: i32,
    form: ConfirmForm,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let (user, decision) =
        post_to_change(post_id, Route::PostDelete { post_id }, &req, &mut db)
            .await?;
    let post = match decision {
        Decision::Allow(post) => post,
        Decision::Deny(to) => return Ok(found(&to.url()).into_response()),
    };
    req.verify_csrf(&form.csrftoken)?;
    Post::delete(post.id, &mut db).await?;
    info!("{} deleted post #{}", user.username, post.id);
    Ok(found(&user.url()).into_response())
}
