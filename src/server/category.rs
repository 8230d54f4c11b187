use super::{goh, render, templates, wrap, PageQuery, Req, Result, ViewError};
use crate::models::{Category, Listing, Page, Slug, Teaser};
use chrono::Utc;
use tracing::instrument;
use warp::filters::BoxedFilter;
use warp::path::{end, param};
use warp::reply::Response;
use warp::{Filter, Reply};

pub fn routes(s: BoxedFilter<(Req,)>) -> BoxedFilter<(impl Reply,)> {
    param()
        .and(end())
        .and(goh())
        .and(warp::query())
        .and(s)
        .then(category_page)
        .map(wrap)
        .boxed()
}

/// Public posts in a category, if the category itself is published.
#[instrument]
async fn category_page(
    slug: Slug,
    query: PageQuery,
    req: Req,
) -> Result<Response> {
    let mut db = req.db().await?;
    let me = req.identity(&mut db).await?;
    let category = Category::published_by_slug(&slug, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    let page = Page::from_query(query.page.as_deref());
    let listing = Listing::Category(category.id);
    let posts = Teaser::page(listing, page, Utc::now(), &mut db).await?;
    let ctx = req.ctx(me)?;
    render(&ctx, |o| templates::category_html(o, &ctx, &category, &posts))
}
