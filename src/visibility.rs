//! Which posts are on public display.
//!
//! A post is public when it is published, its category is published,
//! and its publication date has passed.  A post without a category is
//! never public.  The author of a post can always see it.
use crate::access::Identity;
use crate::models::{DateTime, Post};
use crate::schema::{categories, posts};
use diesel::dsl;
use diesel::prelude::*;

/// The public post condition as a sql expression.
///
/// Usable as a filter on any query where `posts` is joined with
/// `categories`.  With a left join, posts without a category are
/// filtered out as the category condition is null for them.
#[dsl::auto_type]
pub fn public_at(now: DateTime) -> _ {
    posts::is_published
        .eq(true)
        .and(categories::is_published.eq(true))
        .and(posts::pub_date.le(now))
}

/// The public post condition for an already loaded post.
///
/// `category_published` is `None` when the post has no category.
pub fn is_public(
    post: &Post,
    category_published: Option<bool>,
    now: DateTime,
) -> bool {
    post.is_published && category_published == Some(true) && post.pub_date <= now
}

/// Something with an author that may or may not be public.
pub trait Visible {
    fn author_id(&self) -> i32;
    fn is_public(&self, now: DateTime) -> bool;
}

/// Decide if a post loaded for its detail page may be shown.
///
/// The post is loaded unfiltered.  The author gets it as is, so
/// unpublished and scheduled posts can be previewed.  Anyone else gets
/// it only if it is public, otherwise it is as good as missing.
pub fn resolve_detail<P: Visible>(
    post: Option<P>,
    viewer: &Identity,
    now: DateTime,
) -> Option<P> {
    let post = post?;
    if viewer.is_user(post.author_id()) || post.is_public(now) {
        Some(post)
    } else {
        None
    }
}
