use super::{Category, DateTime, Location, Post, Result, User};
use crate::dbopt::Connection;
use crate::schema::{categories, locations, posts, users};
use crate::visibility::{self, Visible};
use diesel::dsl::{InnerJoin, LeftJoin};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// A post together with its author, category and location.
#[derive(Debug)]
pub struct FullPost {
    post: Post,
    pub author: User,
    pub category: Option<Category>,
    pub location: Option<Location>,
}

pub(super) type Row = (Post, User, Option<Category>, Option<Location>);

pub(super) type Joined = LeftJoin<
    LeftJoin<InnerJoin<posts::table, users::table>, categories::table>,
    locations::table,
>;

/// Posts joined with everything needed to show them.
///
/// Category and location are left joins, as both are optional.
pub(super) fn joined() -> Joined {
    posts::table
        .inner_join(users::table)
        .left_join(categories::table)
        .left_join(locations::table)
}

impl From<Row> for FullPost {
    fn from((post, author, category, location): Row) -> Self {
        FullPost {
            post,
            author,
            category,
            location,
        }
    }
}

impl std::ops::Deref for FullPost {
    type Target = Post;
    fn deref(&self) -> &Post {
        &self.post
    }
}

impl FullPost {
    /// Load a post by id, without any visibility filtering.
    pub async fn load(id: i32, db: &mut Connection) -> Result<Option<FullPost>> {
        joined()
            .select((
                Post::as_select(),
                User::as_select(),
                Option::<Category>::as_select(),
                Option::<Location>::as_select(),
            ))
            .filter(posts::id.eq(id))
            .first::<Row>(db)
            .await
            .optional()
            .map(|row| row.map(FullPost::from))
    }

    /// The location to show, if any.
    ///
    /// A location hidden by the administrators is not shown.
    pub fn shown_location(&self) -> Option<&str> {
        self.location
            .as_ref()
            .filter(|l| l.is_published)
            .map(|l| l.name.as_str())
    }

    /// The category to show, if any.
    pub fn shown_category(&self) -> Option<&Category> {
        self.category.as_ref().filter(|c| c.is_published)
    }

    /// True if this post is not on public display right now.
    ///
    /// Only the author ever gets to see such a post.
    pub fn is_hidden(&self) -> bool {
        !self.is_public(chrono::Utc::now())
    }
}

impl Visible for FullPost {
    fn author_id(&self) -> i32 {
        self.post.author_id
    }
    fn is_public(&self, now: DateTime) -> bool {
        visibility::is_public(
            &self.post,
            self.category.as_ref().map(|c| c.is_published),
            now,
        )
    }
}

#[cfg(test)]
impl FullPost {
    pub(crate) fn new(
        post: Post,
        author: User,
        category: Option<Category>,
        location: Option<Location>,
    ) -> Self {
        FullPost::from((post, author, category, location))
    }
}
