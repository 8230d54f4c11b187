use super::{DateTime, Result, Slug};
use crate::dbopt::Connection;
use crate::route::Route;
use crate::schema::categories::{self, dsl as c};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub slug: Slug,
    pub is_published: bool,
    pub created_at: DateTime,
}

impl Category {
    /// Find a category to list posts in.
    ///
    /// Hidden categories are not found.
    pub async fn published_by_slug(
        slug: &Slug,
        db: &mut Connection,
    ) -> Result<Option<Category>> {
        c::categories
            .select(Category::as_select())
            .filter(c::slug.eq(slug.as_ref()))
            .filter(c::is_published.eq(true))
            .first(db)
            .await
            .optional()
    }

    /// All categories, for choosing one when writing a post.
    pub async fn all(db: &mut Connection) -> Result<Vec<Category>> {
        c::categories
            .select(Category::as_select())
            .order(c::title)
            .load(db)
            .await
    }

    pub fn url(&self) -> String {
        Route::Category {
            slug: self.slug.to_string(),
        }
        .url()
    }
}
